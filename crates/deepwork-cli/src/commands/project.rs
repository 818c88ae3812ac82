//! Project management commands for CLI.

use chrono::Local;
use clap::Subcommand;
use deepwork_core::metrics::project_stats;
use deepwork_core::{Project, ProjectStatus};
use serde::Serialize;

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        /// Project name (defaults to the template's name)
        name: Option<String>,
        /// Start from a configured template
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        emoji: Option<String>,
        /// What the project is about
        #[arg(long)]
        focus: Option<String>,
        /// Planned duration in days
        #[arg(long)]
        days: Option<u32>,
        /// Goal in focus hours
        #[arg(long)]
        hours: Option<f64>,
        /// Make it the current project
        #[arg(long)]
        select: bool,
    },
    /// List all projects
    List,
    /// List configured project templates
    Templates,
    /// Show the current project
    Current,
    /// Show one project with its progress
    Show {
        id: String,
    },
    /// Make a project the current one
    Select {
        id: String,
    },
    /// Set a project's status (in_progress, done, paused)
    Status {
        id: String,
        status: ProjectStatus,
    },
    /// Delete a project without history
    Delete {
        id: String,
    },
}

#[derive(Serialize)]
struct ProjectRow<'a> {
    current: bool,
    #[serde(flatten)]
    project: &'a Project,
}

pub fn run(action: ProjectAction) -> CmdResult {
    let (config, mut store) = open_store()?;

    match action {
        ProjectAction::Create {
            name,
            template,
            emoji,
            focus,
            days,
            hours,
            select,
        } => {
            let template = match template {
                Some(t) => Some(
                    config
                        .project_templates
                        .iter()
                        .find(|tpl| tpl.name.eq_ignore_ascii_case(&t))
                        .ok_or_else(|| format!("unknown template: {t}"))?,
                ),
                None => None,
            };
            let name = name
                .or_else(|| template.map(|t| t.name.clone()))
                .ok_or("a project name or --template is required")?;
            let emoji = emoji
                .or_else(|| template.map(|t| t.emoji.clone()))
                .unwrap_or_else(|| deepwork_core::model::DEFAULT_PROJECT_EMOJI.to_string());

            let mut project = Project::new(name, emoji);
            project.focus = focus.or_else(|| template.and_then(|t| t.focus.clone()));
            project.planned_duration_days = days;
            project.hours_goal = hours;

            store.upsert_project(&project)?;
            if select {
                store.set_current_project(&project.id)?;
            }
            print_json(&project)?;
        }
        ProjectAction::List => {
            let current = store.current_project()?.id;
            let projects = store.list_projects()?;
            let rows: Vec<ProjectRow<'_>> = projects
                .iter()
                .map(|project| ProjectRow {
                    current: project.id == current,
                    project,
                })
                .collect();
            print_json(&rows)?;
        }
        ProjectAction::Templates => {
            print_json(&config.project_templates)?;
        }
        ProjectAction::Current => {
            print_json(&store.current_project()?)?;
        }
        ProjectAction::Show { id } => {
            let project = store.project(&id)?;
            let history = store.list_history()?;
            let stats = project_stats(&project, &history, Local::now().date_naive(), &Local);
            print_json(&stats)?;
        }
        ProjectAction::Select { id } => {
            store.set_current_project(&id)?;
            print_json(&store.current_project()?)?;
        }
        ProjectAction::Status { id, status } => {
            let project = store.update_project_status(&id, status)?;
            print_json(&project)?;
        }
        ProjectAction::Delete { id } => {
            store.delete_project(&id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}
