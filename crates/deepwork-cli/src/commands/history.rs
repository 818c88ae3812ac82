use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;
use deepwork_core::backup::{backup_file_name, export_backup, export_entry, session_file_name};
use deepwork_core::{merge, BackupPayload};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions, newest first
    List {
        /// Only show sessions for this project
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Merge a backup file into the stored history
    Import {
        file: PathBuf,
    },
    /// Write a full backup of projects and history, or a single session
    Export {
        /// Output file (defaults to deepwork-backup-<date>.json, or
        /// session-<project>-<date>.json with --entry)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Export only the session with this id
        #[arg(long)]
        entry: Option<String>,
    },
}

pub fn run(action: HistoryAction) -> CmdResult {
    let (_, mut store) = open_store()?;

    match action {
        HistoryAction::List { project, limit } => {
            let history: Vec<_> = store
                .list_history()?
                .into_iter()
                .filter(|e| project.as_deref().map_or(true, |id| e.project_id == id))
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            print_json(&history)?;
        }
        HistoryAction::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let payload = BackupPayload::parse(&text)?;
            let snapshot = store.snapshot()?;
            let outcome = merge(&snapshot, payload)?;
            // Counter-only merges add nothing but still change projects.
            if outcome.projects != snapshot.projects || outcome.history != snapshot.history {
                store.apply_merge(&outcome)?;
            }
            print_json(&outcome.summary)?;
        }
        HistoryAction::Export { out, entry: None } => {
            let json = export_backup(&store.snapshot()?)?;
            let path =
                out.unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));
            std::fs::write(&path, json)?;
            println!("{}", path.display());
        }
        HistoryAction::Export {
            out,
            entry: Some(id),
        } => {
            let history = store.list_history()?;
            let entry = history
                .iter()
                .find(|e| e.id == id)
                .ok_or_else(|| format!("no session with id '{id}'"))?;
            let json = export_entry(entry)?;
            let path = out.unwrap_or_else(|| PathBuf::from(session_file_name(entry)));
            std::fs::write(&path, json)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
