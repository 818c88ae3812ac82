use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::{HistoryEntry, Project, ProjectStatus};

/// Per-project progress derived from history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub project_id: String,
    pub name: String,
    pub emoji: String,
    pub status: ProjectStatus,
    pub total_deepworks_completed: u32,
    pub sessions: usize,
    pub hours_logged: f64,
    /// `hours_logged / hours_goal`, capped at 1.0. `None` without a goal.
    pub progress: Option<f64>,
    /// Days remaining of the planned duration, never negative.
    pub days_left: Option<i64>,
}

pub fn project_stats<Tz: TimeZone>(
    project: &Project,
    history: &[HistoryEntry],
    today: NaiveDate,
    tz: &Tz,
) -> ProjectStats {
    let entries: Vec<&HistoryEntry> = history
        .iter()
        .filter(|e| e.project_id == project.id)
        .collect();
    let seconds = entries
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.focus_duration_seconds));
    let hours_logged = seconds as f64 / 3600.0;

    let progress = project
        .hours_goal
        .filter(|goal| *goal > 0.0)
        .map(|goal| (hours_logged / goal).min(1.0));

    let days_left = project.planned_duration_days.map(|planned| {
        let started = project.created_at.with_timezone(tz).date_naive();
        let elapsed = today.signed_duration_since(started).num_days().max(0);
        (i64::from(planned) - elapsed).max(0)
    });

    ProjectStats {
        project_id: project.id.clone(),
        name: project.name.clone(),
        emoji: project.emoji.clone(),
        status: project.status,
        total_deepworks_completed: project.total_deepworks_completed,
        sessions: entries.len(),
        hours_logged,
        progress,
        days_left,
    }
}

/// Projects ordered by completed deepworks, most first.
pub fn rank_projects<Tz: TimeZone>(
    projects: &[Project],
    history: &[HistoryEntry],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<ProjectStats> {
    let mut ranked: Vec<ProjectStats> = projects
        .iter()
        .map(|p| project_stats(p, history, today, tz))
        .collect();
    ranked.sort_by(|a, b| b.total_deepworks_completed.cmp(&a.total_deepworks_completed));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn project(id: &str, total: u32, goal: Option<f64>) -> Project {
        let mut p: Project = serde_json::from_value(json!({
            "id": id,
            "name": id,
            "createdAt": "2024-01-01T08:00:00Z",
            "totalDeepworksCompleted": total,
            "plannedDurationDays": 7
        }))
        .unwrap();
        p.hours_goal = goal;
        p
    }

    fn entry(id: &str, project_id: &str, seconds: u64) -> HistoryEntry {
        serde_json::from_value(json!({
            "id": id,
            "projectId": project_id,
            "date": "2024-01-02T10:00:00Z",
            "focusDurationSeconds": seconds
        }))
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn ranks_by_completed_deepworks() {
        let projects = vec![project("a", 1, None), project("b", 5, None), project("c", 3, None)];
        let ranked = rank_projects(&projects, &[], date("2024-01-03"), &Utc);
        let ids: Vec<_> = ranked.iter().map(|s| s.project_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn progress_is_capped() {
        let history = vec![entry("1", "a", 3600), entry("2", "a", 7200), entry("3", "b", 3600)];
        let a = project_stats(&project("a", 2, Some(2.0)), &history, date("2024-01-03"), &Utc);
        assert_eq!(a.sessions, 2);
        assert!((a.hours_logged - 3.0).abs() < f64::EPSILON);
        assert_eq!(a.progress, Some(1.0));

        let b = project_stats(&project("b", 1, Some(4.0)), &history, date("2024-01-03"), &Utc);
        assert_eq!(b.progress, Some(0.25));

        let none = project_stats(&project("c", 0, None), &history, date("2024-01-03"), &Utc);
        assert_eq!(none.progress, None);
        assert_eq!(none.hours_logged, 0.0);
    }

    #[test]
    fn days_left_counts_down_and_stops_at_zero() {
        let p = project("a", 0, None);
        assert_eq!(project_stats(&p, &[], date("2024-01-04"), &Utc).days_left, Some(4));
        assert_eq!(project_stats(&p, &[], date("2024-03-01"), &Utc).days_left, Some(0));
    }
}
