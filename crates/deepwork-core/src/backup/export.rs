use chrono::NaiveDate;

use super::Backup;
use crate::error::Result;
use crate::events::Event;
use crate::model::HistoryEntry;

/// Serialize the dataset in the current `{history, projects}` format.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn export_backup(backup: &Backup) -> Result<String> {
    Ok(serde_json::to_string_pretty(backup)?)
}

/// Serialize one recorded session as a bare entry, the shape a single-session
/// import accepts.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn export_entry(entry: &HistoryEntry) -> Result<String> {
    Ok(serde_json::to_string_pretty(entry)?)
}

/// Serialize a session's event log.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn export_events(events: &[Event]) -> Result<String> {
    Ok(serde_json::to_string_pretty(events)?)
}

pub fn backup_file_name(day: NaiveDate) -> String {
    format!("deepwork-backup-{}.json", day.format("%Y-%m-%d"))
}

/// `session-<project>-<date>.json`, with path separators in the name replaced.
pub fn session_file_name(entry: &HistoryEntry) -> String {
    let project = entry.project_name.as_deref().unwrap_or(&entry.project_id);
    let project: String = project
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!(
        "session-{}-{}.json",
        project,
        entry.date.date_naive().format("%Y-%m-%d")
    )
}

pub fn event_log_file_name(day: NaiveDate) -> String {
    format!("deepwork-logs-{}.json", day.format("%Y-%m-%d"))
}
