//! Backup export and import-merge.
//!
//! A backup is a JSON document `{history: [...], projects: [...]}`. Older
//! exports were either a bare array of history entries or a single entry;
//! [`BackupPayload`] resolves those shapes once so the merge only ever sees
//! one normalized form.

mod export;
mod merge;

pub use export::{
    backup_file_name, event_log_file_name, export_backup, export_entry, export_events,
    session_file_name,
};
pub use merge::{merge, BackupPayload, MergeOutcome, MergeSummary};

use serde::{Deserialize, Serialize};

use crate::model::{HistoryEntry, Project};

/// Immutable view of the whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub history: Vec<HistoryEntry>,
    pub projects: Vec<Project>,
}
