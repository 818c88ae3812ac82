use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Backup;
use crate::error::ImportError;
use crate::model::{HistoryEntry, Project};

/// Shapes a backup file may take.
#[derive(Debug, Clone, PartialEq)]
pub enum BackupPayload {
    /// Current format: `{history: [...], projects: [...]}`.
    Full {
        history: Vec<Value>,
        projects: Vec<Value>,
    },
    /// Legacy: a bare array of history entries.
    Entries(Vec<Value>),
    /// Legacy: one bare history entry.
    Single(Value),
}

impl BackupPayload {
    /// Parse backup text.
    ///
    /// # Errors
    /// Returns [`ImportError::Malformed`] when the text is not JSON.
    pub fn parse(text: &str) -> Result<Self, ImportError> {
        Ok(Self::from_value(serde_json::from_str(text)?))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => BackupPayload::Entries(items),
            Value::Object(mut map) if map.contains_key("history") && map.contains_key("projects") => {
                BackupPayload::Full {
                    history: take_array(map.remove("history")),
                    projects: take_array(map.remove("projects")),
                }
            }
            other => BackupPayload::Single(other),
        }
    }

    /// Decode and filter into `(history, projects)` candidates.
    ///
    /// History records must carry an id, a date and a project id; records that
    /// do not decode are dropped the same way.
    fn into_candidates(self) -> (Vec<HistoryEntry>, Vec<Project>) {
        let (raw_history, raw_projects) = match self {
            BackupPayload::Full { history, projects } => (history, projects),
            BackupPayload::Entries(items) => (items, Vec::new()),
            BackupPayload::Single(item) => (vec![item], Vec::new()),
        };

        let raw_history_len = raw_history.len();
        let history: Vec<HistoryEntry> = raw_history
            .into_iter()
            .filter_map(|v| serde_json::from_value::<HistoryEntry>(v).ok())
            .filter(HistoryEntry::is_importable)
            .collect();

        let raw_projects_len = raw_projects.len();
        let projects: Vec<Project> = raw_projects
            .into_iter()
            .filter_map(|v| serde_json::from_value::<Project>(v).ok())
            .filter(|p| !p.id.trim().is_empty())
            .collect();

        let dropped = (raw_history_len - history.len()) + (raw_projects_len - projects.len());
        if dropped > 0 {
            tracing::warn!(dropped, "skipping invalid records in backup");
        }
        (history, projects)
    }
}

impl From<&Backup> for BackupPayload {
    fn from(backup: &Backup) -> Self {
        BackupPayload::Full {
            history: backup
                .history
                .iter()
                .filter_map(|e| serde_json::to_value(e).ok())
                .collect(),
            projects: backup
                .projects
                .iter()
                .filter_map(|p| serde_json::to_value(p).ok())
                .collect(),
        }
    }
}

fn take_array(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub entries_added: usize,
    pub projects_added: usize,
}

impl MergeSummary {
    pub fn is_noop(&self) -> bool {
        self.entries_added == 0 && self.projects_added == 0
    }
}

/// Merged dataset ready to be written back as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub projects: Vec<Project>,
    pub history: Vec<HistoryEntry>,
    pub summary: MergeSummary,
}

/// Merge a backup into the current dataset.
///
/// Existing entries and projects are never removed or overwritten. New history
/// entries are added by id, project counters only ever grow, and every history
/// entry whose project is unknown gets a reconstructed placeholder project.
/// Applying the same payload twice adds nothing the second time.
///
/// # Errors
/// Returns [`ImportError::NothingToImport`] when the payload holds neither a
/// valid history entry nor a project. Nothing is merged in that case.
pub fn merge(current: &Backup, payload: BackupPayload) -> Result<MergeOutcome, ImportError> {
    let (candidate_history, candidate_projects) = payload.into_candidates();
    if candidate_history.is_empty() && candidate_projects.is_empty() {
        return Err(ImportError::NothingToImport);
    }

    // History: union by id, newest first.
    let mut known_ids: HashSet<&str> = current.history.iter().map(|e| e.id.as_str()).collect();
    let mut added_entries = Vec::new();
    for entry in &candidate_history {
        if known_ids.insert(entry.id.as_str()) {
            added_entries.push(entry.clone());
        }
    }
    let entries_added = added_entries.len();
    let mut history = added_entries;
    history.extend(current.history.iter().cloned());
    history.sort_by(|a, b| b.date.cmp(&a.date));

    // Projects: keyed by id, insertion order kept.
    let mut projects = current.projects.clone();
    let mut index: HashMap<String, usize> = projects
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.clone(), i))
        .collect();
    let mut projects_added = 0;

    for candidate in candidate_projects {
        match index.get(&candidate.id).copied() {
            Some(i) => {
                let existing = &mut projects[i];
                if candidate.total_deepworks_completed > existing.total_deepworks_completed {
                    existing.total_deepworks_completed = candidate.total_deepworks_completed;
                }
            }
            None => {
                index.insert(candidate.id.clone(), projects.len());
                projects.push(candidate);
                projects_added += 1;
            }
        }
    }

    for entry in candidate_history.iter().chain(current.history.iter()) {
        if !index.contains_key(&entry.project_id) {
            tracing::debug!(project_id = %entry.project_id, entry_id = %entry.id, "reconstructing missing project");
            index.insert(entry.project_id.clone(), projects.len());
            projects.push(Project::restored_from(entry));
            projects_added += 1;
        }
    }

    let summary = MergeSummary {
        entries_added,
        projects_added,
    };
    tracing::info!(
        entries_added = summary.entries_added,
        projects_added = summary.projects_added,
        "backup merged"
    );

    Ok(MergeOutcome {
        projects,
        history,
        summary,
    })
}
