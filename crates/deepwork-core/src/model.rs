//! Persistent data model: projects and history entries.
//!
//! Field names on the wire are camelCase. A handful of aliases keep older
//! backups readable (`totalDeepworks`, `deepworksCompleted`, `duration`, ...);
//! output always uses the canonical names.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const DEFAULT_PROJECT_EMOJI: &str = "📁";
pub const RESTORED_PROJECT_NAME: &str = "Restored project";

/// Self-reported energy level picked at the start of a deepwork day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mood {
    Low,
    #[default]
    Neutral,
    Ready,
    Flow,
    /// Identifier not known to this build, preserved verbatim.
    Other(String),
}

impl Mood {
    pub fn as_str(&self) -> &str {
        match self {
            Mood::Low => "low",
            Mood::Neutral => "neutral",
            Mood::Ready => "ready",
            Mood::Flow => "flow",
            Mood::Other(s) => s,
        }
    }

    pub fn builtin() -> [Mood; 4] {
        [Mood::Low, Mood::Neutral, Mood::Ready, Mood::Flow]
    }
}

impl From<String> for Mood {
    fn from(s: String) -> Self {
        match s.as_str() {
            "low" | "bajo" => Mood::Low,
            "neutral" | "neutro" => Mood::Neutral,
            "ready" => Mood::Ready,
            "flow" => Mood::Flow,
            _ => Mood::Other(s),
        }
    }
}

impl From<&str> for Mood {
    fn from(s: &str) -> Self {
        Mood::from(s.to_string())
    }
}

impl From<Mood> for String {
    fn from(m: Mood) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    InProgress,
    Done,
    Paused,
}

impl std::str::FromStr for ProjectStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ProjectStatus::InProgress),
            "done" => Ok(ProjectStatus::Done),
            "paused" => Ok(ProjectStatus::Paused),
            other => Err(ValidationError::InvalidValue {
                field: "status".into(),
                message: format!("unknown status '{other}'"),
            }),
        }
    }
}

/// A long-running effort that deepwork sessions are logged against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "totalDeepworks")]
    pub total_deepworks_completed: u32,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, alias = "plannedDays", skip_serializing_if = "Option::is_none")]
    pub planned_duration_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_goal: Option<f64>,
    /// Only set on projects reconstructed from history; otherwise hours are
    /// derived from the project's entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_logged: Option<f64>,
}

fn default_emoji() -> String {
    DEFAULT_PROJECT_EMOJI.to_string()
}

impl Project {
    /// Create a fresh project with a random id.
    pub fn new(name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            emoji: emoji.into(),
            focus: None,
            created_at: Utc::now(),
            total_deepworks_completed: 0,
            status: ProjectStatus::InProgress,
            planned_duration_days: None,
            hours_goal: None,
            hours_logged: None,
        }
    }

    /// Placeholder for a project that history references but the backup
    /// did not carry.
    pub fn restored_from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.project_id.clone(),
            name: entry
                .project_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| RESTORED_PROJECT_NAME.to_string()),
            emoji: entry
                .project_emoji
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(default_emoji),
            focus: entry.project_focus.clone(),
            created_at: entry.date,
            total_deepworks_completed: 1,
            status: ProjectStatus::InProgress,
            planned_duration_days: Some(7),
            hours_goal: Some(10.0),
            hours_logged: Some(entry.focus_duration_seconds as f64 / 3600.0),
        }
    }

    /// Check the user-editable fields.
    ///
    /// # Errors
    /// Returns a validation error for an empty id or name, or a non-positive
    /// duration or hours goal.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if self.planned_duration_days == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: "plannedDurationDays".into(),
                message: "must be a positive number of days".into(),
            });
        }
        if let Some(goal) = self.hours_goal {
            if !(goal > 0.0) {
                return Err(ValidationError::InvalidValue {
                    field: "hoursGoal".into(),
                    message: "must be positive".into(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EvidenceType {
    Screenshot,
    Link,
    Flashcard,
    Audio,
    Other(String),
}

impl EvidenceType {
    pub fn as_str(&self) -> &str {
        match self {
            EvidenceType::Screenshot => "screenshot",
            EvidenceType::Link => "link",
            EvidenceType::Flashcard => "flashcard",
            EvidenceType::Audio => "audio",
            EvidenceType::Other(s) => s,
        }
    }

    /// Screenshots and audio clips are captured outside the core, so an
    /// empty content string stands in as a marker.
    pub fn allows_empty_content(&self) -> bool {
        matches!(self, EvidenceType::Screenshot | EvidenceType::Audio)
    }
}

impl From<String> for EvidenceType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "screenshot" => EvidenceType::Screenshot,
            "link" => EvidenceType::Link,
            "flashcard" => EvidenceType::Flashcard,
            "audio" => EvidenceType::Audio,
            _ => EvidenceType::Other(s),
        }
    }
}

impl From<&str> for EvidenceType {
    fn from(s: &str) -> Self {
        EvidenceType::from(s.to_string())
    }
}

impl From<EvidenceType> for String {
    fn from(t: EvidenceType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub kind: EvidenceType,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synthesis {
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub stuck_on: BTreeSet<String>,
}

/// One completed deepwork session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_focus: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default = "one", alias = "deepworksCompleted")]
    pub deepworks_completed_this_day: u32,
    #[serde(default = "one", alias = "deepworksPlanned")]
    pub deepworks_planned_this_day: u32,
    #[serde(default, alias = "duration")]
    pub focus_duration_seconds: u64,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub synthesis: Synthesis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

fn one() -> u32 {
    1
}

impl HistoryEntry {
    /// Entries must carry the three fields identity and grouping rely on.
    pub fn is_importable(&self) -> bool {
        !self.id.trim().is_empty() && !self.project_id.trim().is_empty()
    }
}
