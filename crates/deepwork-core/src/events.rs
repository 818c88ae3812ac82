use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{EvidenceType, Mood};

/// Characters of evidence content carried in `evidence_added`.
pub const CONTENT_PREVIEW_CHARS: usize = 50;

/// Every milestone of a deepwork session produces an Event.
/// The controller accumulates them; an external logger exports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    SessionStart {
        at: DateTime<Utc>,
    },
    MoodSet {
        mood: Mood,
        at: DateTime<Utc>,
    },
    WarmupComplete {
        duration_seconds: u64,
        deepwork_index: u32,
        at: DateTime<Utc>,
    },
    FocusComplete {
        questions_answered: usize,
        duration_seconds: u64,
        at: DateTime<Utc>,
    },
    EvidenceAdded {
        #[serde(rename = "type")]
        kind: EvidenceType,
        content_preview: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::SessionStart { at }
            | Event::MoodSet { at, .. }
            | Event::WarmupComplete { at, .. }
            | Event::FocusComplete { at, .. }
            | Event::EvidenceAdded { at, .. } => *at,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionStart { .. } => "session_start",
            Event::MoodSet { .. } => "mood_set",
            Event::WarmupComplete { .. } => "warmup_complete",
            Event::FocusComplete { .. } => "focus_complete",
            Event::EvidenceAdded { .. } => "evidence_added",
        }
    }
}

/// First [`CONTENT_PREVIEW_CHARS`] characters, split on char boundaries.
pub fn content_preview(content: &str) -> String {
    content.chars().take(CONTENT_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_tag() {
        let ev = Event::WarmupComplete {
            duration_seconds: 120,
            deepwork_index: 2,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event_type"], "warmup_complete");
        assert_eq!(json["deepwork_index"], 2);
        assert_eq!(ev.name(), "warmup_complete");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let long = "ñ".repeat(80);
        assert_eq!(content_preview(&long).chars().count(), 50);
        assert_eq!(content_preview("short"), "short");
    }
}
