use std::fmt;

use serde::{Deserialize, Serialize};

/// Position in the deepwork sequence.
///
/// ```text
/// entry -> mood_select -> session_config -> warmup -> question_capture
///       -> focus -> synthesis -> evidence -> completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Entry,
    MoodSelect,
    SessionConfig,
    Warmup,
    QuestionCapture,
    Focus,
    Synthesis,
    Evidence,
    Completed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Entry => "entry",
            Stage::MoodSelect => "mood_select",
            Stage::SessionConfig => "session_config",
            Stage::Warmup => "warmup",
            Stage::QuestionCapture => "question_capture",
            Stage::Focus => "focus",
            Stage::Synthesis => "synthesis",
            Stage::Evidence => "evidence",
            Stage::Completed => "completed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serialized_name() {
        for stage in [Stage::Entry, Stage::MoodSelect, Stage::QuestionCapture] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{stage}\""));
        }
    }
}
