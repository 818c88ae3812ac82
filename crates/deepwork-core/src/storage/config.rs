//! TOML-based application configuration.
//!
//! Holds the data the session flow needs from outside the core:
//! - Mood presets (suggested deepwork count, warm-up and focus durations)
//! - Mood display metadata
//! - Project templates and the project seeded into an empty store
//! - Deepwork count options offered by front-ends
//!
//! Configuration is stored at `~/.config/deepwork/config.toml`. When the file
//! is missing or unreadable, the built-in presets apply.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::model::Mood;

/// Per-mood session parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodPreset {
    pub suggested: u32,
    #[serde(alias = "warmupTime", alias = "warmup_seconds")]
    pub warmup_seconds: u64,
    #[serde(alias = "focusTime", alias = "focus_seconds")]
    pub focus_seconds: u64,
}

impl MoodPreset {
    pub const fn new(suggested: u32, warmup_seconds: u64, focus_seconds: u64) -> Self {
        Self {
            suggested,
            warmup_seconds,
            focus_seconds,
        }
    }
}

/// Mood id to preset lookup with a built-in fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodPresets {
    table: BTreeMap<String, MoodPreset>,
}

impl MoodPresets {
    pub fn builtin() -> Self {
        Self {
            table: default_moods(),
        }
    }

    pub fn from_table(table: BTreeMap<String, MoodPreset>) -> Self {
        Self { table }
    }

    /// Configured preset for the mood, else the built-in one.
    pub fn get(&self, mood: &Mood) -> Option<MoodPreset> {
        self.table
            .get(mood.as_str())
            .copied()
            .or_else(|| default_moods().get(mood.as_str()).copied())
    }
}

impl Default for MoodPresets {
    fn default() -> Self {
        Self::builtin()
    }
}

/// How a mood is shown by front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodDisplay {
    pub id: String,
    pub label: String,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTemplate {
    pub name: String,
    pub emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/deepwork/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_count_options")]
    pub count_options: Vec<u32>,
    /// Project created when the store would otherwise hold none.
    #[serde(default = "default_seed_project")]
    pub seed_project: ProjectTemplate,
    #[serde(default = "default_moods")]
    pub moods: BTreeMap<String, MoodPreset>,
    #[serde(default = "default_mood_display")]
    pub mood_display: Vec<MoodDisplay>,
    #[serde(default = "default_templates")]
    pub project_templates: Vec<ProjectTemplate>,
}

fn default_moods() -> BTreeMap<String, MoodPreset> {
    BTreeMap::from([
        ("low".to_string(), MoodPreset::new(1, 120, 900)),
        ("neutral".to_string(), MoodPreset::new(2, 120, 1500)),
        ("ready".to_string(), MoodPreset::new(3, 120, 1500)),
        ("flow".to_string(), MoodPreset::new(5, 120, 2700)),
    ])
}

fn default_mood_display() -> Vec<MoodDisplay> {
    [
        ("low", "Low energy", "😴"),
        ("neutral", "Neutral", "😐"),
        ("ready", "Ready", "💪"),
        ("flow", "In the flow", "🔥"),
    ]
    .into_iter()
    .map(|(id, label, emoji)| MoodDisplay {
        id: id.into(),
        label: label.into(),
        emoji: emoji.into(),
    })
    .collect()
}

fn default_templates() -> Vec<ProjectTemplate> {
    [
        ("Learn a language", "🗣️"),
        ("Programming", "💻"),
        ("Music", "🎹"),
        ("Reading", "📚"),
        ("Custom project", "📁"),
    ]
    .into_iter()
    .map(|(name, emoji)| ProjectTemplate {
        name: name.into(),
        emoji: emoji.into(),
        focus: None,
    })
    .collect()
}

fn default_seed_project() -> ProjectTemplate {
    ProjectTemplate {
        name: "My first project".into(),
        emoji: "🚀".into(),
        focus: None,
    }
}

fn default_count_options() -> Vec<u32> {
    vec![1, 2, 3, 4, 5]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            moods: default_moods(),
            mood_display: default_mood_display(),
            project_templates: default_templates(),
            seed_project: default_seed_project(),
            count_options: default_count_options(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Location of the configuration file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from disk, falling back to the built-in presets on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using built-in configuration: {e}");
            Self::default()
        })
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the existing value's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn mood_presets(&self) -> MoodPresets {
        MoodPresets::from_table(self.moods.clone())
    }
}
