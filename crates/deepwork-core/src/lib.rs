//! # Deepwork Core Library
//!
//! Core logic for the deepwork session tracker: a guided, timer-driven flow
//! through one or more deep-work sessions per day, durable project and
//! history storage, backup import-merge and history metrics.
//!
//! ## Architecture
//!
//! - **Session flow**: A caller-ticked state machine. Countdowns are armed
//!   with a [`TimerToken`]; ticks carrying a stale token are ignored.
//! - **Storage**: SQLite key-value records for projects, history and the
//!   current project, plus TOML configuration.
//! - **Backup**: JSON export and an idempotent merge of imported backups.
//! - **Metrics**: Pure functions over a history snapshot.
//!
//! ## Key Components
//!
//! - [`SessionFlowController`]: Session state machine
//! - [`Store`]: Project and history persistence
//! - [`Config`]: Application configuration management
//! - [`MetricsEngine`]: Streaks, series, peaks and project progress

pub mod backup;
pub mod error;
pub mod events;
pub mod flow;
pub mod metrics;
pub mod model;
pub mod storage;

pub use backup::{merge, Backup, BackupPayload, MergeOutcome, MergeSummary};
pub use error::{ConfigError, CoreError, DatabaseError, ImportError, Result, ValidationError};
pub use events::Event;
pub use flow::{SessionFlowController, SessionSink, SessionWorkingState, Stage, TimerToken};
pub use metrics::{summarize, Granularity, MetricsEngine, MetricsReport};
pub use model::{Evidence, EvidenceType, HistoryEntry, Mood, Project, ProjectStatus, Synthesis};
pub use storage::{Config, MoodPreset, MoodPresets, Store};
