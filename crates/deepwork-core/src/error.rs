//! Core error types for deepwork-core.
//!
//! This module defines the error hierarchy using thiserror. The split mirrors
//! how callers react to a failure: validation problems are shown to the user,
//! invalid-state errors are programming mistakes, not-found errors reference
//! unknown ids, and import errors abort a backup restore wholesale.

use std::path::PathBuf;
use thiserror::Error;

use crate::flow::Stage;

/// Core error type for deepwork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or malformed user input. State is left untouched.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation invoked in the wrong stage.
    #[error("Invalid state: {operation} is not allowed in stage {stage}")]
    InvalidState {
        operation: &'static str,
        stage: Stage,
    },

    /// Reference to an unknown project or entry.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Backup payload rejected.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn invalid_state(operation: &'static str, stage: Stage) -> Self {
        CoreError::InvalidState { operation, stage }
    }

    pub(crate) fn project_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind: "Project",
            id: id.into(),
        }
    }

    /// True for errors caused by user input rather than misuse or IO.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty after trimming.
    #[error("'{0}' must not be empty")]
    EmptyField(&'static str),

    /// Focus cannot begin without a question.
    #[error("At least one question is required before focusing")]
    NoQuestion,

    /// Evidence submitted without a type.
    #[error("An evidence type must be selected")]
    MissingEvidenceType,

    /// Evidence type requires content.
    #[error("Evidence of type '{0}' requires content")]
    MissingEvidenceContent(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Backup import errors.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The payload is not JSON at all.
    #[error("Backup is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Neither valid history entries nor projects survived filtering.
    #[error("No valid history entries or projects found in backup")]
    NothingToImport,
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A stored record could not be decoded.
    #[error("Stored record '{key}' is corrupt: {message}")]
    CorruptRecord { key: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
