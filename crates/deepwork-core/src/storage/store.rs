//! SQLite-backed project and history storage.
//!
//! The dataset lives in a key-value table as three independently addressable
//! JSON records:
//! - `projects`: every [`Project`]
//! - `history`: every [`HistoryEntry`], newest first
//! - `current_project`: id of the selected project
//!
//! Each record is read and written whole. Mutations touching more than one
//! record run in a single transaction so projects and history never disagree.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::config::ProjectTemplate;
use super::data_dir;
use crate::backup::{Backup, MergeOutcome};
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::flow::SessionSink;
use crate::model::{HistoryEntry, Project, ProjectStatus};

pub const PROJECTS_KEY: &str = "projects";
pub const HISTORY_KEY: &str = "history";
pub const CURRENT_PROJECT_KEY: &str = "current_project";

/// Durable store for projects, history and the current-project pointer.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store at `~/.config/deepwork/deepwork.db`.
    ///
    /// Creates the database file and schema if they don't exist and seeds a
    /// project from `seed` when none is stored.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened, migrated or seeded.
    pub fn open(seed: &ProjectTemplate) -> Result<Self> {
        let path = data_dir()?.join("deepwork.db");
        Self::open_at(&path, seed)
    }

    /// Open the store at an explicit path.
    ///
    /// # Errors
    /// Same as [`Store::open`].
    pub fn open_at(path: &Path, seed: &ProjectTemplate) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn, seed)
    }

    /// Open an in-memory store (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory(seed: &ProjectTemplate) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, seed)
    }

    fn init(conn: Connection, seed: &ProjectTemplate) -> Result<Self> {
        let mut store = Self { conn };
        store.migrate()?;
        store.ensure_projects(seed)?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Guarantee at least one project and a valid current pointer.
    ///
    /// Projects referenced by history but missing from the project list are
    /// reconstructed; an empty dataset gets the seed project.
    fn ensure_projects(&mut self, seed: &ProjectTemplate) -> Result<()> {
        let tx = self.conn.transaction()?;
        let mut projects: Vec<Project> = read_record(&tx, PROJECTS_KEY)?.unwrap_or_default();
        let history: Vec<HistoryEntry> = read_record(&tx, HISTORY_KEY)?.unwrap_or_default();
        let mut changed = false;

        for entry in &history {
            if !projects.iter().any(|p| p.id == entry.project_id) {
                tracing::warn!(project_id = %entry.project_id, "restoring project referenced by history");
                projects.push(Project::restored_from(entry));
                changed = true;
            }
        }
        if projects.is_empty() {
            let mut project = Project::new(seed.name.clone(), seed.emoji.clone());
            project.focus = seed.focus.clone();
            tracing::info!(project_id = %project.id, "seeding default project");
            projects.push(project);
            changed = true;
        }
        if changed {
            write_record(&tx, PROJECTS_KEY, &projects)?;
        }

        let current: Option<String> = read_record(&tx, CURRENT_PROJECT_KEY)?;
        let pointer_valid = current
            .as_deref()
            .is_some_and(|id| projects.iter().any(|p| p.id == id));
        if !pointer_valid {
            write_record(&tx, CURRENT_PROJECT_KEY, &projects[0].id)?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(read_record(&self.conn, PROJECTS_KEY)?.unwrap_or_default())
    }

    pub fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(read_record(&self.conn, HISTORY_KEY)?.unwrap_or_default())
    }

    pub fn project(&self, id: &str) -> Result<Project> {
        self.list_projects()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::project_not_found(id))
    }

    /// The selected project, or the first one if the pointer is dangling.
    pub fn current_project(&self) -> Result<Project> {
        let projects = self.list_projects()?;
        let current: Option<String> = read_record(&self.conn, CURRENT_PROJECT_KEY)?;
        current
            .and_then(|id| projects.iter().find(|p| p.id == id).cloned())
            .or_else(|| projects.first().cloned())
            .ok_or_else(|| CoreError::project_not_found("<current>"))
    }

    /// Consistent copy of the whole dataset.
    pub fn snapshot(&self) -> Result<Backup> {
        Ok(Backup {
            history: self.list_history()?,
            projects: self.list_projects()?,
        })
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append an entry whose project already exists.
    ///
    /// # Errors
    /// `NotFound` for an unknown project, a validation error for a duplicate id.
    pub fn append_history_entry(&mut self, entry: &HistoryEntry) -> Result<()> {
        let tx = self.conn.transaction()?;
        let projects: Vec<Project> = read_record(&tx, PROJECTS_KEY)?.unwrap_or_default();
        if !projects.iter().any(|p| p.id == entry.project_id) {
            return Err(CoreError::project_not_found(&entry.project_id));
        }
        let history = insert_entry(read_record(&tx, HISTORY_KEY)?.unwrap_or_default(), entry)?;
        write_record(&tx, HISTORY_KEY, &history)?;
        tx.commit()?;
        tracing::debug!(entry_id = %entry.id, "history entry appended");
        Ok(())
    }

    /// Insert or replace a project by id.
    ///
    /// # Errors
    /// Returns a validation error for invalid fields.
    pub fn upsert_project(&mut self, project: &Project) -> Result<()> {
        project.validate()?;
        let mut projects = self.list_projects()?;
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project.clone(),
            None => projects.push(project.clone()),
        }
        write_record(&self.conn, PROJECTS_KEY, &projects)?;
        tracing::debug!(project_id = %project.id, "project saved");
        Ok(())
    }

    /// # Errors
    /// `NotFound` when no project has this id.
    pub fn set_current_project(&mut self, id: &str) -> Result<()> {
        let projects = self.list_projects()?;
        if !projects.iter().any(|p| p.id == id) {
            return Err(CoreError::project_not_found(id));
        }
        write_record(&self.conn, CURRENT_PROJECT_KEY, &id)?;
        Ok(())
    }

    /// # Errors
    /// `NotFound` when no project has this id.
    pub fn update_project_status(&mut self, id: &str, status: ProjectStatus) -> Result<Project> {
        let mut project = self.project(id)?;
        project.status = status;
        self.upsert_project(&project)?;
        Ok(project)
    }

    /// Delete a project. History entries are kept.
    ///
    /// # Errors
    /// `NotFound` for an unknown id; a validation error when the project is the
    /// last one left or still has history attached.
    pub fn delete_project(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        let mut projects: Vec<Project> = read_record(&tx, PROJECTS_KEY)?.unwrap_or_default();
        let Some(pos) = projects.iter().position(|p| p.id == id) else {
            return Err(CoreError::project_not_found(id));
        };
        if projects.len() == 1 {
            return Err(ValidationError::InvalidValue {
                field: "project".into(),
                message: "the last project cannot be deleted".into(),
            }
            .into());
        }
        let history: Vec<HistoryEntry> = read_record(&tx, HISTORY_KEY)?.unwrap_or_default();
        if history.iter().any(|e| e.project_id == id) {
            return Err(ValidationError::InvalidValue {
                field: "project".into(),
                message: "projects with recorded sessions cannot be deleted".into(),
            }
            .into());
        }
        projects.remove(pos);
        write_record(&tx, PROJECTS_KEY, &projects)?;

        let current: Option<String> = read_record(&tx, CURRENT_PROJECT_KEY)?;
        if current.as_deref() == Some(id) {
            write_record(&tx, CURRENT_PROJECT_KEY, &projects[0].id)?;
        }
        tx.commit()?;
        tracing::info!(project_id = %id, "project deleted");
        Ok(())
    }

    /// Append a finished session and bump its project's counter atomically.
    ///
    /// # Errors
    /// `NotFound` if the project is gone; nothing is written in that case.
    pub fn record_session(&mut self, entry: &HistoryEntry) -> Result<Project> {
        let tx = self.conn.transaction()?;
        let mut projects: Vec<Project> = read_record(&tx, PROJECTS_KEY)?.unwrap_or_default();
        let project = projects
            .iter_mut()
            .find(|p| p.id == entry.project_id)
            .ok_or_else(|| CoreError::project_not_found(&entry.project_id))?;
        project.total_deepworks_completed = project.total_deepworks_completed.saturating_add(1);
        let updated = project.clone();

        let history = insert_entry(read_record(&tx, HISTORY_KEY)?.unwrap_or_default(), entry)?;
        write_record(&tx, HISTORY_KEY, &history)?;
        write_record(&tx, PROJECTS_KEY, &projects)?;
        tx.commit()?;

        tracing::info!(
            entry_id = %entry.id,
            project_id = %updated.id,
            total = updated.total_deepworks_completed,
            "session recorded"
        );
        Ok(updated)
    }

    /// Replace projects and history with a merge result.
    pub fn apply_merge(&mut self, outcome: &MergeOutcome) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_record(&tx, PROJECTS_KEY, &outcome.projects)?;
        write_record(&tx, HISTORY_KEY, &outcome.history)?;
        tx.commit()?;
        Ok(())
    }

    // ── Key-value access ─────────────────────────────────────────────

    /// Get a raw value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        kv_get(&self.conn, key)
    }

    /// Set a raw value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        kv_set(&self.conn, key, value)
    }
}

impl SessionSink for Store {
    fn current_project(&self) -> Result<Project> {
        Store::current_project(self)
    }

    fn record_session(&mut self, entry: &HistoryEntry) -> Result<()> {
        Store::record_session(self, entry).map(|_| ())
    }
}

fn insert_entry(mut history: Vec<HistoryEntry>, entry: &HistoryEntry) -> Result<Vec<HistoryEntry>> {
    if history.iter().any(|e| e.id == entry.id) {
        return Err(ValidationError::InvalidValue {
            field: "id".into(),
            message: format!("history entry '{}' already exists", entry.id),
        }
        .into());
    }
    history.insert(0, entry.clone());
    history.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(history)
}

fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
        row.get::<_, String>(0)
    })
    .optional()
}

fn kv_set(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

fn read_record<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    match kv_get(conn, key)? {
        Some(json) => serde_json::from_str(&json).map(Some).map_err(|e| {
            DatabaseError::CorruptRecord {
                key: key.to_string(),
                message: e.to_string(),
            }
            .into()
        }),
        None => Ok(None),
    }
}

fn write_record<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    kv_set(conn, key, &json)?;
    Ok(())
}
