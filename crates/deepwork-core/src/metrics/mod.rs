//! Metrics over the session history.
//!
//! Everything here is a pure read over a borrowed snapshot of history and
//! projects: streaks, a per-day deepwork series, weekday/hour peaks, average
//! daily focus and project progress. "Today" and the timezone that decides
//! calendar days are inputs, so results are reproducible.
//!
//! An empty history yields zeros and `None` placeholders, never an error.

mod peaks;
mod projects;
mod series;
mod streak;

pub use peaks::{average_focus_seconds_per_day, compute_peaks, total_focus_seconds, DayPeriod, Peaks};
pub use projects::{project_stats, rank_projects, ProjectStats};
pub use series::{deepwork_series, Granularity, SeriesPoint};
pub use streak::{active_days, compute_streak, Streak};

use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::backup::Backup;
use crate::model::{HistoryEntry, Project};

/// Everything a metrics screen shows, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub today: NaiveDate,
    pub granularity: Granularity,
    pub streak: Streak,
    pub series: Vec<SeriesPoint>,
    pub peaks: Peaks,
    pub total_sessions: usize,
    pub total_focus_seconds: u64,
    pub average_focus_seconds_per_day: u64,
    pub projects: Vec<ProjectStats>,
}

/// Read-only analyzer over one snapshot.
#[derive(Debug, Clone)]
pub struct MetricsEngine<'a, Tz: TimeZone> {
    history: &'a [HistoryEntry],
    projects: &'a [Project],
    today: NaiveDate,
    tz: Tz,
}

impl<'a, Tz: TimeZone> MetricsEngine<'a, Tz> {
    pub fn new(history: &'a [HistoryEntry], projects: &'a [Project], today: NaiveDate, tz: Tz) -> Self {
        Self {
            history,
            projects,
            today,
            tz,
        }
    }

    pub fn from_backup(backup: &'a Backup, today: NaiveDate, tz: Tz) -> Self {
        Self::new(&backup.history, &backup.projects, today, tz)
    }

    pub fn streak(&self) -> Streak {
        compute_streak(self.history, self.today, &self.tz)
    }

    pub fn series(&self, granularity: Granularity) -> Vec<SeriesPoint> {
        deepwork_series(self.history, granularity, self.today, &self.tz)
    }

    pub fn peaks(&self) -> Peaks {
        compute_peaks(self.history, &self.tz)
    }

    pub fn average_focus_seconds_per_day(&self) -> u64 {
        average_focus_seconds_per_day(self.history, &self.tz)
    }

    pub fn project_ranking(&self) -> Vec<ProjectStats> {
        rank_projects(self.projects, self.history, self.today, &self.tz)
    }

    pub fn report(&self, granularity: Granularity) -> MetricsReport {
        MetricsReport {
            today: self.today,
            granularity,
            streak: self.streak(),
            series: self.series(granularity),
            peaks: self.peaks(),
            total_sessions: self.history.len(),
            total_focus_seconds: total_focus_seconds(self.history),
            average_focus_seconds_per_day: self.average_focus_seconds_per_day(),
            projects: self.project_ranking(),
        }
    }
}

/// Full report for a snapshot, as of `today` in `tz`.
pub fn summarize<Tz: TimeZone>(
    backup: &Backup,
    granularity: Granularity,
    today: NaiveDate,
    tz: Tz,
) -> MetricsReport {
    MetricsEngine::from_backup(backup, today, tz).report(granularity)
}
