//! Deepwork session flow.
//!
//! [`SessionFlowController`] sequences one deepwork day: mood check-in,
//! target count, then one or more sessions of warm-up, question capture,
//! focus, synthesis and evidence. Warm-up and focus are driven by a
//! [`CountdownTimer`] that the caller ticks.

mod controller;
mod countdown;
mod stage;

pub use controller::{SessionFlowController, SessionWorkingState};
pub use countdown::{Countdown, CountdownTimer, TickOutcome, TimerToken};
pub use stage::Stage;

use crate::error::Result;
use crate::model::{HistoryEntry, Project};

/// Write contract the controller needs from persistence.
pub trait SessionSink {
    /// Project the finished session is logged against.
    fn current_project(&self) -> Result<Project>;

    /// Persist the entry and increment its project's counter as one unit.
    fn record_session(&mut self, entry: &HistoryEntry) -> Result<()>;
}
