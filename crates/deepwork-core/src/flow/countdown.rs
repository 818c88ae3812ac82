//! Cancelable per-stage countdown.
//!
//! The countdown does not own a thread or a runtime. Whoever drives it (a
//! test, the CLI's interval loop) delivers logical one-second ticks together
//! with the [`TimerToken`] it was handed when the countdown was armed. Arming
//! or cancelling bumps the generation, so a tick carrying an old token is
//! rejected without touching the remaining time.

use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// Identity of one armed countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    pub stage: Stage,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub token: TimerToken,
    pub duration_secs: u64,
    pub remaining_secs: u64,
}

impl Countdown {
    pub fn elapsed_secs(&self) -> u64 {
        self.duration_secs - self.remaining_secs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Token does not belong to the active countdown.
    Stale,
    Running { remaining_secs: u64 },
    /// Reached zero. The countdown is disarmed.
    Expired(TimerToken),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownTimer {
    generation: u64,
    active: Option<Countdown>,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a new countdown, replacing (and thereby cancelling) any active one.
    pub fn arm(&mut self, stage: Stage, duration_secs: u64) -> TimerToken {
        self.generation += 1;
        let token = TimerToken {
            stage,
            generation: self.generation,
        };
        self.active = Some(Countdown {
            token,
            duration_secs,
            remaining_secs: duration_secs,
        });
        token
    }

    /// Stop the active countdown. Returns it so callers can read elapsed time.
    pub fn cancel(&mut self) -> Option<Countdown> {
        if self.active.is_some() {
            self.generation += 1;
        }
        self.active.take()
    }

    pub fn active(&self) -> Option<&Countdown> {
        self.active.as_ref()
    }

    pub fn token(&self) -> Option<TimerToken> {
        self.active.as_ref().map(|c| c.token)
    }

    pub fn remaining_secs(&self) -> Option<u64> {
        self.active.as_ref().map(|c| c.remaining_secs)
    }

    /// Deliver one logical second.
    pub fn tick(&mut self, token: TimerToken) -> TickOutcome {
        let Some(countdown) = self.active.as_mut() else {
            return TickOutcome::Stale;
        };
        if countdown.token != token {
            return TickOutcome::Stale;
        }
        countdown.remaining_secs = countdown.remaining_secs.saturating_sub(1);
        if countdown.remaining_secs == 0 {
            self.active = None;
            self.generation += 1;
            TickOutcome::Expired(token)
        } else {
            TickOutcome::Running {
                remaining_secs: countdown.remaining_secs,
            }
        }
    }
}
