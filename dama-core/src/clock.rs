//! Per-turn countdown.
//!
//! The clock only stores a deadline; callers pass the current instant in.
//! Restarting moves the deadline, so an expiry computed for an earlier turn
//! no longer matches and is ignored.

use std::time::{Duration, Instant};

/// Default time a player has for one turn.
pub const DEFAULT_TURN_DURATION: Duration = Duration::from_secs(60);

/// A cancellable countdown for the player whose turn it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnClock {
    duration: Duration,
    deadline: Option<Instant>,
}

impl TurnClock {
    /// Create a stopped clock.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }

    /// Start (or restart) the countdown from `now`. Returns the deadline.
    pub fn start(&mut self, now: Instant) -> Instant {
        let deadline = now + self.duration;
        self.deadline = Some(deadline);
        deadline
    }

    /// Stop the countdown.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Current deadline, if running.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Length of one turn.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time left, if running.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Whether the running countdown has reached zero.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

impl Default for TurnClock {
    fn default() -> Self {
        Self::new(DEFAULT_TURN_DURATION)
    }
}
