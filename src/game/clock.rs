use log::warn;
use std::time::Duration;

/// Default interval at which the coordinating context advances the clocks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockState {
    Paused,
    Running,
    Expired,
    Cancelled,
}

/// Result of advancing a clock by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// The clock is not running; nothing changed.
    Idle,
    /// The clock is running and this much time is left.
    Running(Duration),
    /// The clock just ran out. Reported once per clock.
    Expired,
}

/// A pausable countdown for one side.
///
/// The clock does not own a timer. Whoever owns it calls [`Clock::tick`] with
/// the time elapsed since the previous tick, which keeps every state change on
/// the caller's thread.
#[derive(Debug, Clone)]
pub struct Clock {
    remaining: Duration,
    state: ClockState,
}

impl Clock {
    /// Creates a paused clock holding `initial`.
    pub fn new(initial: Duration) -> Self {
        Self {
            remaining: initial,
            state: ClockState::Paused,
        }
    }

    /// Starts or resumes the countdown.
    pub fn start(&mut self) {
        match self.state {
            ClockState::Paused => self.state = ClockState::Running,
            ClockState::Running => {}
            ClockState::Expired | ClockState::Cancelled => {
                warn!("Ignoring start on a stopped clock ({:?})", self.state);
            }
        }
    }

    /// Pauses a running clock. No-op otherwise.
    pub fn pause(&mut self) {
        if self.state == ClockState::Running {
            self.state = ClockState::Paused;
        }
    }

    /// Stops the clock for good without reporting expiry.
    pub fn cancel(&mut self) {
        if matches!(self.state, ClockState::Paused | ClockState::Running) {
            self.state = ClockState::Cancelled;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state == ClockState::Paused
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn is_expired(&self) -> bool {
        self.state == ClockState::Expired
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Adds a per-move increment. Stopped clocks keep their final time.
    pub fn add_increment(&mut self, increment: Duration) {
        if matches!(self.state, ClockState::Paused | ClockState::Running) {
            self.remaining = self.remaining.saturating_add(increment);
        }
    }

    /// Counts down by `elapsed` if running.
    pub fn tick(&mut self, elapsed: Duration) -> ClockTick {
        if self.state != ClockState::Running {
            return ClockTick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            self.state = ClockState::Expired;
            ClockTick::Expired
        } else {
            ClockTick::Running(self.remaining)
        }
    }
}

/// Formats a remaining time as `m:ss`.
///
/// Partial seconds round up, so `0:00` only shows once the time is gone.
pub fn format_clock(remaining: Duration) -> String {
    let millis = remaining.as_millis();
    let seconds = (millis + 999) / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
