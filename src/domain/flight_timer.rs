// Flight timer - counts whole seconds from flow entry until the stop action
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Stopped,
}

/// Elapsed-seconds accumulator with a single `Running -> Stopped` transition.
///
/// A stopped timer is frozen: later ticks and repeated stops are no-ops, so a
/// tick racing the stop action can never move the reported flight time.
#[derive(Debug, Clone)]
pub struct FlightTimer {
    elapsed_seconds: u64,
    state: TimerState,
}

impl Default for FlightTimer {
    fn default() -> Self {
        Self {
            elapsed_seconds: 0,
            state: TimerState::Idle,
        }
    }
}

impl FlightTimer {
    /// Moves an idle timer to `Running`. Any other state is left untouched.
    pub fn start(&mut self) {
        if self.state == TimerState::Idle {
            self.state = TimerState::Running;
        }
    }

    /// Adds one second. Returns false (and changes nothing) unless running.
    pub fn tick(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.elapsed_seconds += 1;
        true
    }

    /// Freezes the timer and hands back the flight time in seconds.
    pub fn stop(&mut self) -> u64 {
        self.state = TimerState::Stopped;
        self.elapsed_seconds
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn state(&self) -> TimerState {
        self.state
    }
}

/// Clock-face pieces of a duration: `H`, `MM`, `SS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedTime {
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
}

pub fn format_time(total_seconds: u64) -> FormattedTime {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    FormattedTime {
        hours: hours.to_string(),
        minutes: format!("{:02}", minutes),
        seconds: format!("{:02}", seconds),
    }
}

impl fmt::Display for FormattedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.hours, self.minutes, self.seconds)
    }
}
