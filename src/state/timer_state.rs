//! Timer state and the values published to observers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Countdown used by the "START LAUNCH" action
pub const LAUNCH_DURATION_MS: u64 = 10_000;
/// Tick interval used by the "START LAUNCH" action
pub const LAUNCH_INTERVAL_MS: u64 = 1_000;
/// Tick interval used when resuming from a paused countdown
pub const RESUME_INTERVAL_MS: u64 = 1;

/// Where the countdown is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Not started, or reset
    #[default]
    New,
    /// Counting down
    Running,
    /// Stopped mid-count with the remaining time retained
    Paused,
    /// Counted down to zero
    Launch,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::New => "new",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Launch => "launch",
        }
    }
}

/// The one control offered to the user in each state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailableAction {
    Launch,
    Pause,
    Start,
}

impl TimerState {
    /// Running offers pause, paused offers start, anything else offers a fresh launch
    pub fn available_action(&self) -> AvailableAction {
        match self {
            TimerState::Running => AvailableAction::Pause,
            TimerState::Paused => AvailableAction::Start,
            TimerState::New | TimerState::Launch => AvailableAction::Launch,
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    pub state: TimerState,
    pub remaining_seconds: u64,
    pub remaining_ms: u64,
}

impl CountdownSnapshot {
    pub fn new(state: TimerState, remaining_ms: u64) -> Self {
        Self {
            state,
            remaining_seconds: remaining_ms / 1000,
            remaining_ms,
        }
    }
}

/// Change notification broadcast to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CountdownEvent {
    StateChanged { state: TimerState },
    TimeChanged { remaining_seconds: u64 },
}

impl CountdownEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            CountdownEvent::StateChanged { .. } => "state",
            CountdownEvent::TimeChanged { .. } => "time",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_floors_displayed_seconds() {
        let snapshot = CountdownSnapshot::new(TimerState::Running, 2999);
        assert_eq!(snapshot.remaining_seconds, 2);
        assert_eq!(CountdownSnapshot::new(TimerState::Running, 999).remaining_seconds, 0);
    }

    #[test]
    fn timer_state_serializes_lowercase() {
        let json = serde_json::to_string(&TimerState::Launch).unwrap();
        assert_eq!(json, "\"launch\"");
        assert_eq!(TimerState::Paused.to_string(), "paused");
    }

    #[test]
    fn each_state_offers_one_action() {
        assert_eq!(TimerState::New.available_action(), AvailableAction::Launch);
        assert_eq!(TimerState::Running.available_action(), AvailableAction::Pause);
        assert_eq!(TimerState::Paused.available_action(), AvailableAction::Start);
        assert_eq!(TimerState::Launch.available_action(), AvailableAction::Launch);
        assert_eq!(serde_json::to_string(&AvailableAction::Start).unwrap(), "\"start\"");
    }

    #[test]
    fn events_are_tagged() {
        let json = serde_json::to_value(CountdownEvent::TimeChanged { remaining_seconds: 7 }).unwrap();
        assert_eq!(json["event"], "time_changed");
        assert_eq!(json["remaining_seconds"], 7);
    }
}
