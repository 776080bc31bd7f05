//! State management module
//!
//! This module contains the countdown state machine, the values it publishes,
//! and the shared application state that wraps it.

pub mod app_state;
pub mod controller;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use controller::CountdownController;
pub use timer_state::{
    AvailableAction, CountdownEvent, CountdownSnapshot, TimerState, LAUNCH_DURATION_MS, LAUNCH_INTERVAL_MS,
    RESUME_INTERVAL_MS,
};
