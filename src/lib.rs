//! Liftoff - a countdown-to-liftoff timer service
//!
//! This library provides the start/pause/reset countdown state machine, the
//! tick source that drives it, and an HTTP surface to control and observe it.

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::CountdownError;
pub use state::{AppState, CountdownController, CountdownEvent, CountdownSnapshot, TimerState};
pub use utils::signals::shutdown_signal;
