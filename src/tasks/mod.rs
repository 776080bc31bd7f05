//! Background tasks module
//!
//! This module contains the tick source driving the countdown and the task
//! that feeds its events back into the shared state.

pub mod tick_dispatch;
pub mod tick_source;

// Re-export main items
pub use tick_dispatch::tick_dispatch_task;
pub use tick_source::{TickEvent, TickHandle, TickKind, TickSource, TokioTickSource};
