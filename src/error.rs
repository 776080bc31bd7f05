//! Countdown error types

use thiserror::Error;

/// Errors returned by countdown operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountdownError {
    /// Zero-length countdowns and zero tick intervals are rejected
    #[error("invalid countdown: total={total_ms}ms interval={interval_ms}ms")]
    InvalidDuration { total_ms: u64, interval_ms: u64 },

    /// `start` was requested but no time is retained to resume from
    #[error("nothing to resume: no remaining time is retained")]
    NothingToResume,

    #[error("failed to lock countdown: {0}")]
    LockPoisoned(String),
}
