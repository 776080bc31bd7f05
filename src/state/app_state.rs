//! Main application state management

use std::{
    sync::{Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use super::{
    controller::CountdownController,
    timer_state::{CountdownEvent, CountdownSnapshot, LAUNCH_DURATION_MS, LAUNCH_INTERVAL_MS},
};
use crate::{
    error::CountdownError,
    tasks::tick_source::{TickEvent, TokioTickSource},
};

/// Shared application state: the countdown plus server metadata
#[derive(Debug)]
pub struct AppState {
    /// The countdown; never locked across an await
    pub countdown: Mutex<CountdownController<TokioTickSource>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Create the state together with the receiver the tick dispatch task drains
    pub fn new(port: u16, host: String) -> (Self, mpsc::UnboundedReceiver<TickEvent>) {
        let (source, tick_rx) = TokioTickSource::channel();

        let state = Self {
            countdown: Mutex::new(CountdownController::new(source)),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        };
        (state, tick_rx)
    }

    fn lock_countdown(&self) -> Result<MutexGuard<'_, CountdownController<TokioTickSource>>, CountdownError> {
        self.countdown
            .lock()
            .map_err(|e| CountdownError::LockPoisoned(e.to_string()))
    }

    /// Run a countdown operation and record it as the last action
    fn apply<F>(&self, action: &str, op: F) -> Result<CountdownSnapshot, CountdownError>
    where
        F: FnOnce(&mut CountdownController<TokioTickSource>) -> Result<(), CountdownError>,
    {
        let mut countdown = self.lock_countdown()?;
        op(&mut *countdown)?;
        let snapshot = countdown.snapshot();
        drop(countdown); // Release the lock early

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        info!("Action '{}' -> state={} remaining={}s", action, snapshot.state, snapshot.remaining_seconds);
        Ok(snapshot)
    }

    /// Start the hard-coded liftoff countdown
    pub fn launch(&self) -> Result<CountdownSnapshot, CountdownError> {
        self.apply("launch", |c| c.create_timer(LAUNCH_DURATION_MS, LAUNCH_INTERVAL_MS))
    }

    pub fn start(&self) -> Result<CountdownSnapshot, CountdownError> {
        self.apply("start", |c| c.start_timer())
    }

    pub fn pause(&self) -> Result<CountdownSnapshot, CountdownError> {
        self.apply("pause", |c| {
            c.pause_timer();
            Ok(())
        })
    }

    pub fn reset(&self) -> Result<CountdownSnapshot, CountdownError> {
        self.apply("reset", |c| {
            c.reset_timer();
            Ok(())
        })
    }

    /// Feed one tick source event to the countdown.
    /// Returns whether the event was applied.
    pub fn apply_tick_event(&self, event: TickEvent) -> Result<bool, CountdownError> {
        let applied = self.lock_countdown()?.handle_event(event);
        if !applied {
            debug!("Dropped stale tick event {:?}", event);
        }
        Ok(applied)
    }

    /// Get current countdown snapshot
    pub fn snapshot(&self) -> Result<CountdownSnapshot, CountdownError> {
        Ok(self.lock_countdown()?.snapshot())
    }

    pub fn subscribe(&self) -> Result<broadcast::Receiver<CountdownEvent>, CountdownError> {
        Ok(self.lock_countdown()?.subscribe())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
