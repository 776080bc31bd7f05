//! Countdown controller: the start/pause/reset state machine

use std::{fmt, time::Duration};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use super::timer_state::{CountdownEvent, CountdownSnapshot, TimerState, RESUME_INTERVAL_MS};
use crate::{
    error::CountdownError,
    tasks::tick_source::{TickEvent, TickHandle, TickKind, TickSource},
};

/// Owns the countdown state and at most one live tick handle.
///
/// A handle exists exactly while the state is `Running`. Every handle is tagged
/// with a generation; events carrying any other generation are ignored, so a
/// cancelled or replaced countdown can never move the state.
pub struct CountdownController<S: TickSource> {
    source: S,
    handle: Option<S::Handle>,
    generation: u64,
    state: TimerState,
    remaining_ms: u64,
    snapshot_tx: watch::Sender<CountdownSnapshot>,
    events_tx: broadcast::Sender<CountdownEvent>,
}

impl<S: TickSource> fmt::Debug for CountdownController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownController")
            .field("generation", &self.generation)
            .field("state", &self.state)
            .field("remaining_ms", &self.remaining_ms)
            .field("ticking", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: TickSource> CountdownController<S> {
    pub fn new(source: S) -> Self {
        let (snapshot_tx, _) = watch::channel(CountdownSnapshot::default());
        let (events_tx, _) = broadcast::channel(100);

        Self {
            source,
            handle: None,
            generation: 0,
            state: TimerState::New,
            remaining_ms: 0,
            snapshot_tx,
            events_tx,
        }
    }

    /// Start a fresh countdown of `total_ms`, ticking every `interval_ms`.
    /// Any countdown already in progress is cancelled first.
    pub fn create_timer(&mut self, total_ms: u64, interval_ms: u64) -> Result<(), CountdownError> {
        if total_ms == 0 || interval_ms == 0 {
            return Err(CountdownError::InvalidDuration {
                total_ms,
                interval_ms,
            });
        }

        self.cancel_handle();
        self.generation += 1;
        info!(
            "Creating countdown gen={} for {}ms every {}ms",
            self.generation, total_ms, interval_ms
        );

        let mut handle = self.source.create(
            self.generation,
            Duration::from_millis(total_ms),
            Duration::from_millis(interval_ms),
        );
        self.set_remaining(total_ms);
        handle.start();
        self.handle = Some(handle);
        self.set_state(TimerState::Running);
        Ok(())
    }

    /// Resume from the retained time, or keep an already live countdown going
    pub fn start_timer(&mut self) -> Result<(), CountdownError> {
        match self.handle.as_mut() {
            Some(handle) => handle.start(),
            None => {
                if self.remaining_ms == 0 {
                    return Err(CountdownError::NothingToResume);
                }
                debug!("Resuming countdown from {}ms", self.remaining_ms);
                self.create_timer(self.remaining_ms, RESUME_INTERVAL_MS)?;
            }
        }
        self.set_state(TimerState::Running);
        Ok(())
    }

    /// Stop ticking but keep the remaining time
    pub fn pause_timer(&mut self) {
        self.cancel_handle();
        self.set_state(TimerState::Paused);
    }

    /// Stop ticking and forget the remaining time
    pub fn reset_timer(&mut self) {
        self.cancel_handle();
        self.set_remaining(0);
        self.set_state(TimerState::New);
    }

    /// Apply an event delivered by the tick source.
    /// Returns false when the event was stale and ignored.
    pub fn handle_event(&mut self, event: TickEvent) -> bool {
        match event.kind {
            TickKind::Tick { remaining_ms } => self.on_tick(event.generation, remaining_ms),
            TickKind::Finished => self.on_finish(event.generation),
        }
    }

    pub fn on_tick(&mut self, generation: u64, remaining_ms: u64) -> bool {
        if !self.is_current(generation) {
            debug!("Ignoring stale tick gen={} (current gen={})", generation, self.generation);
            return false;
        }
        // remaining time only ever decreases within one countdown
        self.set_remaining(remaining_ms.min(self.remaining_ms));
        true
    }

    pub fn on_finish(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            debug!("Ignoring stale finish gen={} (current gen={})", generation, self.generation);
            return false;
        }
        self.handle = None;
        self.set_remaining(0);
        info!("Countdown gen={} reached zero, liftoff", generation);
        self.set_state(TimerState::Launch);
        true
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Displayed whole seconds
    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_ms / 1000
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ticking(&self) -> bool {
        self.handle.is_some()
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot::new(self.state, self.remaining_ms)
    }

    /// Receiver of the latest snapshot, updated on state changes and
    /// whenever the displayed seconds change
    pub fn watch(&self) -> watch::Receiver<CountdownSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Receiver of state-changed and time-changed events
    pub fn subscribe(&self) -> broadcast::Receiver<CountdownEvent> {
        self.events_tx.subscribe()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && generation == self.generation
    }

    fn cancel_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.cancel();
        }
    }

    fn set_state(&mut self, state: TimerState) {
        if self.state == state {
            return;
        }
        debug!("Countdown state {} -> {}", self.state, state);
        self.state = state;
        self.publish_snapshot();
        // no subscribers is fine
        let _ = self.events_tx.send(CountdownEvent::StateChanged { state });
    }

    /// Observers are only woken when the displayed seconds change
    fn set_remaining(&mut self, remaining_ms: u64) {
        let previous_seconds = self.remaining_seconds();
        self.remaining_ms = remaining_ms;

        let remaining_seconds = self.remaining_seconds();
        if remaining_seconds != previous_seconds {
            self.publish_snapshot();
            let _ = self
                .events_tx
                .send(CountdownEvent::TimeChanged { remaining_seconds });
        }
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
