//! Tick dispatch background task

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
    state::AppState,
    tasks::tick_source::{TickEvent, TickKind},
};

/// Background task applying tick source events to the countdown, one at a time
pub async fn tick_dispatch_task(state: Arc<AppState>, mut tick_rx: mpsc::UnboundedReceiver<TickEvent>) {
    info!("Starting tick dispatch task");

    while let Some(event) = tick_rx.recv().await {
        match state.apply_tick_event(event) {
            Ok(true) => {
                if event.kind == TickKind::Finished {
                    info!("Liftoff! countdown gen={} complete", event.generation);
                } else {
                    debug!("Applied {:?}", event);
                }
            }
            Ok(false) => {}
            Err(e) => {
                error!("Failed to apply tick event: {}", e);
            }
        }
    }

    info!("Tick channel closed, dispatch task exiting");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::{CountdownEvent, TimerState};

    fn spawn_app() -> Arc<AppState> {
        let (state, tick_rx) = AppState::new(20554, "127.0.0.1".to_string());
        let state = Arc::new(state);
        tokio::spawn(tick_dispatch_task(Arc::clone(&state), tick_rx));
        state
    }

    #[tokio::test(start_paused = true)]
    async fn launch_counts_down_to_liftoff() {
        let state = spawn_app();
        let mut events = state.subscribe().unwrap();

        state.launch().unwrap();
        tokio::time::sleep(Duration::from_millis(4_500)).await;
        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.state, TimerState::Running);
        assert_eq!(snapshot.remaining_seconds, 6);

        tokio::time::sleep(Duration::from_secs(6)).await;
        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.state, TimerState::Launch);
        assert_eq!(snapshot.remaining_seconds, 0);

        let mut seconds = Vec::new();
        let mut last_state = None;
        while let Ok(event) = events.try_recv() {
            match event {
                CountdownEvent::TimeChanged { remaining_seconds } => seconds.push(remaining_seconds),
                CountdownEvent::StateChanged { state } => last_state = Some(state),
            }
        }
        assert_eq!(seconds, (0..=10).rev().collect::<Vec<_>>());
        assert_eq!(last_state, Some(TimerState::Launch));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_keeps_remaining_time() {
        let state = spawn_app();

        state.launch().unwrap();
        tokio::time::sleep(Duration::from_millis(7_500)).await;
        let paused = state.pause().unwrap();
        assert_eq!(paused.state, TimerState::Paused);
        assert_eq!(paused.remaining_seconds, 3);

        // nothing moves while paused
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(state.snapshot().unwrap(), paused);

        let resumed = state.start().unwrap();
        assert_eq!(resumed.state, TimerState::Running);
        assert_eq!(resumed.remaining_ms, paused.remaining_ms);

        tokio::time::sleep(Duration::from_millis(paused.remaining_ms + 100)).await;
        assert_eq!(state.snapshot().unwrap().state, TimerState::Launch);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_the_countdown() {
        let state = spawn_app();

        state.launch().unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        state.reset().unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.state, TimerState::New);
        assert_eq!(snapshot.remaining_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn relaunch_replaces_running_countdown() {
        let state = spawn_app();

        state.launch().unwrap();
        tokio::time::sleep(Duration::from_millis(8_500)).await;
        let snapshot = state.launch().unwrap();
        assert_eq!(snapshot.remaining_seconds, 10);

        // the first countdown would have finished here
        tokio::time::sleep(Duration::from_millis(3_200)).await;
        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.state, TimerState::Running);
        assert_eq!(snapshot.remaining_seconds, 7);
    }
}
