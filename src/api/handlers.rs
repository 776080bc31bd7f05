//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::{
    error::CountdownError,
    state::{AppState, CountdownSnapshot},
};
use super::responses::{ApiResponse, HealthResponse, StatusResponse};

type ActionResult = Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)>;

/// Map a countdown error to its HTTP status
fn error_status(error: &CountdownError) -> StatusCode {
    match error {
        CountdownError::InvalidDuration { .. } => StatusCode::BAD_REQUEST,
        CountdownError::NothingToResume => StatusCode::CONFLICT,
        CountdownError::LockPoisoned(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turn the outcome of a countdown action into a response
fn respond(
    state: &AppState,
    action: &str,
    message: &str,
    result: Result<CountdownSnapshot, CountdownError>,
) -> ActionResult {
    match result {
        Ok(snapshot) => {
            info!("{} endpoint called - countdown {}", action, snapshot.state);
            Ok(Json(ApiResponse::ok(message.to_string(), snapshot)))
        }
        Err(e) => {
            let status = error_status(&e);
            if status.is_server_error() {
                error!("Failed to {} countdown: {}", action, e);
            } else {
                warn!("Rejected {} request: {}", action, e);
            }
            let snapshot = state.snapshot().unwrap_or_default();
            Err((status, Json(ApiResponse::error(e.to_string(), snapshot))))
        }
    }
}

/// Handle POST /launch - Start the liftoff countdown from the top
pub async fn launch_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    respond(&state, "launch", "Liftoff countdown started", state.launch())
}

/// Handle POST /start - Resume a paused countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    respond(&state, "start", "Countdown resumed", state.start())
}

/// Handle POST /pause - Pause the countdown, keeping the remaining time
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    respond(&state, "pause", "Countdown paused", state.pause())
}

/// Handle POST /reset - Stop the countdown and clear it
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    respond(&state, "reset", "Countdown reset", state.reset())
}

/// Handle GET /status - Return the countdown and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let countdown = match state.snapshot() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to get countdown snapshot: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        countdown,
        available_action: countdown.state.available_action(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /events - Stream countdown changes as server-sent events.
/// The first event is the current snapshot.
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    // subscribe before reading the snapshot so no change falls in between
    let (rx, snapshot) = match (state.subscribe(), state.snapshot()) {
        (Ok(rx), Ok(snapshot)) => (rx, snapshot),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to subscribe to countdown: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let initial = stream::once(async move { sse_event("snapshot", &snapshot) });
    let changes = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((sse_event(event.name(), &event), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(initial.chain(changes).map(Ok::<_, Infallible>)).keep_alive(KeepAlive::default()))
}

fn sse_event<T: serde::Serialize>(name: &str, data: &T) -> Event {
    let event = Event::default().event(name);
    match serde_json::to_string(data) {
        Ok(json) => event.data(json),
        Err(e) => {
            error!("Failed to serialize {} event: {}", name, e);
            event.comment("serialization failed")
        }
    }
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
