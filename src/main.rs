//! Liftoff - a countdown-to-liftoff timer service
//!
//! This is the main entry point for the liftoff application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use liftoff::{
    api::create_router,
    config::Config,
    state::{AppState, LAUNCH_DURATION_MS},
    tasks::tick_dispatch_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("liftoff={},tower_http=info", config.log_level()))
        .init();

    info!("Starting liftoff server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, countdown={}s",
          config.host, config.port, LAUNCH_DURATION_MS / 1000);

    // Create application state and the channel its tick source reports on
    let (state, tick_rx) = AppState::new(config.port, config.host.clone());
    let state = Arc::new(state);

    // Start the tick dispatch background task
    let dispatch_state = Arc::clone(&state);
    tokio::spawn(async move {
        tick_dispatch_task(dispatch_state, tick_rx).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /launch - Start the liftoff countdown");
    info!("  POST /pause  - Pause the countdown");
    info!("  POST /start  - Resume a paused countdown");
    info!("  POST /reset  - Reset the countdown");
    info!("  GET  /status - Current countdown and server status");
    info!("  GET  /events - Countdown changes as server-sent events");
    info!("  GET  /health - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
