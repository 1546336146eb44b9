//! # pharosd: PHAROS virtual laser daemon
//!
//! Composition root that wires the simulated device to the HTTP adapter and
//! starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (CLI port argument, env vars, config file)
//! - Install the `tracing` subscriber
//! - Construct the event bus and the command dispatcher, then boot the device
//!   to its configured start state through legal transitions
//! - Build the axum router, injecting the dispatcher
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use pharos_adapter_http_axum::state::AppState;
use pharos_app::event_bus::InProcessEventBus;
use pharos_app::services::CommandDispatcher;
use pharos_domain::preset::PresetCatalog;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(config.device.event_capacity));
    spawn_event_logger(&event_bus);

    // Device
    let dispatcher = CommandDispatcher::new(PresetCatalog::default(), Arc::clone(&event_bus));
    let state = dispatcher.boot(config.initial_state()?)?;
    tracing::info!(%state, "device ready");

    // HTTP
    let app = pharos_adapter_http_axum::router::build(AppState::new(dispatcher));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(address = %bind_addr, "pharosd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("pharosd stopped");
    Ok(())
}

/// Log every device event until the bus closes.
fn spawn_event_logger(event_bus: &InProcessEventBus) {
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::debug!(id = %event.id, kind = ?event.kind, "device event"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event logger lagging behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
