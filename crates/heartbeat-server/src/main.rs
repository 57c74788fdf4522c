//! Heartbeat server entry point.
//!
//! Streams the current server time to every client of `GET /events` as
//! Server-Sent Events, one event per interval, until the client leaves
//! or the per-connection ceiling elapses.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from environment variables
//! 2. Initialize structured logging (tracing)
//! 3. Bind and serve until `Ctrl-C`

use std::sync::Arc;

use heartbeat_server::config::LogFormat;
use heartbeat_server::{start_server, AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server cannot
/// bind or serve.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    init_tracing(config.log_format);

    info!("heartbeat-server starting");
    info!(
        bind = %config.bind_address(),
        interval_ms = config.emitter.interval.as_millis(),
        max_duration_secs = config.emitter.max_duration.as_secs(),
        "configuration loaded"
    );

    let state = Arc::new(AppState::new(config.emitter));
    start_server(&config, state).await?;

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` picks the filter.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if format == LogFormat::Json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
