//! HTTP endpoint handlers for the heartbeat server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Demo page that subscribes to `/events` |
//! | `GET` | `/events` | Server-time heartbeat stream (SSE) |
//! | `GET` | `/health` | Liveness and open-stream count |

use std::sync::Arc;

use axum::extract::State;
use axum::http::Uri;
use axum::response::{Html, IntoResponse};
use axum::Json;
use tracing::{info, info_span, Instrument};

use crate::error::ApiError;
use crate::state::AppState;
use crate::stream;

// ---------------------------------------------------------------------------
// GET / -- demo page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page that opens an `EventSource` on `/events` and
/// appends every message it receives.
pub async fn index() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Heartbeat</title>
    <style>
        body {
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
        }
        h1 { color: #58a6ff; }
        #status { color: #8b949e; }
        li { padding: 0.2rem 0; }
    </style>
</head>
<body>
    <h1>Heartbeat</h1>
    <p id="status">connecting...</p>
    <ul id="events"></ul>
    <script>
        const status = document.getElementById('status');
        const list = document.getElementById('events');
        const source = new EventSource('/events');
        source.onopen = () => { status.textContent = 'connected'; };
        source.onerror = () => { status.textContent = 'disconnected'; };
        source.onmessage = (e) => {
            const item = document.createElement('li');
            item.textContent = e.data;
            list.prepend(item);
        };
    </script>
</body>
</html>"#,
    )
}

// ---------------------------------------------------------------------------
// GET /events -- heartbeat stream
// ---------------------------------------------------------------------------

/// Open a heartbeat stream for this client.
///
/// The emitter runs on its own task and feeds an [`Sse`](axum::response::sse::Sse)
/// response, which carries `Content-Type: text/event-stream` and
/// `Cache-Control: no-cache` ahead of the first event. Server shutdown
/// cancels the task, which ends the body.
///
/// # Route
///
/// `GET /events`
pub async fn events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (sink, liveness, sse) = stream::channel();
    let guard = state.open_stream();
    let emitter = state.emitter();
    let span = info_span!("heartbeat_stream", stream_id = guard.id());

    tokio::spawn(
        async move {
            info!("client connected");
            tokio::select! {
                summary = emitter.run(sink, liveness) => {
                    info!(
                        reason = %summary.reason,
                        events_sent = summary.events_sent,
                        elapsed_ms = summary.elapsed.as_millis(),
                        "stream ended"
                    );
                }
                () = state.shutdown_requested() => {
                    info!("stream cancelled by server shutdown");
                }
            }
            drop(guard);
        }
        .instrument(span),
    );

    sse
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Response body of `GET /health`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the server is answering.
    pub status: String,
    /// Streams currently running.
    pub active_streams: usize,
    /// Configured time between events.
    pub interval_ms: u64,
    /// Configured per-connection ceiling.
    pub max_duration_secs: u64,
}

/// Report server liveness and the number of open streams.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
        active_streams: state.active_streams(),
        interval_ms: u64::try_from(state.emitter_config.interval.as_millis())
            .unwrap_or(u64::MAX),
        max_duration_secs: state.emitter_config.max_duration.as_secs(),
    })
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// JSON 404 for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_owned())
}
