//! HTTP host for the heartbeat stream.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **SSE endpoint** (`/events`) that pushes the current server time to
//!   each client every interval until it disconnects or the
//!   per-connection ceiling elapses
//! - **Health endpoint** (`/health`) reporting the number of open streams
//! - **Demo page** (`GET /`) that subscribes to `/events` with an
//!   `EventSource` and prints every message
//!
//! # Architecture
//!
//! Every `/events` request spawns its own Tokio task running a
//! [`HeartbeatEmitter`](heartbeat_core::HeartbeatEmitter). The task writes
//! into a bounded channel whose receiving end is the response body. When
//! the client goes away Hyper drops the body, the channel closes, and the
//! emitter sees the disconnect through its liveness probe.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod stream;

// Re-export primary types for convenience.
pub use config::ServerConfig;
pub use error::{ApiError, ConfigError, ServerError};
pub use router::build_router;
pub use server::{serve, start_server};
pub use state::AppState;
