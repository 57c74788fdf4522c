//! Core of the heartbeat service: the per-connection emitter that
//! pushes the current server time to a client as Server-Sent Events.
//!
//! This crate knows nothing about HTTP. The hosting layer hands the
//! emitter three capabilities:
//!
//! - a [`Clock`] that yields the wall-clock time stamped into each event
//! - an [`EventSink`] that accepts encoded bytes and can be flushed
//! - a [`Liveness`] probe that reports whether the client is still there
//!
//! # Loop
//!
//! ```text
//! now() --> encode --> write --> flush --> alive? --> sleep(interval) --+
//!   ^                                                                   |
//!   +-------------------------------------------------------------------+
//! ```
//!
//! The loop ends on disconnect, on a failed write, or when the
//! per-connection ceiling elapses. See [`HeartbeatEmitter::run`].

pub mod clock;
pub mod emitter;
pub mod error;
pub mod event;
pub mod liveness;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use emitter::{
    CloseReason, EmitterConfig, HeartbeatEmitter, StreamState, StreamSummary,
    DEFAULT_INTERVAL, DEFAULT_MAX_DURATION, MAX_STREAM_DURATION,
};
pub use error::{ConfigError, EventError, SinkError};
pub use event::{format_timestamp, parse_timestamp, HeartbeatEvent};
pub use liveness::Liveness;
pub use sink::EventSink;
