//! Error types for the heartbeat core.

/// Errors raised when constructing an SSE event payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// The payload was empty.
    #[error("event data must not be empty")]
    Empty,

    /// The payload contained a line break, which would split or terminate
    /// the `data:` field on the wire.
    #[error("event data must be a single line")]
    EmbeddedNewline,
}

/// Errors raised by an [`EventSink`](crate::sink::EventSink).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The receiving side of the stream has gone away.
    #[error("sink closed")]
    Closed,

    /// The flushed bytes were not one encoded event.
    #[error("flushed bytes are not a single event")]
    Malformed,
}

/// Errors raised when validating an [`EmitterConfig`](crate::emitter::EmitterConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The event interval was zero.
    #[error("event interval must be greater than zero")]
    ZeroInterval,

    /// The per-connection ceiling was zero.
    #[error("maximum stream duration must be greater than zero")]
    ZeroMaxDuration,

    /// The per-connection ceiling exceeded the allowed maximum.
    #[error("maximum stream duration of {secs}s exceeds the limit of {limit_secs}s")]
    MaxDurationTooLong {
        /// The configured ceiling in seconds.
        secs: u64,
        /// The largest accepted ceiling in seconds.
        limit_secs: u64,
    },
}
