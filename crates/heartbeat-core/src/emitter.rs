//! The per-connection heartbeat loop.
//!
//! A [`HeartbeatEmitter`] drives one client stream from `Streaming` to
//! `Closed`. Each iteration stamps the current wall-clock time into an
//! event, writes it, flushes it, checks that the client is still there
//! and then waits for the next interval. The wait races the client's
//! disconnect signal and the per-connection deadline, so a dead client
//! is noticed without waiting out the full interval.

use std::fmt;
use std::time::Duration;

use tokio::time::{sleep, sleep_until, timeout_at, Instant};
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::error::ConfigError;
use crate::event::HeartbeatEvent;
use crate::liveness::Liveness;
use crate::sink::EventSink;

/// Default time between two heartbeats.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Default ceiling on the lifetime of a single stream.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(600);

/// Longest ceiling a stream may be configured with.
pub const MAX_STREAM_DURATION: Duration = Duration::from_secs(86_400);

/// Timing parameters for a heartbeat stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Pause between two consecutive events.
    pub interval: Duration,
    /// Hard ceiling on how long one stream may run.
    pub max_duration: Duration,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_duration: DEFAULT_MAX_DURATION,
        }
    }
}

impl EmitterConfig {
    /// Check that both durations are non-zero and the ceiling is no
    /// longer than [`MAX_STREAM_DURATION`].
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.max_duration.is_zero() {
            return Err(ConfigError::ZeroMaxDuration);
        }
        if self.max_duration.as_secs() > MAX_STREAM_DURATION.as_secs() {
            return Err(ConfigError::MaxDurationTooLong {
                secs: self.max_duration.as_secs(),
                limit_secs: MAX_STREAM_DURATION.as_secs(),
            });
        }
        Ok(())
    }

    /// The ceiling actually enforced: the configured one, capped at
    /// [`MAX_STREAM_DURATION`].
    pub fn effective_max_duration(&self) -> Duration {
        self.max_duration.min(MAX_STREAM_DURATION)
    }
}

/// Why a stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The liveness probe reported the client gone.
    ClientDisconnected,
    /// The per-connection ceiling elapsed.
    SafetyTimeoutReached,
    /// Writing or flushing to the sink failed. Treated as a disconnect.
    WriteFailed,
}

impl CloseReason {
    /// Whether this reason means the client is gone.
    pub const fn is_disconnect(self) -> bool {
        matches!(self, Self::ClientDisconnected | Self::WriteFailed)
    }

    /// Short label used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientDisconnected => "client_disconnected",
            Self::SafetyTimeoutReached => "safety_timeout_reached",
            Self::WriteFailed => "write_failed",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a stream. The only transition is `Streaming -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Events are being emitted.
    #[default]
    Streaming,
    /// The stream has ended and will emit nothing further.
    Closed(CloseReason),
}

impl StreamState {
    /// Whether the stream has ended.
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    /// Move to `Closed` and return the reason the stream is closed with.
    /// A stream that is already closed keeps its first reason.
    pub const fn close(&mut self, reason: CloseReason) -> CloseReason {
        match *self {
            Self::Streaming => {
                *self = Self::Closed(reason);
                reason
            }
            Self::Closed(first) => first,
        }
    }
}

/// Outcome of a finished stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Why the stream ended.
    pub reason: CloseReason,
    /// Number of events written and flushed.
    pub events_sent: u64,
    /// Time from the start of the stream to its close.
    pub elapsed: Duration,
}

/// Emits server-time heartbeats to one client.
#[derive(Debug, Clone)]
pub struct HeartbeatEmitter<C> {
    config: EmitterConfig,
    clock: C,
}

impl<C: Clock> HeartbeatEmitter<C> {
    /// Create an emitter with the given timing and wall-clock source.
    pub const fn new(config: EmitterConfig, clock: C) -> Self {
        Self { config, clock }
    }

    /// The timing parameters this emitter runs with.
    pub const fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Stream heartbeats into `sink` until the client goes away, a write
    /// fails, or the ceiling elapses.
    ///
    /// The first event is written immediately. The sink and probe are
    /// dropped when this returns. A ceiling above [`MAX_STREAM_DURATION`]
    /// is capped to it, so every stream ends.
    pub async fn run<S, L>(&self, mut sink: S, liveness: L) -> StreamSummary
    where
        S: EventSink,
        L: Liveness,
    {
        let started = Instant::now();
        let deadline = sleep(self.config.effective_max_duration()).deadline();
        let mut state = StreamState::Streaming;
        let mut events_sent: u64 = 0;

        debug!(
            interval_ms = self.config.interval.as_millis(),
            max_duration_secs = self.config.effective_max_duration().as_secs(),
            "heartbeat stream opened"
        );

        let streaming = self.stream(&mut sink, &liveness, deadline, &mut state, &mut events_sent);
        let outcome = timeout_at(deadline, streaming).await;
        let reason =
            outcome.unwrap_or_else(|_elapsed| state.close(CloseReason::SafetyTimeoutReached));

        let elapsed = started.elapsed();
        debug!(
            %reason,
            events_sent,
            elapsed_ms = elapsed.as_millis(),
            "heartbeat stream closed"
        );

        StreamSummary {
            reason,
            events_sent,
            elapsed,
        }
    }

    /// Run iterations while `state` is `Streaming`. Every exit goes
    /// through [`StreamState::close`].
    async fn stream<S, L>(
        &self,
        sink: &mut S,
        liveness: &L,
        deadline: Instant,
        state: &mut StreamState,
        events_sent: &mut u64,
    ) -> CloseReason
    where
        S: EventSink,
        L: Liveness,
    {
        loop {
            if let StreamState::Closed(reason) = *state {
                return reason;
            }
            if let Some(reason) = self.step(sink, liveness, deadline, events_sent).await {
                state.close(reason);
            }
        }
    }

    /// One iteration: write and flush an event, check the client, then
    /// wait out the interval. Returns the reason to close, if any.
    async fn step<S, L>(
        &self,
        sink: &mut S,
        liveness: &L,
        deadline: Instant,
        events_sent: &mut u64,
    ) -> Option<CloseReason>
    where
        S: EventSink,
        L: Liveness,
    {
        if Instant::now() >= deadline {
            return Some(CloseReason::SafetyTimeoutReached);
        }

        let event = HeartbeatEvent::at(&self.clock.now());
        if let Err(e) = sink.write(event.encode().as_bytes()).await {
            debug!(error = %e, "heartbeat write failed");
            return Some(CloseReason::WriteFailed);
        }
        if let Err(e) = sink.flush().await {
            debug!(error = %e, "heartbeat flush failed");
            return Some(CloseReason::WriteFailed);
        }
        *events_sent = events_sent.saturating_add(1);
        trace!(events_sent = *events_sent, data = event.data(), "heartbeat sent");

        if !liveness.is_alive() {
            return Some(CloseReason::ClientDisconnected);
        }

        tokio::select! {
            biased;
            () = liveness.closed() => Some(CloseReason::ClientDisconnected),
            () = sleep_until(deadline) => Some(CloseReason::SafetyTimeoutReached),
            () = sleep(self.config.interval) => None,
        }
    }
}
