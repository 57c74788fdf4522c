//! Shared application state for the heartbeat server.
//!
//! Streams share nothing but the timing config, the clock, a pair of
//! counters used for stream IDs and the health endpoint, and the server's
//! shutdown flag.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use heartbeat_core::{Clock, EmitterConfig, HeartbeatEmitter, SystemClock};
use tokio::sync::watch;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Timing of every stream opened by this server.
    pub emitter_config: EmitterConfig,
    /// Wall-clock source stamped into events.
    clock: Arc<dyn Clock>,
    /// Number of streams currently running.
    active_streams: Arc<AtomicUsize>,
    /// Monotonic ID handed to each new stream for log correlation.
    next_stream_id: AtomicU64,
    /// Flipped to `true` once the server begins shutting down.
    shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Create state that stamps events with the host's local time.
    pub fn new(emitter_config: EmitterConfig) -> Self {
        Self::with_clock(emitter_config, Arc::new(SystemClock))
    }

    /// Create state with a custom wall-clock source.
    pub fn with_clock(emitter_config: EmitterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            emitter_config,
            clock,
            active_streams: Arc::new(AtomicUsize::new(0)),
            next_stream_id: AtomicU64::new(1),
            shutdown: watch::Sender::new(false),
        }
    }

    /// Build an emitter for a new stream.
    pub fn emitter(&self) -> HeartbeatEmitter<Arc<dyn Clock>> {
        HeartbeatEmitter::new(self.emitter_config, Arc::clone(&self.clock))
    }

    /// Register a new stream. The stream counts as active until the
    /// returned guard is dropped.
    pub fn open_stream(&self) -> StreamGuard {
        let id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        self.active_streams.fetch_add(1, Ordering::Relaxed);
        StreamGuard {
            id,
            active: Arc::clone(&self.active_streams),
        }
    }

    /// Number of streams currently running.
    pub fn active_streams(&self) -> usize {
        self.active_streams.load(Ordering::Relaxed)
    }

    /// Tell every running stream to stop.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`begin_shutdown`](Self::begin_shutdown) has been called.
    pub async fn shutdown_requested(&self) {
        let mut rx = self.shutdown.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}

/// Keeps a stream counted as active for as long as it lives.
#[derive(Debug)]
pub struct StreamGuard {
    id: u64,
    active: Arc<AtomicUsize>,
}

impl StreamGuard {
    /// The ID assigned to this stream.
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}
