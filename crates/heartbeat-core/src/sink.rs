//! Output side of a heartbeat stream.

use std::future::Future;

use crate::error::SinkError;

/// A writable, flushable byte stream that carries encoded events to the
/// client.
///
/// Implementations may buffer [`write`](Self::write) calls. After
/// [`flush`](Self::flush) returns `Ok`, everything written so far must
/// have been handed to the transport.
pub trait EventSink: Send {
    /// Append encoded bytes to the stream.
    fn write(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Push any buffered bytes to the transport.
    fn flush(&mut self) -> impl Future<Output = Result<(), SinkError>> + Send;
}
