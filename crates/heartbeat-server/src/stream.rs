//! Bridges a heartbeat emitter to an SSE response.
//!
//! [`channel`] returns a sink, a liveness probe, and an [`Sse`] response
//! that all share one bounded `mpsc` channel. The sink buffers writes and
//! turns each flush into a single [`Event`], which axum sends as one body
//! frame. Hyper drops the response body when the client disconnects,
//! which closes the channel and trips the probe.

use std::convert::Infallible;
use std::future::Future;

use axum::response::sse::{Event, Sse};
use bytes::BytesMut;
use futures::Stream;
use heartbeat_core::{EventSink, HeartbeatEvent, Liveness, SinkError};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// Events buffered between the emitter and the connection.
const CHANNEL_CAPACITY: usize = 8;

/// Create a connected sink, liveness probe, and SSE response.
pub fn channel() -> (
    ChannelSink,
    ChannelLiveness,
    Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static>,
) {
    let (tx, rx) = mpsc::channel::<Event>(CHANNEL_CAPACITY);
    let events = ReceiverStream::new(rx).map(Ok::<_, Infallible>);

    (
        ChannelSink {
            tx: tx.clone(),
            buf: BytesMut::new(),
        },
        ChannelLiveness { tx },
        Sse::new(events),
    )
}

/// [`EventSink`] that delivers each flush as one SSE event.
///
/// A flush must carry exactly one encoded event. Anything else fails
/// with [`SinkError::Malformed`].
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<Event>,
    buf: BytesMut,
}

impl EventSink for ChannelSink {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        if self.tx.is_closed() {
            return Err(SinkError::Closed);
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = self.buf.split().freeze();
        let event = std::str::from_utf8(&chunk)
            .ok()
            .and_then(HeartbeatEvent::decode)
            .ok_or(SinkError::Malformed)?;

        self.tx
            .send(Event::default().data(event.data()))
            .await
            .map_err(|_closed| SinkError::Closed)
    }
}

/// [`Liveness`] probe that reports the response's receiver as the client.
#[derive(Debug, Clone)]
pub struct ChannelLiveness {
    tx: mpsc::Sender<Event>,
}

impl Liveness for ChannelLiveness {
    fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    fn closed(&self) -> impl Future<Output = ()> + Send {
        let tx = self.tx.clone();
        async move { tx.closed().await }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::response::IntoResponse;

    use super::*;

    #[tokio::test]
    async fn flush_sends_buffered_writes_as_one_frame() {
        let (mut sink, liveness, sse) = channel();
        let response = sse.into_response();
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );
        assert_eq!(response.headers().get("cache-control").unwrap(), "no-cache");
        let mut frames = response.into_body().into_data_stream();

        sink.write(b"data: a").await.unwrap();
        sink.write(b"\n\n").await.unwrap();
        sink.flush().await.unwrap();

        let frame = frames.next().await.unwrap().unwrap();
        assert_eq!(&frame[..], b"data: a\n\n");
        assert!(liveness.is_alive());
    }

    #[tokio::test]
    async fn empty_flush_sends_nothing() {
        let (mut sink, liveness, sse) = channel();
        sink.flush().await.unwrap();
        drop(sink);
        drop(liveness);

        let mut frames = sse.into_response().into_body().into_data_stream();
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn flush_of_partial_event_is_rejected() {
        let (mut sink, _liveness, _sse) = channel();
        sink.write(b"data: no terminator").await.unwrap();
        assert_eq!(sink.flush().await, Err(SinkError::Malformed));
    }

    #[tokio::test]
    async fn dropping_response_closes_sink_and_probe() {
        let (mut sink, liveness, sse) = channel();
        drop(sse);

        assert!(!liveness.is_alive());
        liveness.closed().await;
        assert_eq!(sink.write(b"data: x\n\n").await, Err(SinkError::Closed));
    }
}
