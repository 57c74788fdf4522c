//! End-to-end tests over a real TCP socket.
//!
//! These cover what the in-process router tests cannot: that a client
//! hanging up is noticed by the server, and that shutdown does not wait
//! for open streams to reach their ceiling.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use heartbeat_core::EmitterConfig;
use heartbeat_server::serve;
use heartbeat_server::state::AppState;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const REQUEST: &[u8] =
    b"GET /events HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n";

struct Running {
    addr: std::net::SocketAddr,
    state: Arc<AppState>,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

async fn start(config: EmitterConfig) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(config));
    let (stop, stopped) = oneshot::channel::<()>();

    let handle = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            serve(listener, state, async move {
                let _ = stopped.await;
            })
            .await
            .unwrap();
        })
    };

    Running {
        addr,
        state,
        stop,
        handle,
    }
}

/// Open `/events` and read until the first complete event has arrived.
/// Returns the socket and everything read so far.
async fn open_stream(addr: std::net::SocketAddr) -> (TcpStream, String) {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(REQUEST).await.unwrap();

    let mut received = Vec::new();
    let mut buf = [0_u8; 1024];
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "server closed the connection early");
            received.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&received);
            if let Some(start) = text.find("data: ") {
                if text[start..].contains("\n\n") {
                    break;
                }
            }
        }
    })
    .await
    .unwrap();

    (socket, String::from_utf8_lossy(&received).into_owned())
}

async fn wait_for_streams(state: &AppState, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.active_streams() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_headers_precede_first_event() {
    let server = start(EmitterConfig::default()).await;
    let (_socket, received) = open_stream(server.addr).await;

    let (head, body) = received.split_once("\r\n\r\n").unwrap();
    let head = head.to_ascii_lowercase();
    assert!(head.starts_with("http/1.1 200"));
    assert!(head.contains("content-type: text/event-stream"));
    assert!(head.contains("cache-control: no-cache"));
    assert!(body.contains("data: The server time is: "));

    server.stop.send(()).unwrap();
    server.handle.await.unwrap();
}

#[tokio::test]
async fn test_client_hangup_stops_emitter() {
    let config = EmitterConfig {
        interval: Duration::from_millis(100),
        max_duration: Duration::from_secs(600),
    };
    let server = start(config).await;

    let (socket, _) = open_stream(server.addr).await;
    assert_eq!(server.state.active_streams(), 1);

    drop(socket);
    wait_for_streams(&server.state, 0).await;

    server.stop.send(()).unwrap();
    server.handle.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_cancels_open_streams() {
    let server = start(EmitterConfig::default()).await;
    let (_socket, _) = open_stream(server.addr).await;
    assert_eq!(server.state.active_streams(), 1);

    server.stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .unwrap()
        .unwrap();
    wait_for_streams(&server.state, 0).await;
}
