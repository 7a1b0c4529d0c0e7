#![allow(clippy::unwrap_used)]
// Lifecycle tests for `RequestStream` against a local WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use mwdns_api::{
    Error, RawRequestEvent, ReconnectConfig, RequestStream, StreamState, TlsMode, TransportConfig,
};

const DELAY: Duration = Duration::from_millis(100);

// ── Helpers ─────────────────────────────────────────────────────────

fn event_json(src_host: &str) -> String {
    serde_json::json!({
        "created_at": 1_700_000_000,
        "request": "{\"Question\":[{\"Name\":\"example.messwithdns.com.\",\"Qtype\":1,\"Qclass\":1}]}",
        "response": "{\"Rcode\":0}",
        "src_ip": "127.0.0.1",
        "src_host": src_host
    })
    .to_string()
}

/// Serve `/requeststream`. The first connection sends A, a keepalive and
/// B, then closes. Every later connection stays open until the client
/// goes away. Returns the address and a connection counter.
async fn spawn_server() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let nth = counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
                if nth == 0 {
                    ws.send(Message::text(event_json("a.example"))).await.unwrap();
                    ws.send(Message::text("ping")).await.unwrap();
                    ws.send(Message::text(event_json("b.example"))).await.unwrap();
                    let _ = ws.close(None).await;
                } else {
                    while let Some(Ok(_)) = ws.next().await {}
                }
            });
        }
    });

    (addr, connections)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

async fn recv(rx: &mut tokio::sync::mpsc::UnboundedReceiver<RawRequestEvent>) -> RawRequestEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn keepalive_is_dropped_and_one_reconnect_follows_close() {
    let (addr, connections) = spawn_server().await;
    let url = Url::parse(&format!("ws://{addr}/requeststream")).unwrap();

    let (stream, mut events) = RequestStream::spawn(
        url,
        ReconnectConfig { delay: DELAY },
        CancellationToken::new(),
        &TransportConfig::default(),
    )
    .unwrap();

    // Newest first, the way the request log keeps them.
    let mut log: Vec<RawRequestEvent> = Vec::new();
    log.insert(0, recv(&mut events).await);
    log.insert(0, recv(&mut events).await);

    let hosts: Vec<&str> = log.iter().map(|e| e.src_host.as_str()).collect();
    assert_eq!(hosts, vec!["b.example", "a.example"]);

    wait_until(|| connections.load(Ordering::SeqCst) == 2 && stream.is_open()).await;

    // The second connection stays open: no further attempts.
    tokio::time::sleep(DELAY * 3).await;
    assert_eq!(connections.load(Ordering::SeqCst), 2);
    assert!(events.try_recv().is_err(), "keepalive must not produce an event");

    stream.shutdown();
}

#[tokio::test]
async fn shutdown_is_terminal() {
    let (addr, connections) = spawn_server().await;
    let url = Url::parse(&format!("ws://{addr}/requeststream")).unwrap();

    let (stream, mut events) = RequestStream::spawn(
        url,
        ReconnectConfig { delay: DELAY },
        CancellationToken::new(),
        &TransportConfig::default(),
    )
    .unwrap();
    let _ = recv(&mut events).await;
    let _ = recv(&mut events).await;
    wait_until(|| connections.load(Ordering::SeqCst) == 2 && stream.is_open()).await;

    stream.shutdown();

    let mut state = stream.subscribe_state();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == StreamState::UserClosed),
    )
    .await
    .unwrap()
    .unwrap();

    tokio::time::sleep(DELAY * 3).await;
    assert_eq!(connections.load(Ordering::SeqCst), 2);
    assert_eq!(stream.state(), StreamState::UserClosed);
}

#[tokio::test]
async fn unreachable_server_keeps_retrying_without_opening() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let url = Url::parse(&format!("ws://{addr}/requeststream")).unwrap();

    let (stream, _events) = RequestStream::spawn(
        url,
        ReconnectConfig { delay: DELAY },
        CancellationToken::new(),
        &TransportConfig::default(),
    )
    .unwrap();

    let mut state = stream.subscribe_state();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == StreamState::Closed),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(!stream.is_open());

    stream.shutdown();
}

#[tokio::test]
async fn wss_with_unreadable_ca_fails_before_connecting() {
    let url = Url::parse("wss://127.0.0.1:9/requeststream").unwrap();
    let transport = TransportConfig {
        tls: TlsMode::CustomCa("/nonexistent/mwdns-ca.pem".into()),
        ..TransportConfig::default()
    };

    let result = RequestStream::spawn(
        url,
        ReconnectConfig { delay: DELAY },
        CancellationToken::new(),
        &transport,
    );
    assert!(matches!(result, Err(Error::Tls(_))));
}

#[tokio::test]
async fn plain_ws_ignores_tls_settings() {
    let (addr, connections) = spawn_server().await;
    let url = Url::parse(&format!("ws://{addr}/requeststream")).unwrap();
    let transport = TransportConfig {
        tls: TlsMode::CustomCa("/nonexistent/mwdns-ca.pem".into()),
        ..TransportConfig::default()
    };

    let (stream, mut events) = RequestStream::spawn(
        url,
        ReconnectConfig { delay: DELAY },
        CancellationToken::new(),
        &transport,
    )
    .unwrap();
    let _ = recv(&mut events).await;
    assert!(connections.load(Ordering::SeqCst) >= 1);

    stream.shutdown();
}
