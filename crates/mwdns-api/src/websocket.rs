//! Live request stream with auto-reconnect.
//!
//! Connects to the backend's `/requeststream` endpoint and forwards every
//! request event, in arrival order, through an unbounded channel. The
//! literal `"ping"` keepalive frame is dropped before it reaches the
//! channel. On close or transport error the loop waits a fixed delay and
//! reconnects; only [`RequestStream::shutdown`] ends it for good.
//!
//! # Example
//!
//! ```rust,ignore
//! use mwdns_api::TransportConfig;
//! use mwdns_api::websocket::{ReconnectConfig, RequestStream, stream_url};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = stream_url(&"https://messwithdns.net".parse()?, Some("orange-tiger"))?;
//! let (stream, mut events) = RequestStream::spawn(
//!     url,
//!     ReconnectConfig::default(),
//!     CancellationToken::new(),
//!     &TransportConfig::default(),
//! )?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{} asked from {}", event.src_ip, event.src_host);
//! }
//!
//! stream.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::Connector;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::models::RawRequestEvent;
use crate::transport::TransportConfig;

/// Keepalive frame sent by the backend. Carries no event.
pub const KEEPALIVE: &str = "ping";

// ── StreamState ──────────────────────────────────────────────────────

/// Lifecycle of the request stream.
///
/// `Connecting -> Open -> Closed -> Connecting -> ...` until the caller
/// shuts the stream down, which lands in the terminal `UserClosed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No stream has been started.
    Idle,
    Connecting,
    Open,
    /// Disconnected with a reconnect pending.
    Closed,
    /// Shut down by the caller. No reconnect will follow.
    UserClosed,
}

impl StreamState {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Fixed-delay reconnection settings.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay between a close and the next connection attempt. Default: 1s.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
        }
    }
}

// ── RequestStream ────────────────────────────────────────────────────

/// Handle to a running request stream.
///
/// Holds the state receiver and the cancellation token of the background
/// task. Dropping the event receiver also stops the task.
pub struct RequestStream {
    state: watch::Receiver<StreamState>,
    cancel: CancellationToken,
}

impl RequestStream {
    /// Spawn the reconnection loop and return the handle plus the event
    /// receiver. The first connection attempt happens asynchronously.
    ///
    /// The identity from `transport` is sent as the `Cookie` header on the
    /// upgrade request. For `wss` URLs its TLS mode applies to the
    /// handshake; an unreadable CA file fails here, before any attempt.
    pub fn spawn(
        url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        transport: &TransportConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RawRequestEvent>), Error> {
        let link = Link {
            tls: if url.scheme() == "wss" {
                Some(transport.build_rustls_config()?)
            } else {
                None
            },
            cookie: transport.cookie_header(),
            url,
        };
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(StreamState::Connecting);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            stream_loop(link, event_tx, state_tx, reconnect, task_cancel).await;
        });

        Ok((Self { state, cancel }, event_rx))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Close the stream and suppress any further reconnect.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Build the stream URL from the HTTP base URL.
///
/// `http` maps to `ws`, `https` to `wss`. With an identity the path is
/// `/requeststream/{identity}`.
pub fn stream_url(base_url: &Url, identity: Option<&str>) -> Result<Url, Error> {
    let scheme = if base_url.scheme() == "https" {
        "wss"
    } else {
        "ws"
    };
    let host = base_url
        .host_str()
        .ok_or_else(|| Error::WebSocketConnect(format!("no host in {base_url}")))?;
    let prefix = base_url.path().trim_end_matches('/');
    let path = match identity {
        Some(id) => format!("{prefix}/requeststream/{id}"),
        None => format!("{prefix}/requeststream"),
    };
    let url = match base_url.port() {
        Some(p) => format!("{scheme}://{host}:{p}{path}"),
        None => format!("{scheme}://{host}{path}"),
    };
    Ok(Url::parse(&url)?)
}

// ── Background reconnection loop ─────────────────────────────────────

/// Everything needed to open one connection.
struct Link {
    url: Url,
    tls: Option<Arc<rustls::ClientConfig>>,
    cookie: Option<String>,
}

/// Main loop: connect → read → on close or error, wait → reconnect.
///
/// Closes and errors share one path, so at most one reconnect is ever
/// pending. The loop owns a single socket at a time; a superseded socket
/// is dropped before the next one is opened.
async fn stream_loop(
    link: Link,
    event_tx: mpsc::UnboundedSender<RawRequestEvent>,
    state_tx: watch::Sender<StreamState>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    loop {
        let _ = state_tx.send(StreamState::Connecting);

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&link, &event_tx, &state_tx, &cancel) => result,
        };

        if cancel.is_cancelled() || event_tx.is_closed() {
            break;
        }

        match result {
            Ok(()) => tracing::info!("request stream closed"),
            Err(e) => tracing::warn!(error = %e, "request stream error, closing"),
        }

        let _ = state_tx.send(StreamState::Closed);
        tracing::info!(
            delay_ms = u64::try_from(reconnect.delay.as_millis()).unwrap_or(u64::MAX),
            "reconnecting request stream after delay"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(reconnect.delay) => {}
        }
    }

    let _ = state_tx.send(StreamState::UserClosed);
    tracing::debug!("request stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single connection and read frames until it drops.
async fn connect_and_read(
    link: &Link,
    event_tx: &mpsc::UnboundedSender<RawRequestEvent>,
    state_tx: &watch::Sender<StreamState>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %link.url, "connecting request stream");

    let uri: tungstenite::http::Uri = link
        .url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(cookie_val) = &link.cookie {
        request = request.with_header("Cookie", cookie_val);
    }

    let connector = link.tls.clone().map(Connector::Rustls);
    let (ws_stream, _response) =
        tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    let _ = state_tx.send(StreamState::Open);
    tracing::info!("request stream open");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        if !forward_frame(text.as_str(), event_tx) {
                            return Ok(());
                        }
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "close frame received");
                        } else {
                            tracing::info!("close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                    None => {
                        tracing::info!("request stream ended");
                        return Ok(());
                    }
                    // Protocol pings are answered by tungstenite; binary frames carry nothing.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

/// A decoded text frame.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    Keepalive,
    Event(RawRequestEvent),
}

pub(crate) fn parse_frame(text: &str) -> Result<Frame, serde_json::Error> {
    if text == KEEPALIVE {
        return Ok(Frame::Keepalive);
    }
    serde_json::from_str(text).map(Frame::Event)
}

/// Parse one frame and forward any event. Returns `false` once nobody is
/// listening anymore.
fn forward_frame(text: &str, event_tx: &mpsc::UnboundedSender<RawRequestEvent>) -> bool {
    match parse_frame(text) {
        Ok(Frame::Keepalive) => {
            tracing::trace!("keepalive, ignoring");
            true
        }
        Ok(Frame::Event(event)) => event_tx.send(event).is_ok(),
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse request stream frame");
            true
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_delay_is_one_second() {
        assert_eq!(ReconnectConfig::default().delay, Duration::from_secs(1));
    }

    #[test]
    fn keepalive_is_recognised() {
        assert_eq!(parse_frame("ping").unwrap(), Frame::Keepalive);
    }

    #[test]
    fn event_frame_is_parsed() {
        let text = serde_json::json!({
            "created_at": 1_700_000_000,
            "request": "{\"Question\":[]}",
            "response": "{\"Rcode\":0}",
            "src_ip": "10.0.0.1",
            "src_host": "resolver.example"
        })
        .to_string();

        match parse_frame(&text).unwrap() {
            Frame::Event(event) => {
                assert_eq!(event.src_ip, "10.0.0.1");
                assert_eq!(event.request, "{\"Question\":[]}");
            }
            Frame::Keepalive => panic!("expected an event"),
        }
    }

    #[test]
    fn forward_frame_drops_keepalive_and_garbage() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(forward_frame("ping", &tx));
        assert!(forward_frame("not json at all", &tx));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn forward_frame_reports_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let text = r#"{"request": "{}", "response": "{}"}"#;
        assert!(!forward_frame(text, &tx));
    }

    #[test]
    fn stream_url_maps_scheme_and_identity() {
        let base = Url::parse("https://messwithdns.net").unwrap();
        assert_eq!(
            stream_url(&base, Some("orange-tiger")).unwrap().as_str(),
            "wss://messwithdns.net/requeststream/orange-tiger"
        );

        let local = Url::parse("http://localhost:8080/").unwrap();
        assert_eq!(
            stream_url(&local, None).unwrap().as_str(),
            "ws://localhost:8080/requeststream"
        );
    }

    #[test]
    fn only_open_reports_open() {
        assert!(StreamState::Open.is_open());
        assert!(!StreamState::Closed.is_open());
        assert!(!StreamState::UserClosed.is_open());
    }
}
