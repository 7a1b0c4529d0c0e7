use thiserror::Error;

/// Top-level error type for the `mwdns-api` crate.
///
/// Covers every failure mode of the backend surface: HTTP transport,
/// backend rejections, the request stream, and payload decoding.
/// `mwdns-core` maps these into user-facing variants.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-2xx response. The body is an opaque human-readable string and
    /// is kept exactly as the backend sent it.
    #[error("Backend rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    // ── Request stream ──────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}
