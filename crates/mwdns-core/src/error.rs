// ── Core error types ──
//
// User-facing errors from mwdns-core. Consumers never see reqwest errors
// or JSON parse failures directly; the `From<mwdns_api::Error>` impl maps
// transport-layer errors into domain variants. Backend rejections keep
// the response body exactly as sent.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transcoding errors ───────────────────────────────────────────
    #[error("Unknown record type: {type_name}")]
    UnknownType { type_name: String },

    #[error("Cannot encode {field} = {value:?}: {reason}")]
    Encoding {
        field: String,
        value: String,
        reason: String,
    },

    // ── Backend errors ───────────────────────────────────────────────
    /// Non-2xx response. `message` is the backend's body, untouched.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Session errors ───────────────────────────────────────────────
    #[error("Session not initialized: no domain configured")]
    NotInitialized,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn encoding(field: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::Encoding {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<mwdns_api::Error> for CoreError {
    fn from(err: mwdns_api::Error) -> Self {
        match err {
            mwdns_api::Error::Rejected { status, message } => CoreError::Rejected { status, message },
            mwdns_api::Error::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_connect() || e.is_timeout() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            mwdns_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            mwdns_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            mwdns_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            mwdns_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
