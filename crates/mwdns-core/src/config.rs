// ── Runtime session configuration ──
//
// Describes *how* to reach the backend and which domain the session owns.
// Carries the identity token but never touches disk; the CLI builds a
// `SessionConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::name::DEFAULT_SUFFIX;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (local development servers).
    DangerAcceptInvalid,
}

/// Configuration for a single session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend base URL (e.g. `https://messwithdns.net`).
    pub server: Url,
    /// The user's domain label under the suffix (e.g. `orange-tiger`).
    pub domain: String,
    /// Opaque session token, sent as the `username` cookie.
    pub identity: Option<SecretString>,
    /// Zone every domain lives under.
    pub suffix: String,
    pub tls: TlsVerification,
    /// Per-request HTTP timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
    /// Fixed delay before the request stream reconnects.
    pub reconnect_delay: Duration,
    /// Start the live request stream in `init()`.
    pub stream_enabled: bool,
    /// Stream endpoint override. Derived from `server` when unset.
    pub stream_url: Option<Url>,
}

impl SessionConfig {
    pub fn new(server: Url, domain: impl Into<String>) -> Self {
        Self {
            server,
            domain: domain.into(),
            identity: None,
            suffix: DEFAULT_SUFFIX.to_owned(),
            tls: TlsVerification::default(),
            timeout: None,
            reconnect_delay: Duration::from_secs(1),
            stream_enabled: true,
            stream_url: None,
        }
    }
}
