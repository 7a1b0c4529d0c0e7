// mwdns-api: Async Rust client for the mess-with-dns backend

pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use client::ApiClient;
pub use error::Error;
pub use models::{RawRequestEvent, StoredRecord, WireHeader, WireRecord, WireValue};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ReconnectConfig, RequestStream, StreamState, stream_url};
