// mwdns-core: Record transcoding and session state between mwdns-api and the CLI.

pub mod codec;
pub mod config;
pub mod error;
pub mod name;
pub mod record;
pub mod requests;
pub mod rrtype;
pub mod schema;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use codec::{RecordCodec, chunk_txt};
pub use config::{SessionConfig, TlsVerification};
pub use error::CoreError;
pub use name::{APEX, DEFAULT_SUFFIX, NameCodec};
pub use record::{DomainRecord, RecordPatch};
pub use requests::{Answer, Query, RequestEvent, Response, decode_request_event};
pub use rrtype::{code_to_type, type_name, type_to_code};
pub use schema::{FieldKind, FieldSpec, RecordSchema, SchemaRegistry};
pub use session::{Session, parse_server_url};
pub use store::DataStore;
pub use stream::{EntityStream, RecordFilter, RequestFilter};

pub use mwdns_api::StreamState;
