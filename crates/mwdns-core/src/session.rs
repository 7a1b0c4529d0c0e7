// ── Session ──
//
// Owns one user's view of the backend: the API client, the transcoder,
// the reactive store and the live request stream. Every write is followed
// by a full re-fetch; nothing is applied optimistically.

use std::sync::Arc;

use mwdns_api::transport::{TlsMode, TransportConfig};
use mwdns_api::websocket::{ReconnectConfig, RequestStream, StreamState, stream_url};
use mwdns_api::{ApiClient, RawRequestEvent};
use secrecy::ExposeSecret;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::codec::RecordCodec;
use crate::config::{SessionConfig, TlsVerification};
use crate::error::CoreError;
use crate::name::NameCodec;
use crate::record::{DomainRecord, RecordPatch};
use crate::requests::{RequestEvent, decode_request_event, decode_request_events};
use crate::schema::SchemaRegistry;
use crate::store::DataStore;
use crate::stream::EntityStream;

/// Per-session context.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Construct one per identity;
/// sessions share nothing, so several can run side by side.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    client: ApiClient,
    codec: RecordCodec,
    store: Arc<DataStore>,
    /// Mirrors the state of the current request stream. `Idle` until the
    /// first `init()`, `UserClosed` after `logout()`.
    stream_state: Arc<watch::Sender<StreamState>>,
    stream: Mutex<Option<StreamTasks>>,
    cancel: CancellationToken,
    /// Child token for the current stream; replaced on logout so the
    /// session can be initialised again.
    cancel_child: Mutex<CancellationToken>,
}

/// The running stream plus the tasks feeding the store from it.
struct StreamTasks {
    stream: RequestStream,
    bridge: JoinHandle<()>,
    mirror: JoinHandle<()>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Session {
    /// Create a session. Does NOT fetch anything -- call
    /// [`init()`](Self::init) to load data and start the stream.
    pub fn new(config: SessionConfig, schemas: Arc<SchemaRegistry>) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = ApiClient::new(config.server.clone(), &transport)?;
        let codec = RecordCodec::new(schemas, NameCodec::new(config.suffix.as_str()));
        let (stream_state, _) = watch::channel(StreamState::Idle);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                client,
                codec,
                store: Arc::new(DataStore::new()),
                stream_state: Arc::new(stream_state),
                stream: Mutex::new(None),
                cancel,
                cancel_child: Mutex::new(cancel_child),
            }),
        })
    }

    /// Create a session and, if an identity is configured, initialise it
    /// right away.
    pub async fn restore(
        config: SessionConfig,
        schemas: Arc<SchemaRegistry>,
    ) -> Result<Self, CoreError> {
        let has_identity = config.identity.is_some();
        let session = Self::new(config, schemas)?;
        if has_identity {
            session.init().await?;
        } else {
            debug!("no identity configured, session left uninitialised");
        }
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn domain(&self) -> &str {
        &self.inner.config.domain
    }

    pub fn codec(&self) -> &RecordCodec {
        &self.inner.codec
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        self.inner.codec.schemas()
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Fetch records and requests concurrently, then start the request
    /// stream. Calling it again refreshes the data but never starts a
    /// second stream.
    ///
    /// Returns the request log as fetched. Events the stream delivers
    /// later are not part of it, even if they arrive before this returns.
    pub async fn init(&self) -> Result<Arc<Vec<Arc<RequestEvent>>>, CoreError> {
        let (records, requests) = tokio::join!(self.refresh_records(), self.fetch_requests());
        records?;
        let requests = requests?;

        self.start_stream().await?;
        Ok(requests)
    }

    /// Clear both collections and shut the stream down for good.
    pub async fn logout(&self) {
        let mut child = self.inner.cancel_child.lock().await;
        child.cancel();
        *child = self.inner.cancel.child_token();
        drop(child);

        if let Some(tasks) = self.inner.stream.lock().await.take() {
            tasks.stream.shutdown();
            // Events still queued from the old socket must not land in
            // the cleared log.
            tasks.bridge.abort();
            tasks.mirror.abort();
        }

        self.inner.store.clear();
        self.inner.stream_state.send_replace(StreamState::UserClosed);
        info!(domain = %self.domain(), "logged out");
    }

    async fn start_stream(&self) -> Result<(), CoreError> {
        let config = &self.inner.config;
        if !config.stream_enabled {
            debug!("request stream disabled");
            return Ok(());
        }

        let mut slot = self.inner.stream.lock().await;
        if slot.is_some() {
            debug!("request stream already running");
            return Ok(());
        }

        let url = match &config.stream_url {
            Some(url) => url.clone(),
            None => stream_url(
                &config.server,
                config.identity.as_ref().map(ExposeSecret::expose_secret),
            )?,
        };
        let cancel = self.inner.cancel_child.lock().await.child_token();

        let (stream, events) = RequestStream::spawn(
            url,
            ReconnectConfig {
                delay: config.reconnect_delay,
            },
            cancel.clone(),
            &build_transport(config),
        )?;

        let bridge = tokio::spawn(bridge_task(
            Arc::clone(&self.inner.store),
            events,
            cancel.clone(),
        ));
        let mirror = tokio::spawn(mirror_task(
            stream.subscribe_state(),
            Arc::clone(&self.inner.stream_state),
        ));

        *slot = Some(StreamTasks {
            stream,
            bridge,
            mirror,
        });
        info!("request stream spawned");
        Ok(())
    }

    // ── Records ──────────────────────────────────────────────────

    /// Encode and store a new record under this session's domain.
    ///
    /// Returns the backend's response body. The record list is re-fetched
    /// whether the write succeeded or not.
    pub async fn create_record(&self, record: &DomainRecord) -> Result<String, CoreError> {
        let mut record = record.clone();
        self.domain().clone_into(&mut record.domain);
        record.subdomain = record.subdomain.trim().to_owned();

        let wire = self.inner.codec.encode(&record)?;
        let result = self.inner.client.create_record(&wire).await;
        self.after_record_write(result).await
    }

    /// Merge `patch` over the stored record `id` and write it back.
    pub async fn update_record(&self, id: &str, patch: &RecordPatch) -> Result<String, CoreError> {
        let base = self
            .inner
            .store
            .record_by_id(id)
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "record".into(),
                identifier: id.into(),
            })?;

        let mut merged = patch.apply(&base);
        merged.subdomain = merged.subdomain.trim().to_owned();

        let wire = self.inner.codec.encode(&merged)?;
        let result = self.inner.client.update_record(id, &wire).await;
        self.after_record_write(result).await
    }

    pub async fn delete_record(&self, id: &str) -> Result<String, CoreError> {
        let result = self.inner.client.delete_record(id).await;
        self.after_record_write(result).await
    }

    /// Re-fetch the record list for this session's domain.
    pub async fn refresh_records(&self) -> Result<(), CoreError> {
        let domain = self.domain();
        if domain.is_empty() {
            return Err(CoreError::NotInitialized);
        }
        let stored = self.inner.client.list_records(domain).await?;
        let records = self.inner.codec.decode_all(&stored);
        debug!(count = records.len(), "records refreshed");
        self.inner.store.apply_records(records);
        Ok(())
    }

    /// Write error first, then any refresh error.
    async fn after_record_write(
        &self,
        result: Result<String, mwdns_api::Error>,
    ) -> Result<String, CoreError> {
        let refreshed = self.refresh_records().await;
        let body = result?;
        refreshed?;
        Ok(body)
    }

    // ── Request log ──────────────────────────────────────────────

    /// Clear the server-side request log, then re-fetch it.
    pub async fn delete_requests(&self) -> Result<String, CoreError> {
        let result = self.inner.client.delete_requests().await;
        let refreshed = self.refresh_requests().await;
        let body = result?;
        refreshed?;
        Ok(body)
    }

    pub async fn refresh_requests(&self) -> Result<(), CoreError> {
        self.fetch_requests().await.map(drop)
    }

    async fn fetch_requests(&self) -> Result<Arc<Vec<Arc<RequestEvent>>>, CoreError> {
        let raw = self.inner.client.list_requests().await?;
        let requests = decode_request_events(&raw);
        debug!(count = requests.len(), "requests refreshed");
        Ok(self.inner.store.apply_requests(requests))
    }

    // ── Read side ────────────────────────────────────────────────

    pub fn records_snapshot(&self) -> Arc<Vec<Arc<DomainRecord>>> {
        self.inner.store.records_snapshot()
    }

    pub fn requests_snapshot(&self) -> Arc<Vec<Arc<RequestEvent>>> {
        self.inner.store.requests_snapshot()
    }

    pub fn subscribe_records(&self) -> EntityStream<DomainRecord> {
        self.inner.store.subscribe_records()
    }

    pub fn subscribe_requests(&self) -> EntityStream<RequestEvent> {
        self.inner.store.subscribe_requests()
    }

    pub fn stream_state(&self) -> StreamState {
        *self.inner.stream_state.borrow()
    }

    pub fn subscribe_stream_state(&self) -> watch::Receiver<StreamState> {
        self.inner.stream_state.subscribe()
    }

    /// Whether the request stream is currently connected.
    pub fn is_open(&self) -> bool {
        self.stream_state().is_open()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Stream events -> decoded `RequestEvent`s -> head of the request log.
async fn bridge_task(
    store: Arc<DataStore>,
    mut events: mpsc::UnboundedReceiver<RawRequestEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            raw = events.recv() => {
                let Some(raw) = raw else { break };
                match decode_request_event(&raw) {
                    Ok(event) => store.push_request(event),
                    Err(e) => warn!(error = %e, "dropping undecodable stream event"),
                }
            }
        }
    }
    debug!("request bridge exiting");
}

/// Copy stream state transitions into the session-level channel.
async fn mirror_task(
    mut source: watch::Receiver<StreamState>,
    target: Arc<watch::Sender<StreamState>>,
) {
    loop {
        let state = *source.borrow_and_update();
        target.send_replace(state);
        if state == StreamState::UserClosed || source.changed().await.is_err() {
            break;
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &SessionConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        identity: config.identity.clone(),
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

/// Parse a base URL, mapping failures into [`CoreError::Config`].
pub fn parse_server_url(server: &str) -> Result<Url, CoreError> {
    Url::parse(server).map_err(|e| CoreError::Config {
        message: format!("invalid server URL {server:?}: {e}"),
    })
}
