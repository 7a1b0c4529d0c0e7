// ── Central reactive data store ──
//
// The two authoritative collections of a session: the domain's records
// and the request log. Mutations are broadcast to subscribers via
// `watch` channels.

use std::sync::Arc;

use super::collection::{EntityCollection, Snapshot};
use crate::record::DomainRecord;
use crate::requests::RequestEvent;
use crate::stream::EntityStream;

/// Per-session store for records and request events.
///
/// Records are kept in server order. Requests are newest first.
pub struct DataStore {
    pub(crate) records: EntityCollection<DomainRecord>,
    pub(crate) requests: EntityCollection<RequestEvent>,
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            records: EntityCollection::new(),
            requests: EntityCollection::new(),
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn records_snapshot(&self) -> Snapshot<DomainRecord> {
        self.records.snapshot()
    }

    pub fn requests_snapshot(&self) -> Snapshot<RequestEvent> {
        self.requests.snapshot()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn record_by_id(&self, id: &str) -> Option<Arc<DomainRecord>> {
        self.records.find(|r| r.id == id)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_records(&self) -> EntityStream<DomainRecord> {
        EntityStream::new(self.records.subscribe())
    }

    pub fn subscribe_requests(&self) -> EntityStream<RequestEvent> {
        EntityStream::new(self.requests.subscribe())
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
