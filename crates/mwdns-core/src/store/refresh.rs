// ── Refresh application logic ──
//
// Full re-fetches replace a collection wholesale; there is no per-entity
// diffing. Streamed request events are prepended one at a time.

use super::DataStore;
use super::collection::Snapshot;
use crate::record::DomainRecord;
use crate::requests::RequestEvent;

impl DataStore {
    /// Replace the record list with a freshly fetched one.
    pub(crate) fn apply_records(&self, records: Vec<DomainRecord>) {
        self.records.replace(records);
    }

    /// Replace the request log with a freshly fetched one (newest first).
    /// Returns exactly the log that was installed, before any later
    /// stream event lands on top of it.
    pub(crate) fn apply_requests(&self, requests: Vec<RequestEvent>) -> Snapshot<RequestEvent> {
        self.requests.replace(requests)
    }

    /// Add one live event at the head of the log.
    pub(crate) fn push_request(&self, event: RequestEvent) {
        self.requests.prepend(event);
    }

    /// Drop everything. Used on logout.
    pub(crate) fn clear(&self) {
        self.records.clear();
        self.requests.clear();
    }
}
