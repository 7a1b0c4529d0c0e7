// ── Reactive entity streams ──
//
// Subscription types for consuming collection changes from the DataStore.

mod filter;

use std::sync::Arc;

use tokio::sync::watch;

pub use filter::{RecordFilter, RequestFilter};

/// A subscription to a collection of entities.
///
/// Each `changed()` yields the full snapshot installed by the latest
/// mutation.
pub struct EntityStream<T: Send + Sync + 'static> {
    receiver: watch::Receiver<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<Arc<T>>>>) -> Self {
        Self { receiver }
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Arc<T>>>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}
