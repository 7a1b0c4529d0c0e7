// ── Generic reactive entity collection ──
//
// An ordered list published through a `watch` channel. Every mutation
// rebuilds the snapshot that subscribers receive. Order is whatever the
// writer decides: server order for records, newest-first for requests.

use std::sync::Arc;

use tokio::sync::watch;

/// Snapshot type handed to readers.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self { snapshot }
    }

    /// Replace the whole collection, keeping the given order. Returns the
    /// snapshot that was installed.
    pub(crate) fn replace(&self, items: Vec<T>) -> Snapshot<T> {
        let values: Snapshot<T> = Arc::new(items.into_iter().map(Arc::new).collect());
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::clone(&values));
        values
    }

    /// Insert at the front.
    pub(crate) fn prepend(&self, item: T) {
        self.snapshot.send_modify(|snap| {
            let mut values = Vec::with_capacity(snap.len() + 1);
            values.push(Arc::new(item));
            values.extend(snap.iter().cloned());
            *snap = Arc::new(values);
        });
    }

    pub(crate) fn clear(&self) {
        self.snapshot.send_modify(|snap| *snap = Arc::new(Vec::new()));
    }

    /// First entity matching `pred`.
    pub(crate) fn find(&self, pred: impl Fn(&T) -> bool) -> Option<Arc<T>> {
        self.snapshot.borrow().iter().find(|e| pred(e)).cloned()
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(col: &EntityCollection<&'static str>) -> Vec<&'static str> {
        col.snapshot().iter().map(|s| **s).collect()
    }

    #[test]
    fn replace_keeps_order() {
        let col = EntityCollection::new();
        col.replace(vec!["c", "a", "b"]);
        assert_eq!(values(&col), ["c", "a", "b"]);
    }

    #[test]
    fn prepend_puts_newest_first() {
        let col = EntityCollection::new();
        col.replace(vec!["old"]);
        col.prepend("a");
        col.prepend("b");
        assert_eq!(values(&col), ["b", "a", "old"]);
    }

    #[test]
    fn clear_empties_and_notifies() {
        let col = EntityCollection::new();
        col.replace(vec!["x"]);
        let mut rx = col.subscribe();
        col.clear();
        assert!(col.snapshot().is_empty());
        assert!(rx.has_changed().unwrap_or(false));
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn old_snapshots_are_unaffected() {
        let col = EntityCollection::new();
        let snap = col.replace(vec!["a"]);
        col.prepend("b");
        assert_eq!(snap.len(), 1);
        assert_eq!(col.snapshot().len(), 2);
    }

    #[test]
    fn subscribers_see_changes() {
        let col = EntityCollection::new();
        let mut rx = col.subscribe();
        col.replace(vec!["a"]);
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().len(), 1);
        assert!(col.find(|s| *s == "a").is_some());
        assert!(col.find(|s| *s == "z").is_none());
    }
}
