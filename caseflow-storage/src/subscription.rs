//! Push subscriptions over store snapshots.
//!
//! Both subscription kinds wrap a `watch` receiver and only wake their owner
//! when the slice of the store they target actually changed. Dropping a
//! subscription unsubscribes.

use crate::{CaseFilter, StoreSnapshot};
use caseflow_core::{Case, DocId};
use std::sync::Arc;
use tokio::sync::watch;

/// Receiver over every committed snapshot.
pub type SnapshotReceiver = watch::Receiver<Arc<StoreSnapshot>>;

/// Live view of a single document.
#[derive(Debug)]
pub struct DocSubscription {
    rx: SnapshotReceiver,
    id: DocId,
    last: Option<Case>,
}

impl DocSubscription {
    pub fn new(mut rx: SnapshotReceiver, id: DocId) -> Self {
        let last = rx.borrow_and_update().get(&id);
        Self { rx, id, last }
    }

    pub fn id(&self) -> &DocId {
        &self.id
    }

    /// Latest value seen. `None` means the document does not exist.
    pub fn current(&self) -> Option<&Case> {
        self.last.as_ref()
    }

    /// Wait for the next change to this document.
    ///
    /// Returns `None` once the store is gone. `Some(None)` reports a delete.
    pub async fn changed(&mut self) -> Option<Option<Case>> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let next = self.rx.borrow_and_update().get(&self.id);
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}

/// Live view of a filtered collection.
#[derive(Debug)]
pub struct ListSubscription {
    rx: SnapshotReceiver,
    filter: CaseFilter,
    last: Vec<Case>,
}

impl ListSubscription {
    pub fn new(mut rx: SnapshotReceiver, filter: CaseFilter) -> Self {
        let last = rx.borrow_and_update().list(&filter);
        Self { rx, filter, last }
    }

    pub fn filter(&self) -> &CaseFilter {
        &self.filter
    }

    pub fn current(&self) -> &[Case] {
        &self.last
    }

    /// Wait until the filtered result differs from the last one seen.
    pub async fn changed(&mut self) -> Option<Vec<Case>> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let next = self.rx.borrow_and_update().list(&self.filter);
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}
