//! Caseflow Storage - Case Store Trait and In-Memory Implementation
//!
//! Defines the document store the workflow runs against: point reads,
//! filtered list reads, push subscriptions, and all-or-nothing batches.

mod batch;
mod filter;
mod memory;
mod snapshot;
mod subscription;

pub use batch::{describe_batch, BatchOp, BatchReceipt, CaseUpdate, OpKind};
pub use filter::{CaseFilter, DocScope};
pub use memory::MemoryCaseStore;
pub use snapshot::StoreSnapshot;
pub use subscription::{DocSubscription, ListSubscription, SnapshotReceiver};

use async_trait::async_trait;
use caseflow_core::{Case, CaseResult, DocId};

/// Async document store holding canonical and replica case documents.
///
/// Writes only happen through [`CaseStore::apply_atomic`] and
/// [`CaseStore::seed_bulk`]. A rejected write returns
/// `StorageError::WriteRejected` carrying the structured failure and leaves
/// every document in the batch untouched.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Get one document. `None` is the not-found result.
    async fn get(&self, id: &DocId) -> CaseResult<Option<Case>>;

    /// Documents admitted by `filter`, in document id order.
    async fn list(&self, filter: &CaseFilter) -> CaseResult<Vec<Case>>;

    /// Commit `ops` together. Either every op takes effect or none does.
    async fn apply_atomic(&self, ops: Vec<BatchOp>) -> CaseResult<BatchReceipt>;

    /// Insert canonical cases in one batch.
    async fn seed_bulk(&self, cases: Vec<Case>) -> CaseResult<BatchReceipt>;

    /// Receiver over every committed snapshot.
    fn subscribe(&self) -> SnapshotReceiver;

    /// Push subscription to one document.
    fn watch_doc(&self, id: DocId) -> DocSubscription {
        DocSubscription::new(self.subscribe(), id)
    }

    /// Push subscription to a filtered collection.
    fn watch_list(&self, filter: CaseFilter) -> ListSubscription {
        ListSubscription::new(self.subscribe(), filter)
    }
}
