//! In-memory case store

use crate::describe_batch;
use crate::{BatchOp, BatchReceipt, CaseFilter, CaseStore, OpKind, SnapshotReceiver, StoreSnapshot};
use async_trait::async_trait;
use caseflow_core::{
    new_batch_id, BatchId, Case, CaseRecord, CaseResult, DocId, StorageError, WriteFailure,
};
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::debug;

/// In-memory store for a single process.
///
/// A batch is applied to a private copy of the current snapshot and published
/// only if every op succeeds, all under one write lock.
#[derive(Debug)]
pub struct MemoryCaseStore {
    state: RwLock<Arc<StoreSnapshot>>,
    tx: watch::Sender<Arc<StoreSnapshot>>,
    /// Document paths whose writes are refused
    rejected_paths: RwLock<HashSet<String>>,
}

impl Default for MemoryCaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCaseStore {
    pub fn new() -> Self {
        let initial = Arc::new(StoreSnapshot::default());
        let (tx, _rx) = watch::channel(Arc::clone(&initial));
        Self {
            state: RwLock::new(initial),
            tx,
            rejected_paths: RwLock::new(HashSet::new()),
        }
    }

    /// Refuse every batch that touches `path` (e.g. `cases/49`).
    pub fn reject_writes_to(&self, path: impl Into<String>) -> CaseResult<()> {
        let mut paths = self
            .rejected_paths
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        paths.insert(path.into());
        Ok(())
    }

    pub fn allow_writes_to(&self, path: &str) -> CaseResult<()> {
        let mut paths = self
            .rejected_paths
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        paths.remove(path);
        Ok(())
    }

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> CaseResult<Arc<StoreSnapshot>> {
        let state = self.state.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(Arc::clone(&state))
    }

    pub fn doc_count(&self) -> CaseResult<usize> {
        Ok(self.snapshot()?.len())
    }

    fn commit(&self, ops: &[BatchOp]) -> CaseResult<BatchReceipt> {
        let batch_id = new_batch_id();
        let mut state = self.state.write().map_err(|_| StorageError::LockPoisoned)?;

        if let Some(denied) = self.first_rejected(ops)? {
            debug!(
                batch_id = %batch_id,
                doc_id = %denied,
                ops = ops.len(),
                "Batch rejected"
            );
            return Err(rejection(ops, &denied, batch_id).into());
        }

        if ops.is_empty() {
            return Ok(BatchReceipt {
                batch_id,
                version: state.version(),
                ops: 0,
            });
        }

        let mut docs = state.docs().clone();
        for op in ops {
            apply_op(&mut docs, op)?;
        }

        let next = Arc::new(StoreSnapshot::new(docs, state.version() + 1));
        *state = Arc::clone(&next);
        let version = next.version();
        self.tx.send_replace(next);

        debug!(batch_id = %batch_id, ops = ops.len(), version, "Committed batch");
        Ok(BatchReceipt {
            batch_id,
            version,
            ops: ops.len(),
        })
    }

    fn first_rejected(&self, ops: &[BatchOp]) -> CaseResult<Option<DocId>> {
        let paths = self
            .rejected_paths
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(ops
            .iter()
            .find(|op| paths.contains(&op.doc_id.path()))
            .map(|op| op.doc_id.clone()))
    }
}

fn apply_op(docs: &mut BTreeMap<DocId, CaseRecord>, op: &BatchOp) -> CaseResult<()> {
    match &op.kind {
        OpKind::Set(record) => {
            docs.insert(op.doc_id.clone(), record.as_ref().clone());
        }
        OpKind::Update(update) => {
            let record = docs.get_mut(&op.doc_id).ok_or_else(|| StorageError::NotFound {
                path: op.doc_id.path(),
            })?;
            update.apply_to(record)?;
        }
        OpKind::Delete => {
            docs.remove(&op.doc_id);
        }
    }
    Ok(())
}

fn rejection(ops: &[BatchOp], denied: &DocId, batch_id: BatchId) -> StorageError {
    let (operation, payload) = describe_batch(ops);
    StorageError::WriteRejected(WriteFailure {
        path: denied.path(),
        operation,
        payload,
        batch_id,
        occurred_at: Utc::now(),
    })
}

#[async_trait]
impl CaseStore for MemoryCaseStore {
    async fn get(&self, id: &DocId) -> CaseResult<Option<Case>> {
        Ok(self.snapshot()?.get(id))
    }

    async fn list(&self, filter: &CaseFilter) -> CaseResult<Vec<Case>> {
        Ok(self.snapshot()?.list(filter))
    }

    async fn apply_atomic(&self, ops: Vec<BatchOp>) -> CaseResult<BatchReceipt> {
        self.commit(&ops)
    }

    async fn seed_bulk(&self, cases: Vec<Case>) -> CaseResult<BatchReceipt> {
        let ops: Vec<BatchOp> = cases
            .into_iter()
            .map(|case| BatchOp::set(case.id.doc_id(), case.record))
            .collect();
        let receipt = self.commit(&ops)?;
        debug!(batch_id = %receipt.batch_id, cases = receipt.ops, "Seeded cases");
        Ok(receipt)
    }

    fn subscribe(&self) -> SnapshotReceiver {
        self.tx.subscribe()
    }
}
