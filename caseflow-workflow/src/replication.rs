//! Demo replicas and the close protocol.
//!
//! A replica is an independent deep copy of a canonical case living at
//! `{caseId}-demo-{suffix}`. It is never kept in sync with the canonical
//! document; the only coordination is the close protocol, which deletes both
//! replicas in the same batch that closes the canonical case.

use crate::outcome::{read_failed, settle, WriteOutcome};
use caseflow_core::{CaseId, CaseRecord, CaseStatus, DocId, ReplicaSuffix, WriteOperation};
use caseflow_events::ErrorReporter;
use caseflow_storage::{BatchOp, CaseStore, CaseUpdate};
use std::sync::Arc;
use tracing::{debug, info};

/// Writes and removes the demo replicas of canonical cases.
#[derive(Clone)]
pub struct ReplicationManager {
    store: Arc<dyn CaseStore>,
    reporter: ErrorReporter,
}

impl std::fmt::Debug for ReplicationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationManager").finish_non_exhaustive()
    }
}

impl ReplicationManager {
    pub fn new(store: Arc<dyn CaseStore>, reporter: ErrorReporter) -> Self {
        Self { store, reporter }
    }

    /// Both replica ids of `case_id`, awaiting first.
    pub fn replica_ids(case_id: &CaseId) -> [DocId; 2] {
        case_id.replica_ids()
    }

    /// Canonical id behind `id`, with one trailing replica suffix stripped.
    pub fn resolve_canonical_id(id: &str) -> CaseId {
        caseflow_core::resolve_canonical_id(id)
    }

    /// Ops that create both replicas from `record`.
    pub fn replicate_ops(case_id: &CaseId, record: &CaseRecord) -> Vec<BatchOp> {
        ReplicaSuffix::ALL
            .into_iter()
            .map(|suffix| BatchOp::set(case_id.replica(suffix), record.replica_snapshot(suffix)))
            .collect()
    }

    /// Ops that close `case_id` and drop its replicas.
    ///
    /// `extra` is folded into the canonical update; its status is always
    /// overridden with `Closed`.
    pub fn close_ops(case_id: &CaseId, extra: CaseUpdate) -> Vec<BatchOp> {
        let mut ops = vec![BatchOp::update(
            case_id.doc_id(),
            extra.with_status(CaseStatus::Closed),
        )];
        ops.extend(case_id.replica_ids().into_iter().map(BatchOp::delete));
        ops
    }

    /// Snapshot the canonical case into its two replicas in one batch.
    ///
    /// Existing replicas are overwritten with a fresh snapshot.
    pub async fn replicate(&self, id: &str) -> WriteOutcome {
        let case_id = Self::resolve_canonical_id(id);
        let doc_id = case_id.doc_id();
        let record = match self.store.get(&doc_id).await {
            Ok(Some(case)) => case.record,
            Ok(None) => {
                debug!(case_id = %case_id, "Replicate skipped: case not found");
                return WriteOutcome::NotFound;
            }
            Err(e) => return read_failed(&doc_id, WriteOperation::Write, e, &self.reporter),
        };

        let ops = Self::replicate_ops(&case_id, &record);
        let outcome = settle(
            self.store.apply_atomic(ops.clone()).await,
            &ops,
            &self.reporter,
        );
        if outcome.is_committed() {
            info!(case_id = %case_id, "Demo replicas written");
        }
        outcome
    }

    /// Close `id`: canonical status to `Closed`, both replicas deleted.
    pub async fn close(&self, id: &str) -> WriteOutcome {
        self.close_with(id, CaseUpdate::default()).await
    }

    /// Close `id`, folding `extra` into the canonical update of the same batch.
    pub async fn close_with(&self, id: &str, extra: CaseUpdate) -> WriteOutcome {
        let case_id = Self::resolve_canonical_id(id);
        let doc_id = case_id.doc_id();
        match self.store.get(&doc_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(case_id = %case_id, "Close skipped: case not found");
                return WriteOutcome::NotFound;
            }
            Err(e) => return read_failed(&doc_id, WriteOperation::Write, e, &self.reporter),
        }

        let ops = Self::close_ops(&case_id, extra);
        let outcome = settle(
            self.store.apply_atomic(ops.clone()).await,
            &ops,
            &self.reporter,
        );
        if outcome.is_committed() {
            info!(case_id = %case_id, "Case closed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_core::{PropertyPatch, TagField};
    use caseflow_storage::OpKind;

    #[test]
    fn test_close_ops_shape() {
        let ops = ReplicationManager::close_ops(&CaseId::new("C1"), CaseUpdate::default());
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].doc_id.as_str(), "C1");
        assert!(matches!(
            &ops[0].kind,
            OpKind::Update(update) if update.status == Some(CaseStatus::Closed)
        ));
        assert_eq!(ops[1].doc_id.as_str(), "C1-demo-awaiting");
        assert_eq!(ops[2].doc_id.as_str(), "C1-demo-mentions");
        assert!(matches!(ops[1].kind, OpKind::Delete));
        assert!(matches!(ops[2].kind, OpKind::Delete));
    }

    #[test]
    fn test_close_ops_keeps_extra_patches_and_forces_closed() {
        let extra = CaseUpdate::status(CaseStatus::Assigned).with_property(PropertyPatch::tags(
            TagField::Compliance,
            ["AE"].into_iter().collect(),
        ));
        let ops = ReplicationManager::close_ops(&CaseId::new("C1"), extra);
        match &ops[0].kind {
            OpKind::Update(update) => {
                assert_eq!(update.status, Some(CaseStatus::Closed));
                assert_eq!(update.properties.len(), 1);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_resolve_canonical_id() {
        assert_eq!(ReplicationManager::resolve_canonical_id("C1-demo-mentions").as_str(), "C1");
        let [a, m] = ReplicationManager::replica_ids(&CaseId::new("C1"));
        assert_eq!(a.as_str(), "C1-demo-awaiting");
        assert_eq!(m.as_str(), "C1-demo-mentions");
    }
}
