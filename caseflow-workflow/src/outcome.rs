//! Result of a mutating workflow operation

use caseflow_core::{
    new_batch_id, CaseError, CaseResult, DocId, StorageError, WriteFailure, WriteOperation,
};
use caseflow_events::ErrorReporter;
use caseflow_storage::{describe_batch, BatchOp, BatchReceipt};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error};

/// How a mutating operation ended.
///
/// Failures are reported through the [`ErrorReporter`] before this value is
/// produced, so callers never need to handle an error themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Committed(BatchReceipt),
    /// The id resolved to no document; nothing was written
    NotFound,
    /// The store refused the batch; the failure was reported
    Rejected(WriteFailure),
}

impl WriteOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, WriteOutcome::Committed(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, WriteOutcome::Rejected(_))
    }
}

/// Turn a batch result into an outcome, reporting any failure.
///
/// Errors other than a store rejection are wrapped into a failure describing
/// `ops`, so every failure reaches the reporter in the same shape.
pub(crate) fn settle(
    result: CaseResult<BatchReceipt>,
    ops: &[BatchOp],
    reporter: &ErrorReporter,
) -> WriteOutcome {
    match result {
        Ok(receipt) => WriteOutcome::Committed(receipt),
        Err(CaseError::Storage(StorageError::NotFound { path })) => {
            debug!(path = %path, "Batch target vanished before commit");
            WriteOutcome::NotFound
        }
        Err(CaseError::Storage(StorageError::WriteRejected(failure))) => {
            reporter.emit(failure.clone());
            WriteOutcome::Rejected(failure)
        }
        Err(other) => {
            error!(error = %other, ops = ops.len(), "Batch failed");
            let (operation, payload) = describe_batch(ops);
            let failure = WriteFailure {
                path: ops.first().map(|op| op.doc_id.path()).unwrap_or_default(),
                operation,
                payload,
                batch_id: new_batch_id(),
                occurred_at: Utc::now(),
            };
            reporter.emit(failure.clone());
            WriteOutcome::Rejected(failure)
        }
    }
}

/// Report a failed read of `doc_id` taken before an `operation` on it.
///
/// Nothing was written; the failure names the document the write targeted.
pub(crate) fn read_failed(
    doc_id: &DocId,
    operation: WriteOperation,
    err: CaseError,
    reporter: &ErrorReporter,
) -> WriteOutcome {
    error!(doc_id = %doc_id, error = %err, "Read before write failed");
    let failure = WriteFailure {
        path: doc_id.path(),
        operation,
        payload: Value::Null,
        batch_id: new_batch_id(),
        occurred_at: Utc::now(),
    };
    reporter.emit(failure.clone());
    WriteOutcome::Rejected(failure)
}
