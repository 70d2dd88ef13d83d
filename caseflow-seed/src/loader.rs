//! Seed loader: import file to normalized cases to store

use crate::normalize::normalize;
use crate::raw::{RawCase, RawImport};
use caseflow_core::{
    new_batch_id, Case, CaseError, CaseResult, CaseflowConfig, SeedError, Timestamp,
    ValidationError, WriteFailure, WriteOperation,
};
use caseflow_events::ErrorReporter;
use caseflow_storage::{BatchReceipt, CaseStore};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Normalizes raw intake records against a fixed `as_of` instant.
///
/// Store failures while seeding are published on the loader's
/// [`ErrorReporter`], the process-wide one unless replaced.
#[derive(Debug, Clone)]
pub struct SeedLoader {
    config: Arc<CaseflowConfig>,
    as_of: Timestamp,
    reporter: ErrorReporter,
}

impl SeedLoader {
    pub fn new(config: Arc<CaseflowConfig>, as_of: Timestamp) -> Self {
        Self {
            config,
            as_of,
            reporter: ErrorReporter::global(),
        }
    }

    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Loader that measures ages from the current instant.
    pub fn now(config: Arc<CaseflowConfig>) -> Self {
        Self::new(config, chrono::Utc::now())
    }

    pub fn as_of(&self) -> Timestamp {
        self.as_of
    }

    pub fn config(&self) -> &CaseflowConfig {
        &self.config
    }

    /// Normalize one record. A blank `case_id` is the only hard failure.
    pub fn normalize(&self, raw: &RawCase) -> CaseResult<Case> {
        if raw.case_id.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "case_id".to_string(),
            }
            .into());
        }
        Ok(normalize(&self.config, raw, self.as_of))
    }

    pub fn normalize_all(&self, raws: &[RawCase]) -> CaseResult<Vec<Case>> {
        raws.iter().map(|raw| self.normalize(raw)).collect()
    }

    /// Parse and normalize an import document.
    pub fn parse(&self, json: &str) -> CaseResult<Vec<Case>> {
        let import: RawImport = serde_json::from_str(json).map_err(|e| SeedError::Parse {
            reason: e.to_string(),
        })?;
        self.normalize_all(&import.cases)
    }

    /// Read, parse and normalize an import file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> CaseResult<Vec<Case>> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SeedError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let cases = self.parse(&json)?;
        debug!(path = %path.display(), cases = cases.len(), "Loaded seed file");
        Ok(cases)
    }

    /// Insert `cases` into `store` in one batch.
    ///
    /// A failed batch is reported before the error is returned.
    pub async fn seed(&self, store: &dyn CaseStore, cases: Vec<Case>) -> CaseResult<BatchReceipt> {
        let first_path = cases.first().map(|case| case.doc_id().path()).unwrap_or_default();
        match store.seed_bulk(cases).await {
            Ok(receipt) => {
                info!(batch_id = %receipt.batch_id, cases = receipt.ops, "Seeded case store");
                Ok(receipt)
            }
            Err(e) => {
                self.reporter.emit(seed_failure(&e, first_path));
                Err(e)
            }
        }
    }

    pub async fn seed_file(
        &self,
        store: &dyn CaseStore,
        path: impl AsRef<Path>,
    ) -> CaseResult<BatchReceipt> {
        let cases = self.load_file(path)?;
        self.seed(store, cases).await
    }
}

/// Failure event for a seed batch that did not commit.
fn seed_failure(err: &CaseError, first_path: String) -> WriteFailure {
    if let Some(failure) = err.write_failure() {
        return failure.clone();
    }
    error!(error = %err, "Seed batch failed");
    WriteFailure {
        path: first_path,
        operation: WriteOperation::Write,
        payload: Value::Null,
        batch_id: new_batch_id(),
        occurred_at: chrono::Utc::now(),
    }
}
