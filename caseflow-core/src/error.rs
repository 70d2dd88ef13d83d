//! Error types for Caseflow operations

use crate::{BatchId, Timestamp, WriteOperation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured write failure, published to the error reporter.
///
/// `payload` is the JSON of what the write tried to persist: the document for
/// a set, the field patch for an update, `null` for a delete, and an array of
/// per-op entries for a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteFailure {
    pub path: String,
    pub operation: WriteOperation,
    pub payload: serde_json::Value,
    pub batch_id: BatchId,
    pub occurred_at: Timestamp,
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("Document not found: {path}")]
    NotFound { path: String },

    #[error("Document already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Write rejected: {} on {}", .0.operation, .0.path)]
    WriteRejected(WriteFailure),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Serialization failed for {path}: {reason}")]
    Serialization { path: String, reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown property: {name}")]
    UnknownProperty { name: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },

    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Seed import errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse seed data: {reason}")]
    Parse { reason: String },
}

/// Master error type for all Caseflow errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CaseError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),
}

impl CaseError {
    /// The write failure carried by a rejected write, if this is one.
    pub fn write_failure(&self) -> Option<&WriteFailure> {
        match self {
            CaseError::Storage(StorageError::WriteRejected(failure)) => Some(failure),
            _ => None,
        }
    }
}

/// Result type alias for Caseflow operations.
pub type CaseResult<T> = Result<T, CaseError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn failure() -> WriteFailure {
        WriteFailure {
            path: "cases/49".to_string(),
            operation: WriteOperation::Update,
            payload: serde_json::json!({ "status": "Closed" }),
            batch_id: Uuid::nil(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            path: "cases/127001".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("not found"));
        assert!(msg.contains("cases/127001"));
    }

    #[test]
    fn test_storage_error_display_write_rejected() {
        let msg = format!("{}", StorageError::WriteRejected(failure()));
        assert!(msg.contains("update"));
        assert!(msg.contains("cases/49"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "automation_email".to_string(),
            value: "bad".to_string(),
            reason: "must belong to a roster agent".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("automation_email"));
        assert!(msg.contains("bad"));
        assert!(msg.contains("roster agent"));
    }

    #[test]
    fn test_write_failure_serializes_camel_case() {
        let json = serde_json::to_value(failure()).unwrap();
        assert_eq!(json["path"], "cases/49");
        assert_eq!(json["operation"], "update");
        assert!(json.get("batchId").is_some());
        assert!(json.get("occurredAt").is_some());
    }

    #[test]
    fn test_case_error_from_variants() {
        let storage = CaseError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, CaseError::Storage(_)));

        let validation = CaseError::from(ValidationError::UnknownProperty {
            name: "tags".to_string(),
        });
        assert!(matches!(validation, CaseError::Validation(_)));

        let config = CaseError::from(ConfigError::AlreadyInitialized);
        assert!(matches!(config, CaseError::Config(_)));

        let seed = CaseError::from(SeedError::Parse {
            reason: "eof".to_string(),
        });
        assert!(matches!(seed, CaseError::Seed(_)));
    }

    #[test]
    fn test_write_failure_accessor() {
        let err = CaseError::from(StorageError::WriteRejected(failure()));
        assert_eq!(err.write_failure().map(|f| f.path.as_str()), Some("cases/49"));
        assert!(CaseError::from(StorageError::LockPoisoned).write_failure().is_none());
    }
}
