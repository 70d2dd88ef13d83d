//! Caseflow Core - Case Types
//!
//! Shared vocabulary for the case workflow: ids, pipeline stages, the case
//! record and its property bag, pure tag mutations, errors and configuration.
//! No storage and no async code lives here.

pub mod config;
mod entities;
mod enums;
mod error;
mod identity;
pub mod mutator;
mod properties;

pub use config::{CaseflowConfig, ScalarDefaults, SeedOverride, SeedSettings, TagOptions};
pub use entities::{Agent, Case, CaseRecord, Message, Reporter};
pub use enums::{CaseStatus, CaseStatusParseError, WriteOperation};
pub use error::{
    CaseError, CaseResult, ConfigError, SeedError, StorageError, ValidationError, WriteFailure,
};
pub use identity::{
    new_batch_id, resolve_canonical_id, BatchId, CaseId, DocId, ReplicaSuffix, Timestamp,
    CASES_COLLECTION,
};
pub use mutator::{add_tag, available_options, remove_tag};
pub use properties::{PropertyKey, PropertyPatch, PropertyValue, Properties, TagField, TagSet, TextField};
