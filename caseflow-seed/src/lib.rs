//! Caseflow Seed - Raw Import Normalization
//!
//! Turns intake export records into canonical cases and seeds a
//! [`caseflow_storage::CaseStore`] with them. Malformed optional fields fall
//! back to deterministic defaults, so normalization never fails on content.

mod humanize;
mod loader;
mod normalize;
mod raw;

pub use humanize::{humanize_age, humanize_raw, parse_receipt_date};
pub use loader::SeedLoader;
pub use normalize::{
    compliance_tags_for, map_channel, normalize, parse_reporter, resolve_agent, ParsedReporter,
};
pub use raw::{RawCase, RawImport};
