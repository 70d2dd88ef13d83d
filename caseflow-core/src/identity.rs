//! Identity types for cases and their demo replica documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Correlation id attached to every atomic batch.
/// UUIDv7 so batch ids sort by submission time in logs.
pub type BatchId = Uuid;

/// Generate a new UUIDv7 batch id.
pub fn new_batch_id() -> BatchId {
    Uuid::now_v7()
}

/// Collection that holds every case document, canonical and replica alike.
pub const CASES_COLLECTION: &str = "cases";

/// Marker between a canonical id and a replica suffix.
const REPLICA_MARKER: &str = "-demo-";

// ============================================================================
// REPLICA SUFFIX
// ============================================================================

/// Closed set of suffixes that turn a canonical id into a replica id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaSuffix {
    Awaiting,
    Mentions,
}

impl ReplicaSuffix {
    /// Every suffix, in the order replicas are written.
    pub const ALL: [ReplicaSuffix; 2] = [ReplicaSuffix::Awaiting, ReplicaSuffix::Mentions];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicaSuffix::Awaiting => "awaiting",
            ReplicaSuffix::Mentions => "mentions",
        }
    }
}

impl fmt::Display for ReplicaSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplicaSuffix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting" => Ok(ReplicaSuffix::Awaiting),
            "mentions" => Ok(ReplicaSuffix::Mentions),
            _ => Err(format!("Invalid ReplicaSuffix: {}", s)),
        }
    }
}

// ============================================================================
// CASE AND DOCUMENT IDS
// ============================================================================

/// Identifier of a canonical case. Stable for the life of the case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document id of the canonical record.
    pub fn doc_id(&self) -> DocId {
        DocId(self.0.clone())
    }

    /// Document id of the replica carrying `suffix`.
    pub fn replica(&self, suffix: ReplicaSuffix) -> DocId {
        DocId(format!("{}{}{}", self.0, REPLICA_MARKER, suffix.as_str()))
    }

    /// Both replica document ids, in `ReplicaSuffix::ALL` order.
    pub fn replica_ids(&self) -> [DocId; 2] {
        ReplicaSuffix::ALL.map(|suffix| self.replica(suffix))
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CaseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of a physical document: either a canonical case or a replica.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full document path, as reported in write failures.
    pub fn path(&self) -> String {
        format!("{}/{}", CASES_COLLECTION, self.0)
    }

    /// Canonical case this document belongs to.
    pub fn canonical(&self) -> CaseId {
        resolve_canonical_id(&self.0)
    }

    /// Replica suffix, or `None` for a canonical document.
    pub fn replica_suffix(&self) -> Option<ReplicaSuffix> {
        split_replica(&self.0).map(|(_, suffix)| suffix)
    }

    pub fn is_replica(&self) -> bool {
        self.replica_suffix().is_some()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<CaseId> for DocId {
    fn from(value: CaseId) -> Self {
        Self(value.0)
    }
}

fn split_replica(id: &str) -> Option<(&str, ReplicaSuffix)> {
    ReplicaSuffix::ALL.into_iter().find_map(|suffix| {
        id.strip_suffix(suffix.as_str())
            .and_then(|rest| rest.strip_suffix(REPLICA_MARKER))
            .map(|base| (base, suffix))
    })
}

/// Strip one trailing `-demo-{suffix}` from `id`, if present.
///
/// Every read path goes through this so a replica's detail view loads and
/// writes the canonical case.
pub fn resolve_canonical_id(id: &str) -> CaseId {
    match split_replica(id) {
        Some((base, _)) => CaseId::new(base),
        None => CaseId::new(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replica_ids_follow_pattern() {
        let id = CaseId::new("127001");
        assert_eq!(id.replica(ReplicaSuffix::Awaiting).as_str(), "127001-demo-awaiting");
        assert_eq!(id.replica(ReplicaSuffix::Mentions).as_str(), "127001-demo-mentions");
        let [a, m] = id.replica_ids();
        assert_eq!(a.replica_suffix(), Some(ReplicaSuffix::Awaiting));
        assert_eq!(m.replica_suffix(), Some(ReplicaSuffix::Mentions));
    }

    #[test]
    fn test_resolve_canonical_id() {
        assert_eq!(resolve_canonical_id("56-demo-awaiting").as_str(), "56");
        assert_eq!(resolve_canonical_id("56-demo-mentions").as_str(), "56");
        assert_eq!(resolve_canonical_id("56").as_str(), "56");
        // Unknown suffixes are not part of the closed set
        assert_eq!(resolve_canonical_id("56-demo-other").as_str(), "56-demo-other");
        // Only one trailing suffix is stripped
        assert_eq!(
            resolve_canonical_id("56-demo-awaiting-demo-mentions").as_str(),
            "56-demo-awaiting"
        );
    }

    #[test]
    fn test_doc_path() {
        assert_eq!(DocId::new("49").path(), "cases/49");
        assert!(!DocId::new("49").is_replica());
        assert!(DocId::new("49-demo-mentions").is_replica());
    }
}
