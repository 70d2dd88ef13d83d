//! Case entities and their persisted document shape

use crate::{CaseId, CaseResult, CaseStatus, DocId, Properties, ReplicaSuffix, StorageError};
use serde::{Deserialize, Serialize};

/// Support agent. Embedded on a case as a denormalized snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: String,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            avatar_url: avatar_url.into(),
        }
    }

    pub fn is_automation(&self, automation_email: &str) -> bool {
        self.email == automation_email
    }
}

/// Snapshot of the person who reported the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reporter {
    pub name: String,
    pub handle: String,
    pub avatar_url: String,
}

/// One entry of a case conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub author: String,
    pub avatar_url: String,
    pub text: String,
    pub timestamp: String,
}

/// Persisted body of a case document.
///
/// Canonical and replica documents share this shape. The id is the document
/// key and never part of the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub title: String,
    pub preview: String,
    pub status: CaseStatus,
    pub assignee: Option<Agent>,
    pub created_at: String,
    pub source: String,
    pub user: Reporter,
    #[serde(default)]
    pub conversation: Vec<Message>,
    pub properties: Properties,
}

impl CaseRecord {
    /// The JSON written to the store for this record.
    pub fn to_document(&self) -> CaseResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| {
            StorageError::Serialization {
                path: String::new(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Deep copy carrying the demo stage for `suffix`.
    pub fn replica_snapshot(&self, suffix: ReplicaSuffix) -> CaseRecord {
        CaseRecord {
            status: CaseStatus::for_replica(suffix),
            ..self.clone()
        }
    }
}

/// A case as read from the store: its document id split into canonical id
/// and optional replica suffix, plus the record body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: CaseId,
    pub replica_suffix: Option<ReplicaSuffix>,
    #[serde(flatten)]
    pub record: CaseRecord,
}

impl Case {
    pub fn canonical(id: impl Into<CaseId>, record: CaseRecord) -> Self {
        Self {
            id: id.into(),
            replica_suffix: None,
            record,
        }
    }

    pub fn from_document(doc_id: &DocId, record: CaseRecord) -> Self {
        Self {
            id: doc_id.canonical(),
            replica_suffix: doc_id.replica_suffix(),
            record,
        }
    }

    /// Id of the physical document this case was read from.
    pub fn doc_id(&self) -> DocId {
        match self.replica_suffix {
            Some(suffix) => self.id.replica(suffix),
            None => self.id.doc_id(),
        }
    }

    pub fn is_replica(&self) -> bool {
        self.replica_suffix.is_some()
    }

    pub fn status(&self) -> CaseStatus {
        self.record.status
    }
}
