//! Atomic batch operations

use caseflow_core::{
    Agent, BatchId, CaseRecord, CaseResult, CaseStatus, DocId, PropertyPatch, PropertyValue,
    WriteOperation,
};
use serde_json::{json, Map, Value};

// ============================================================================
// UPDATE PAYLOAD
// ============================================================================

/// Field-level patch for an existing case document.
///
/// Unset fields are left as they are. Each property patch replaces exactly one
/// field of the bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseUpdate {
    /// New pipeline stage
    pub status: Option<CaseStatus>,
    /// New assignee snapshot; `Some(None)` clears it
    pub assignee: Option<Option<Agent>>,
    pub properties: Vec<PropertyPatch>,
}

impl CaseUpdate {
    pub fn status(status: CaseStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn property(patch: PropertyPatch) -> Self {
        Self {
            properties: vec![patch],
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_assignee(mut self, agent: Option<Agent>) -> Self {
        self.assignee = Some(agent);
        self
    }

    pub fn with_property(mut self, patch: PropertyPatch) -> Self {
        self.properties.push(patch);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assignee.is_none() && self.properties.is_empty()
    }

    /// Write the set fields onto `record`.
    pub fn apply_to(&self, record: &mut CaseRecord) -> CaseResult<()> {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(assignee) = &self.assignee {
            record.assignee = assignee.clone();
        }
        for patch in &self.properties {
            record.properties.apply_patch(patch)?;
        }
        Ok(())
    }

    /// Dotted-path JSON of the touched fields.
    pub fn payload(&self) -> Value {
        let mut map = Map::new();
        if let Some(status) = self.status {
            map.insert("status".to_string(), json!(status));
        }
        if let Some(assignee) = &self.assignee {
            map.insert("assignee".to_string(), json!(assignee));
        }
        for patch in &self.properties {
            let value = match &patch.value {
                PropertyValue::Tags(tags) => json!(tags),
                PropertyValue::Text(text) => json!(text),
            };
            map.insert(format!("properties.{}", patch.key.wire_name()), value);
        }
        Value::Object(map)
    }
}

// ============================================================================
// BATCH OPERATIONS
// ============================================================================

/// What a batch op does to its document.
#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    /// Create or overwrite the whole document
    Set(Box<CaseRecord>),
    /// Patch fields of an existing document
    Update(CaseUpdate),
    /// Remove the document; absent documents are tolerated
    Delete,
}

/// One entry of an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOp {
    pub doc_id: DocId,
    pub kind: OpKind,
}

impl BatchOp {
    pub fn set(doc_id: impl Into<DocId>, record: CaseRecord) -> Self {
        Self {
            doc_id: doc_id.into(),
            kind: OpKind::Set(Box::new(record)),
        }
    }

    pub fn update(doc_id: impl Into<DocId>, update: CaseUpdate) -> Self {
        Self {
            doc_id: doc_id.into(),
            kind: OpKind::Update(update),
        }
    }

    pub fn delete(doc_id: impl Into<DocId>) -> Self {
        Self {
            doc_id: doc_id.into(),
            kind: OpKind::Delete,
        }
    }

    pub fn operation(&self) -> WriteOperation {
        match self.kind {
            OpKind::Set(_) => WriteOperation::Create,
            OpKind::Update(_) => WriteOperation::Update,
            OpKind::Delete => WriteOperation::Delete,
        }
    }

    /// JSON of the data this op writes. `null` for deletes.
    pub fn payload(&self) -> Value {
        match &self.kind {
            OpKind::Set(record) => record.to_document().unwrap_or(Value::Null),
            OpKind::Update(update) => update.payload(),
            OpKind::Delete => Value::Null,
        }
    }
}

/// Operation kind and payload reported for a whole batch.
///
/// A single-op batch reports that op directly. Larger batches report
/// `write` with one `{path, operation, data}` entry per op.
pub fn describe_batch(ops: &[BatchOp]) -> (WriteOperation, Value) {
    match ops {
        [single] => (single.operation(), single.payload()),
        _ => {
            let entries = ops
                .iter()
                .map(|op| {
                    json!({
                        "path": op.doc_id.path(),
                        "operation": op.operation(),
                        "data": op.payload(),
                    })
                })
                .collect();
            (WriteOperation::Write, Value::Array(entries))
        }
    }
}

/// Confirmation of a committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReceipt {
    pub batch_id: BatchId,
    /// Store version after the commit
    pub version: u64,
    pub ops: usize,
}
