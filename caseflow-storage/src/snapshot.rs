//! Immutable view of the whole store at one version

use crate::CaseFilter;
use caseflow_core::{Case, CaseRecord, DocId};
use std::collections::BTreeMap;

/// Every document in the store at one committed version.
///
/// Published whole on each commit, so a reader never sees part of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    docs: BTreeMap<DocId, CaseRecord>,
    version: u64,
}

impl StoreSnapshot {
    pub(crate) fn new(docs: BTreeMap<DocId, CaseRecord>, version: u64) -> Self {
        Self { docs, version }
    }

    pub(crate) fn docs(&self) -> &BTreeMap<DocId, CaseRecord> {
        &self.docs
    }

    /// Number of commits that produced this snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, id: &DocId) -> Option<Case> {
        self.docs
            .get(id)
            .map(|record| Case::from_document(id, record.clone()))
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.docs.contains_key(id)
    }

    /// Documents admitted by `filter`, in document id order.
    pub fn list(&self, filter: &CaseFilter) -> Vec<Case> {
        self.docs
            .iter()
            .map(|(id, record)| Case::from_document(id, record.clone()))
            .filter(|case| filter.matches(case))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
