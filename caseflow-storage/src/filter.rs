//! Collection filters for list reads and list subscriptions

use caseflow_core::{Case, CaseStatus};

/// Which physical documents a filter admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocScope {
    #[default]
    All,
    CanonicalOnly,
    ReplicasOnly,
}

/// Filter over the case collection. The default admits every document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub scope: DocScope,
    pub assignee_email: Option<String>,
}

impl CaseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_status(status: CaseStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn canonical_only(mut self) -> Self {
        self.scope = DocScope::CanonicalOnly;
        self
    }

    pub fn replicas_only(mut self) -> Self {
        self.scope = DocScope::ReplicasOnly;
        self
    }

    pub fn assigned_to(mut self, email: impl Into<String>) -> Self {
        self.assignee_email = Some(email.into());
        self
    }

    pub fn matches(&self, case: &Case) -> bool {
        if let Some(status) = self.status {
            if case.record.status != status {
                return false;
            }
        }
        let scope_ok = match self.scope {
            DocScope::All => true,
            DocScope::CanonicalOnly => !case.is_replica(),
            DocScope::ReplicasOnly => case.is_replica(),
        };
        if !scope_ok {
            return false;
        }
        match &self.assignee_email {
            Some(email) => case
                .record
                .assignee
                .as_ref()
                .is_some_and(|agent| &agent.email == email),
            None => true,
        }
    }
}
