//! Dashboard grouping of documents by pipeline stage

use caseflow_core::{Case, CaseStatus};

/// One board column: every document currently in `status`.
#[derive(Debug, Clone, PartialEq)]
pub struct StageColumn {
    pub status: CaseStatus,
    pub cases: Vec<Case>,
}

impl StageColumn {
    pub fn title(&self) -> &'static str {
        self.status.label()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Group `cases` into one column per stage, in board order.
///
/// Every stage gets a column, empty or not. Replicas sit in their own demo
/// columns next to their canonical case's column.
pub fn group_by_stage(cases: Vec<Case>) -> Vec<StageColumn> {
    let mut columns: Vec<StageColumn> = CaseStatus::ALL
        .into_iter()
        .map(|status| StageColumn {
            status,
            cases: Vec::new(),
        })
        .collect();
    for case in cases {
        if let Some(column) = columns.iter_mut().find(|c| c.status == case.record.status) {
            column.cases.push(case);
        }
    }
    columns
}
