//! Enum types for Caseflow entities

use crate::ReplicaSuffix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PIPELINE STAGES
// ============================================================================

/// Pipeline stage a case document occupies.
///
/// The order of variants is the board's column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum CaseStatus {
    /// Assigned to the automation agent
    AutomationAssigned,
    /// Demo replica: awaiting column
    DemoAwaiting,
    /// Demo replica: mentions column
    DemoMentions,
    /// Default active stage
    #[default]
    Assigned,
    AwaitingResponse,
    /// Logical deletion
    Closed,
}

impl CaseStatus {
    /// Every stage, in board order.
    pub const ALL: [CaseStatus; 6] = [
        CaseStatus::AutomationAssigned,
        CaseStatus::DemoAwaiting,
        CaseStatus::DemoMentions,
        CaseStatus::Assigned,
        CaseStatus::AwaitingResponse,
        CaseStatus::Closed,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            CaseStatus::AutomationAssigned => "AutomationAssigned",
            CaseStatus::DemoAwaiting => "DemoAwaiting",
            CaseStatus::DemoMentions => "DemoMentions",
            CaseStatus::Assigned => "Assigned",
            CaseStatus::AwaitingResponse => "AwaitingResponse",
            CaseStatus::Closed => "Closed",
        }
    }

    /// Parse from database string representation.
    ///
    /// Accepts the legacy board column labels ("All Assigned",
    /// "Assigned to Pace", "All closed", ...) as well.
    pub fn from_db_str(s: &str) -> Result<Self, CaseStatusParseError> {
        match normalize_token(s).as_str() {
            "automationassigned" | "assignedtopace" => Ok(CaseStatus::AutomationAssigned),
            "demoawaiting" | "alldemoawaiting" => Ok(CaseStatus::DemoAwaiting),
            "demomentions" => Ok(CaseStatus::DemoMentions),
            "assigned" | "allassigned" => Ok(CaseStatus::Assigned),
            "awaitingresponse" | "allawaitingresponse" => Ok(CaseStatus::AwaitingResponse),
            "closed" | "allclosed" => Ok(CaseStatus::Closed),
            _ => Err(CaseStatusParseError(s.to_string())),
        }
    }

    /// Board column title.
    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::AutomationAssigned => "Assigned to Automation",
            CaseStatus::DemoAwaiting => "All Demo - Awaiting",
            CaseStatus::DemoMentions => "Demo - Mentions",
            CaseStatus::Assigned => "All Assigned",
            CaseStatus::AwaitingResponse => "All Awaiting response",
            CaseStatus::Closed => "All closed",
        }
    }

    /// Demo stage carried by the replica with `suffix`.
    pub fn for_replica(suffix: ReplicaSuffix) -> Self {
        match suffix {
            ReplicaSuffix::Awaiting => CaseStatus::DemoAwaiting,
            ReplicaSuffix::Mentions => CaseStatus::DemoMentions,
        }
    }

    /// Whether this is one of the demo-only stages held by replicas.
    pub fn is_demo(&self) -> bool {
        matches!(self, CaseStatus::DemoAwaiting | CaseStatus::DemoMentions)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, CaseStatus::Closed)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for CaseStatus {
    type Err = CaseStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid case status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseStatusParseError(pub String);

impl fmt::Display for CaseStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid case status: {}", self.0)
    }
}

impl std::error::Error for CaseStatusParseError {}

// ============================================================================
// WRITE OPERATIONS
// ============================================================================

/// Kind of write reported in a failure event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOperation {
    /// Full document set (create or overwrite)
    Create,
    /// Field patch on an existing document
    Update,
    Delete,
    /// Multi-document batch
    Write,
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            WriteOperation::Create => "create",
            WriteOperation::Update => "update",
            WriteOperation::Delete => "delete",
            WriteOperation::Write => "write",
        };
        write!(f, "{}", value)
    }
}

// ============================================================================
// STRING CONVERSIONS
// ============================================================================

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
