//! Caseflow Workflow - Case State Machine and Demo Replication
//!
//! Moves cases through the pipeline stages, keeps the automation-agent
//! assignment rules, writes demo replicas and runs the atomic close protocol.
//! All writes go through a [`caseflow_storage::CaseStore`]; failures are
//! published on a [`caseflow_events::ErrorReporter`].

mod board;
mod machine;
mod outcome;
mod replication;

pub use board::{group_by_stage, StageColumn};
pub use machine::{status_after_assign, CaseStateMachine, Command};
pub use outcome::WriteOutcome;
pub use replication::ReplicationManager;
