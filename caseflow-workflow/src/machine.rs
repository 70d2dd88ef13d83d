//! Case state machine.
//!
//! Every operation first resolves the id it is given to the canonical case,
//! so a replica card or detail view always acts on the shared canonical
//! document. Mutations never return errors: failures are published on the
//! [`ErrorReporter`] and surface as [`WriteOutcome::Rejected`].

use crate::board::{group_by_stage, StageColumn};
use crate::outcome::{read_failed, settle, WriteOutcome};
use crate::replication::ReplicationManager;
use caseflow_core::{
    add_tag, remove_tag, resolve_canonical_id, Agent, Case, CaseId, CaseResult, CaseStatus,
    CaseflowConfig, PropertyKey, PropertyPatch, TagField, TextField, WriteOperation,
};
use caseflow_events::ErrorReporter;
use caseflow_storage::{BatchOp, CaseFilter, CaseStore, CaseUpdate};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Stage a case lands in after `agent` is assigned to it.
///
/// The automation agent always pulls the case into `AutomationAssigned`. Any
/// other agent moves it back to `Assigned` from there, and leaves every other
/// stage alone.
pub fn status_after_assign(current: CaseStatus, agent: &Agent, automation_email: &str) -> CaseStatus {
    if agent.is_automation(automation_email) {
        CaseStatus::AutomationAssigned
    } else if current == CaseStatus::AutomationAssigned {
        CaseStatus::Assigned
    } else {
        current
    }
}

/// A mutating operation, for fire-and-forget submission via
/// [`CaseStateMachine::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Assign { case_id: String, agent: Agent },
    ChangeStatus { case_id: String, status: CaseStatus },
    Restore { case_id: String },
    MoveToDemo { case_id: String },
    AddTag { case_id: String, key: PropertyKey, value: String },
    RemoveTag { case_id: String, key: PropertyKey, value: String },
    SetProperty { case_id: String, field: TextField, value: Option<String> },
    ApplyClosedMacro { case_id: String, tags: Vec<(TagField, String)> },
}

/// Assignment and status rules over a [`CaseStore`].
#[derive(Clone)]
pub struct CaseStateMachine {
    store: Arc<dyn CaseStore>,
    replication: ReplicationManager,
    reporter: ErrorReporter,
    config: Arc<CaseflowConfig>,
}

impl std::fmt::Debug for CaseStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseStateMachine")
            .field("automation_email", &self.config.automation_email)
            .finish_non_exhaustive()
    }
}

impl CaseStateMachine {
    pub fn new(
        store: Arc<dyn CaseStore>,
        reporter: ErrorReporter,
        config: Arc<CaseflowConfig>,
    ) -> Self {
        let replication = ReplicationManager::new(Arc::clone(&store), reporter.clone());
        Self {
            store,
            replication,
            reporter,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn CaseStore> {
        &self.store
    }

    pub fn replication(&self) -> &ReplicationManager {
        &self.replication
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn config(&self) -> &CaseflowConfig {
        &self.config
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Detail-view read. Opening a replica id loads its canonical case.
    pub async fn open(&self, id: &str) -> CaseResult<Option<Case>> {
        let case_id = resolve_canonical_id(id);
        self.store.get(&case_id.doc_id()).await
    }

    /// Every document grouped by stage, one column per stage in board order.
    pub async fn board(&self) -> CaseResult<Vec<StageColumn>> {
        let cases = self.store.list(&CaseFilter::all()).await?;
        Ok(group_by_stage(cases))
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Assign `agent` and apply the automation stage rules.
    pub async fn assign(&self, id: &str, agent: &Agent) -> WriteOutcome {
        let case = match self.load(id, WriteOperation::Update).await {
            Ok(case) => case,
            Err(outcome) => return outcome,
        };
        let status = status_after_assign(case.record.status, agent, &self.config.automation_email);

        let mut update = CaseUpdate::default().with_assignee(Some(agent.clone()));
        if status != case.record.status {
            update = update.with_status(status);
        }
        debug!(
            case_id = %case.id,
            agent = %agent.email,
            from = %case.record.status,
            to = %status,
            "Assigning case"
        );
        self.commit(vec![BatchOp::update(case.id.doc_id(), update)]).await
    }

    /// Set the stage directly. `Closed` runs the close protocol instead.
    pub async fn change_status(&self, id: &str, status: CaseStatus) -> WriteOutcome {
        if status.is_closed() {
            return self.replication.close(id).await;
        }
        let case = match self.load(id, WriteOperation::Update).await {
            Ok(case) => case,
            Err(outcome) => return outcome,
        };
        debug!(case_id = %case.id, from = %case.record.status, to = %status, "Changing status");
        self.commit(vec![BatchOp::update(case.id.doc_id(), CaseUpdate::status(status))])
            .await
    }

    /// Move a case back to `Assigned`, whatever stage it is in.
    ///
    /// Replicas deleted by the close are not recreated.
    pub async fn restore(&self, id: &str) -> WriteOutcome {
        let case = match self.load(id, WriteOperation::Update).await {
            Ok(case) => case,
            Err(outcome) => return outcome,
        };
        info!(case_id = %case.id, from = %case.record.status, "Restoring case");
        self.commit(vec![BatchOp::update(
            case.id.doc_id(),
            CaseUpdate::status(CaseStatus::Assigned),
        )])
        .await
    }

    /// Write the demo replicas. The canonical status is untouched.
    pub async fn move_to_demo(&self, id: &str) -> WriteOutcome {
        self.replication.replicate(id).await
    }

    // ========================================================================
    // PROPERTIES
    // ========================================================================

    pub async fn add_tag(&self, id: &str, key: PropertyKey, value: &str) -> WriteOutcome {
        let case = match self.load(id, WriteOperation::Update).await {
            Ok(case) => case,
            Err(outcome) => return outcome,
        };
        let next = add_tag(&case.record.properties, key, value);
        self.write_property(&case.id, next.patch_for(key)).await
    }

    pub async fn remove_tag(&self, id: &str, key: PropertyKey, value: &str) -> WriteOutcome {
        let case = match self.load(id, WriteOperation::Update).await {
            Ok(case) => case,
            Err(outcome) => return outcome,
        };
        let next = remove_tag(&case.record.properties, key, value);
        self.write_property(&case.id, next.patch_for(key)).await
    }

    /// Set or clear one scalar property.
    pub async fn set_property(&self, id: &str, field: TextField, value: Option<String>) -> WriteOutcome {
        let case = match self.load(id, WriteOperation::Update).await {
            Ok(case) => case,
            Err(outcome) => return outcome,
        };
        self.write_property(&case.id, PropertyPatch::text(field, value)).await
    }

    /// Apply the selected tags and close the case, all in one batch.
    pub async fn apply_closed_macro(&self, id: &str, tags: &[(TagField, String)]) -> WriteOutcome {
        let case = match self.load(id, WriteOperation::Write).await {
            Ok(case) => case,
            Err(outcome) => return outcome,
        };
        let mut properties = case.record.properties.clone();
        let mut touched: Vec<TagField> = Vec::new();
        for (field, value) in tags {
            properties = add_tag(&properties, (*field).into(), value);
            if !touched.contains(field) {
                touched.push(*field);
            }
        }
        let update = touched
            .into_iter()
            .fold(CaseUpdate::default(), |update, field| {
                update.with_property(properties.patch_for(field.into()))
            });
        info!(case_id = %case.id, tags = tags.len(), "Applying closed macro");
        self.replication.close_with(case.id.as_str(), update).await
    }

    // ========================================================================
    // FIRE AND FORGET
    // ========================================================================

    /// Run `command` to completion.
    pub async fn execute(&self, command: Command) -> WriteOutcome {
        match command {
            Command::Assign { case_id, agent } => self.assign(&case_id, &agent).await,
            Command::ChangeStatus { case_id, status } => self.change_status(&case_id, status).await,
            Command::Restore { case_id } => self.restore(&case_id).await,
            Command::MoveToDemo { case_id } => self.move_to_demo(&case_id).await,
            Command::AddTag { case_id, key, value } => self.add_tag(&case_id, key, &value).await,
            Command::RemoveTag { case_id, key, value } => {
                self.remove_tag(&case_id, key, &value).await
            }
            Command::SetProperty {
                case_id,
                field,
                value,
            } => self.set_property(&case_id, field, value).await,
            Command::ApplyClosedMacro { case_id, tags } => {
                self.apply_closed_macro(&case_id, &tags).await
            }
        }
    }

    /// Submit `command` on the runtime and return immediately.
    ///
    /// Failures still reach the reporter; awaiting the handle is optional.
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, command: Command) -> JoinHandle<WriteOutcome> {
        let machine = self.clone();
        tokio::spawn(async move { machine.execute(command).await })
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// Canonical case behind `id`, read before an `operation` on it.
    ///
    /// The error side is the outcome to return: `NotFound`, or a reported
    /// read failure naming the canonical document.
    async fn load(&self, id: &str, operation: WriteOperation) -> Result<Case, WriteOutcome> {
        let doc_id = resolve_canonical_id(id).doc_id();
        match self.store.get(&doc_id).await {
            Ok(Some(case)) => Ok(case),
            Ok(None) => {
                debug!(doc_id = %doc_id, "Case not found");
                Err(WriteOutcome::NotFound)
            }
            Err(e) => Err(read_failed(&doc_id, operation, e, &self.reporter)),
        }
    }

    async fn write_property(&self, case_id: &CaseId, patch: PropertyPatch) -> WriteOutcome {
        debug!(case_id = %case_id, field = %patch.key, "Writing property");
        self.commit(vec![BatchOp::update(case_id.doc_id(), CaseUpdate::property(patch))])
            .await
    }

    async fn commit(&self, ops: Vec<BatchOp>) -> WriteOutcome {
        let result = self.store.apply_atomic(ops.clone()).await;
        settle(result, &ops, &self.reporter)
    }
}



#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_status() -> impl Strategy<Value = CaseStatus> {
        proptest::sample::select(CaseStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_assign_is_idempotent(
            status in arb_status(),
            automation in any::<bool>()
        ) {
            let email = if automation { "pace@zamp.ai" } else { "qa@lilly.com" };
            let agent = Agent::new("1", "A", email, "");
            let once = status_after_assign(status, &agent, "pace@zamp.ai");
            let twice = status_after_assign(once, &agent, "pace@zamp.ai");
            prop_assert_eq!(once, twice);
        }
    }
}
