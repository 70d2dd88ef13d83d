//! End-to-end workflow scenarios over the memory store.

use caseflow_core::{
    CaseStatus, CaseflowConfig, DocId, PropertyKey, TagField, TextField, WriteOperation,
};
use caseflow_events::ErrorReporter;
use caseflow_seed::{RawCase, SeedLoader};
use caseflow_storage::{CaseFilter, CaseStore, MemoryCaseStore};
use caseflow_test_utils::{assertions, fixtures};
use caseflow_workflow::{CaseStateMachine, Command, WriteOutcome};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

struct Harness {
    store: Arc<MemoryCaseStore>,
    machine: CaseStateMachine,
    reporter: ErrorReporter,
}

async fn harness(cases: &[(&str, CaseStatus)]) -> Harness {
    let store = fixtures::seeded_store(
        cases
            .iter()
            .map(|(id, status)| fixtures::sample_case(id, *status))
            .collect(),
    )
    .await
    .unwrap();
    let reporter = ErrorReporter::new(16);
    let machine = CaseStateMachine::new(store.clone(), reporter.clone(), fixtures::config());
    Harness {
        store,
        machine,
        reporter,
    }
}

async fn status_of(store: &MemoryCaseStore, id: &str) -> Option<CaseStatus> {
    store
        .get(&DocId::from(id))
        .await
        .unwrap()
        .map(|case| case.record.status)
}

#[tokio::test]
async fn move_to_demo_writes_both_replicas_and_keeps_canonical() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;

    assert!(h.machine.move_to_demo("C1").await.is_committed());

    assert_eq!(status_of(&h.store, "C1").await, Some(CaseStatus::Assigned));
    assert_eq!(
        status_of(&h.store, "C1-demo-awaiting").await,
        Some(CaseStatus::DemoAwaiting)
    );
    assert_eq!(
        status_of(&h.store, "C1-demo-mentions").await,
        Some(CaseStatus::DemoMentions)
    );

    let replicas = h.store.list(&CaseFilter::all().replicas_only()).await.unwrap();
    assert_eq!(replicas.len(), 2);
    assert!(replicas.iter().all(|case| case.id.as_str() == "C1"));

    let canonical = h.machine.open("C1").await.unwrap().unwrap();
    for id in ["C1-demo-awaiting", "C1-demo-mentions"] {
        let replica = h.store.get(&DocId::from(id)).await.unwrap().unwrap();
        assert_eq!(replica.record.conversation, canonical.record.conversation, "{}", id);
        assert_eq!(replica.record.properties, canonical.record.properties, "{}", id);
    }
}

#[tokio::test]
async fn closing_a_replica_closes_canonical_and_drops_replicas() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;
    h.machine.move_to_demo("C1").await;

    let outcome = h
        .machine
        .change_status("C1-demo-mentions", CaseStatus::Closed)
        .await;

    assert!(outcome.is_committed());
    assert_eq!(status_of(&h.store, "C1").await, Some(CaseStatus::Closed));
    assert_eq!(status_of(&h.store, "C1-demo-awaiting").await, None);
    assert_eq!(status_of(&h.store, "C1-demo-mentions").await, None);
}

#[tokio::test]
async fn close_without_replicas_still_commits() {
    let h = harness(&[("C1", CaseStatus::AwaitingResponse)]).await;
    assert!(h.machine.change_status("C1", CaseStatus::Closed).await.is_committed());
    assert_eq!(status_of(&h.store, "C1").await, Some(CaseStatus::Closed));
}

#[tokio::test]
async fn rejected_close_leaves_everything_in_place() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;
    h.machine.move_to_demo("C1").await;
    h.store.reject_writes_to("cases/C1").unwrap();
    let mut errors = h.reporter.subscribe();

    let outcome = h.machine.change_status("C1", CaseStatus::Closed).await;

    assert!(outcome.is_rejected());
    assert_eq!(status_of(&h.store, "C1").await, Some(CaseStatus::Assigned));
    assert!(status_of(&h.store, "C1-demo-awaiting").await.is_some());
    assert!(status_of(&h.store, "C1-demo-mentions").await.is_some());

    let failures = fixtures::collect_failures(&mut errors);
    assertions::assert_single_failure(&failures, "cases/C1");
    assert_eq!(failures[0].operation, WriteOperation::Write);
}

#[tokio::test]
async fn rejected_replica_delete_leaves_canonical_open() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;
    h.machine.move_to_demo("C1").await;
    h.store.reject_writes_to("cases/C1-demo-mentions").unwrap();
    let mut errors = h.reporter.subscribe();

    let outcome = h.machine.change_status("C1", CaseStatus::Closed).await;

    assert!(outcome.is_rejected());
    assert_eq!(status_of(&h.store, "C1").await, Some(CaseStatus::Assigned));
    assert_eq!(
        status_of(&h.store, "C1-demo-awaiting").await,
        Some(CaseStatus::DemoAwaiting)
    );
    assert_eq!(
        status_of(&h.store, "C1-demo-mentions").await,
        Some(CaseStatus::DemoMentions)
    );

    let failures = fixtures::collect_failures(&mut errors);
    assertions::assert_single_failure(&failures, "cases/C1-demo-mentions");
    assert_eq!(failures[0].operation, WriteOperation::Write);
}

#[tokio::test]
async fn rejected_status_change_reports_update() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;
    h.store.reject_writes_to("cases/C1").unwrap();
    let mut errors = h.reporter.subscribe();

    let outcome = h
        .machine
        .change_status("C1", CaseStatus::AwaitingResponse)
        .await;

    match outcome {
        WriteOutcome::Rejected(failure) => {
            assert_eq!(failure.operation, WriteOperation::Update);
            assert_eq!(failure.payload["status"], "AwaitingResponse");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(status_of(&h.store, "C1").await, Some(CaseStatus::Assigned));
    assert_eq!(fixtures::collect_failures(&mut errors).len(), 1);
}

#[tokio::test]
async fn assignment_rules() {
    let h = harness(&[("C1", CaseStatus::AwaitingResponse)]).await;

    h.machine.assign("C1", &fixtures::automation_agent()).await;
    assert_eq!(
        status_of(&h.store, "C1").await,
        Some(CaseStatus::AutomationAssigned)
    );

    h.machine.assign("C1", &fixtures::human_agent()).await;
    let case = h.machine.open("C1").await.unwrap();
    assertions::assert_status(&case, CaseStatus::Assigned);
    assert_eq!(
        case.and_then(|c| c.record.assignee).map(|a| a.email),
        Some("sarah.johnson@lilly.com".to_string())
    );
}

#[tokio::test]
async fn human_assignment_keeps_stage() {
    let h = harness(&[("C1", CaseStatus::AwaitingResponse)]).await;
    assert!(h.machine.assign("C1", &fixtures::human_agent()).await.is_committed());
    assert_eq!(
        status_of(&h.store, "C1").await,
        Some(CaseStatus::AwaitingResponse)
    );
}

#[tokio::test]
async fn closed_macro_tags_and_closes_in_one_batch() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;
    h.machine.move_to_demo("C1").await;
    let version_before = h.store.snapshot().unwrap().version();

    let outcome = h
        .machine
        .apply_closed_macro(
            "C1",
            &[
                (TagField::Compliance, "PC".to_string()),
                (TagField::TopicGeneral, "Device Issue".to_string()),
                (TagField::Compliance, "AE".to_string()),
            ],
        )
        .await;

    assert!(outcome.is_committed());
    let snapshot = h.store.snapshot().unwrap();
    assert_eq!(snapshot.version(), version_before + 1);

    let case = h.machine.open("C1").await.unwrap().unwrap();
    assert_eq!(case.record.status, CaseStatus::Closed);
    assert_eq!(
        case.record.properties.compliance.as_slice(),
        &["AE".to_string(), "PC".to_string()]
    );
    assert!(case.record.properties.topic_general.contains("Device Issue"));
    assert!(!snapshot.contains(&DocId::from("C1-demo-awaiting")));
}

#[tokio::test]
async fn restore_returns_to_assigned_without_replicas() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;
    h.machine.move_to_demo("C1").await;
    h.machine.change_status("C1", CaseStatus::Closed).await;

    assert!(h.machine.restore("C1").await.is_committed());
    assert_eq!(status_of(&h.store, "C1").await, Some(CaseStatus::Assigned));
    assert_eq!(status_of(&h.store, "C1-demo-awaiting").await, None);
}

#[tokio::test]
async fn opening_a_replica_loads_the_canonical_case() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;
    h.machine.move_to_demo("C1").await;

    let case = h.machine.open("C1-demo-awaiting").await.unwrap().unwrap();
    assert!(!case.is_replica());
    assert_eq!(case.record.status, CaseStatus::Assigned);
}

#[tokio::test]
async fn missing_case_is_not_found() {
    let h = harness(&[]).await;
    let mut errors = h.reporter.subscribe();
    assert_eq!(h.machine.open("404").await.unwrap(), None);
    assert_eq!(h.machine.restore("404").await, WriteOutcome::NotFound);
    assert_eq!(h.machine.move_to_demo("404").await, WriteOutcome::NotFound);
    assert_eq!(
        h.machine.change_status("404", CaseStatus::Closed).await,
        WriteOutcome::NotFound
    );
    assert!(fixtures::collect_failures(&mut errors).is_empty());
}

#[tokio::test]
async fn tag_edits_through_a_replica_hit_the_canonical() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;
    h.machine.move_to_demo("C1").await;

    h.machine
        .add_tag("C1-demo-mentions", TagField::Brand.into(), "Humalog")
        .await;
    h.machine
        .remove_tag("C1", PropertyKey::Tag(TagField::Compliance), "AE")
        .await;
    h.machine
        .set_property("C1", TextField::Priority, Some("high".to_string()))
        .await;

    let canonical = h.machine.open("C1").await.unwrap().unwrap();
    assert!(canonical.record.properties.brand.contains("Humalog"));
    assert!(canonical.record.properties.compliance.is_empty());
    assert_eq!(canonical.record.properties.priority.as_deref(), Some("high"));

    let replica = h
        .store
        .get(&DocId::from("C1-demo-mentions"))
        .await
        .unwrap()
        .unwrap();
    assert!(replica.record.properties.brand.is_empty());
}

#[tokio::test]
async fn board_groups_every_document_by_stage() {
    let h = harness(&[
        ("C1", CaseStatus::Assigned),
        ("C2", CaseStatus::Closed),
        ("C3", CaseStatus::AutomationAssigned),
    ])
    .await;
    h.machine.move_to_demo("C1").await;

    let board = h.machine.board().await.unwrap();
    let counts: Vec<(CaseStatus, usize)> = board.iter().map(|col| (col.status, col.len())).collect();
    assert_eq!(
        counts,
        vec![
            (CaseStatus::AutomationAssigned, 1),
            (CaseStatus::DemoAwaiting, 1),
            (CaseStatus::DemoMentions, 1),
            (CaseStatus::Assigned, 1),
            (CaseStatus::AwaitingResponse, 0),
            (CaseStatus::Closed, 1),
        ]
    );
}

#[tokio::test]
async fn dispatched_commands_complete_and_notify_subscribers() {
    let h = harness(&[("C1", CaseStatus::Assigned)]).await;
    let mut watch = h.store.watch_doc(DocId::from("C1"));

    let handle = h.machine.dispatch(Command::ChangeStatus {
        case_id: "C1".to_string(),
        status: CaseStatus::AwaitingResponse,
    });

    let changed = watch.changed().await.flatten().unwrap();
    assert_eq!(changed.record.status, CaseStatus::AwaitingResponse);
    assert!(handle.await.unwrap().is_committed());
}

#[tokio::test]
async fn seeded_import_runs_through_the_workflow() {
    let config = Arc::new(CaseflowConfig::builtin());
    let loader = SeedLoader::new(
        Arc::clone(&config),
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
    );
    let raws = vec![
        RawCase {
            lilly_agent_assigned: Some("Pace".to_string()),
            ..RawCase::new("127001")
        },
        RawCase::new("127007"),
    ];
    let store = Arc::new(MemoryCaseStore::new());
    loader
        .seed(store.as_ref(), loader.normalize_all(&raws).unwrap())
        .await
        .unwrap();

    assert_eq!(
        status_of(&store, "127001").await,
        Some(CaseStatus::AutomationAssigned)
    );
    assert_eq!(status_of(&store, "127007").await, Some(CaseStatus::Closed));

    let machine = CaseStateMachine::new(store.clone(), ErrorReporter::new(4), config);
    machine.restore("127007").await;
    assert_eq!(status_of(&store, "127007").await, Some(CaseStatus::Assigned));
}
