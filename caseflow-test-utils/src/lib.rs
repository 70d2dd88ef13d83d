//! Caseflow Test Utilities
//!
//! Shared test infrastructure for the Caseflow workspace:
//! - Proptest generators for ids, stages and property bags
//! - Fixtures for cases, agents and seeded stores
//! - Assertions over write outcomes and reported failures

pub use caseflow_core::{
    Agent, Case, CaseError, CaseId, CaseRecord, CaseResult, CaseStatus, CaseflowConfig, DocId,
    Message, Properties, PropertyKey, Reporter, StorageError, TagField, TagSet, TextField,
    WriteFailure,
};
pub use caseflow_events::{ErrorReporter, ErrorSubscription};
pub use caseflow_storage::{CaseStore, MemoryCaseStore};

use std::sync::Arc;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Caseflow types.

    use super::*;
    use proptest::prelude::*;

    /// Canonical case id, numeric like the intake system's.
    pub fn arb_case_id() -> impl Strategy<Value = CaseId> {
        "[1-9][0-9]{1,5}".prop_map(CaseId::new)
    }

    pub fn arb_status() -> impl Strategy<Value = CaseStatus> {
        proptest::sample::select(CaseStatus::ALL.to_vec())
    }

    pub fn arb_tag_field() -> impl Strategy<Value = TagField> {
        proptest::sample::select(TagField::ALL.to_vec())
    }

    pub fn arb_text_field() -> impl Strategy<Value = TextField> {
        proptest::sample::select(TextField::ALL.to_vec())
    }

    /// Any property key, tag or scalar.
    pub fn arb_property_key() -> impl Strategy<Value = PropertyKey> {
        prop_oneof![
            arb_tag_field().prop_map(PropertyKey::from),
            arb_text_field().prop_map(PropertyKey::from),
        ]
    }

    /// Short tag value drawn from a small alphabet so collisions happen.
    pub fn arb_tag_value() -> impl Strategy<Value = String> {
        "[a-d]{1,2}"
    }

    pub fn arb_tag_set() -> impl Strategy<Value = TagSet> {
        prop::collection::vec(arb_tag_value(), 0..5).prop_map(TagSet::from)
    }

    /// Property bag with random tags on every tag field and random scalars.
    pub fn arb_properties() -> impl Strategy<Value = Properties> {
        (
            prop::collection::vec(arb_tag_set(), TagField::ALL.len()),
            prop::collection::vec(
                proptest::option::of("[A-Za-z ]{1,10}"),
                TextField::ALL.len(),
            ),
            0u32..10,
        )
            .prop_map(|(tags, texts, messages)| {
                let mut props = Properties {
                    associated_messages: messages,
                    ..Properties::default()
                };
                for (field, set) in TagField::ALL.into_iter().zip(tags) {
                    *props.tags_mut(field) = set;
                }
                for (field, value) in TextField::ALL.into_iter().zip(texts) {
                    props.set_text(field, value);
                }
                props
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;

    pub const AUTOMATION_EMAIL: &str = "pace@zamp.ai";

    pub fn automation_agent() -> Agent {
        Agent::new("1", "Pace", AUTOMATION_EMAIL, "https://picsum.photos/seed/pace/40/40")
    }

    pub fn human_agent() -> Agent {
        Agent::new(
            "4",
            "Sarah Johnson",
            "sarah.johnson@lilly.com",
            "https://picsum.photos/seed/sarah/40/40",
        )
    }

    pub fn config() -> Arc<CaseflowConfig> {
        Arc::new(CaseflowConfig::builtin())
    }

    /// Case record in `status` with a small property bag.
    pub fn sample_record(status: CaseStatus) -> CaseRecord {
        let avatar_url = "https://picsum.photos/seed/user0/40/40".to_string();
        let mut properties = Properties {
            priority: Some("medium".to_string()),
            region: Some("US".to_string()),
            associated_messages: 1,
            ..Properties::default()
        };
        properties.compliance.insert("AE");
        CaseRecord {
            title: "Dizziness after dose change...".to_string(),
            preview: "Dizziness after dose change".to_string(),
            status,
            assignee: None,
            created_at: "2 days ago".to_string(),
            source: "Twitter".to_string(),
            user: Reporter {
                name: "Jane Doe".to_string(),
                handle: "@janedoe".to_string(),
                avatar_url: avatar_url.clone(),
            },
            conversation: vec![Message {
                id: "msg1".to_string(),
                author: "Jane Doe".to_string(),
                avatar_url,
                text: "Dizziness after dose change".to_string(),
                timestamp: "2 days ago".to_string(),
            }],
            properties,
        }
    }

    pub fn sample_case(id: &str, status: CaseStatus) -> Case {
        Case::canonical(id, sample_record(status))
    }

    /// Memory store holding `cases`.
    pub async fn seeded_store(cases: Vec<Case>) -> CaseResult<Arc<MemoryCaseStore>> {
        let store = Arc::new(MemoryCaseStore::new());
        store.seed_bulk(cases).await?;
        Ok(store)
    }

    /// Every failure already delivered to `subscription`.
    pub fn collect_failures(subscription: &mut ErrorSubscription) -> Vec<WriteFailure> {
        subscription.drain()
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over store contents and reported failures.

    use super::*;

    /// Assert the document `id` exists and is in `status`.
    #[track_caller]
    pub fn assert_status(case: &Option<Case>, status: CaseStatus) {
        match case {
            Some(case) => assert_eq!(case.record.status, status, "wrong stage for {}", case.id),
            None => panic!("Expected a case in {:?}, got none", status),
        }
    }

    /// Assert exactly one failure was reported and it names `path`.
    #[track_caller]
    pub fn assert_single_failure(failures: &[WriteFailure], path: &str) {
        assert_eq!(failures.len(), 1, "Expected one failure, got: {:?}", failures);
        assert_eq!(failures[0].path, path);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sample_case_is_canonical() {
        let case = fixtures::sample_case("49", CaseStatus::Assigned);
        assert!(!case.is_replica());
        assert_eq!(case.doc_id().path(), "cases/49");
    }

    #[test]
    fn test_fixture_agents_match_builtin_roster() {
        let config = fixtures::config();
        assert_eq!(config.automation_agent(), Some(&fixtures::automation_agent()));
        assert_eq!(config.agent_by_name("Sarah Johnson"), Some(&fixtures::human_agent()));
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let store = fixtures::seeded_store(vec![
            fixtures::sample_case("1", CaseStatus::Assigned),
            fixtures::sample_case("2", CaseStatus::Closed),
        ])
        .await
        .unwrap();
        assert_eq!(store.doc_count().unwrap(), 2);
        let case = store.get(&DocId::from("2")).await.unwrap();
        assertions::assert_status(&case, CaseStatus::Closed);
    }

    proptest! {
        #[test]
        fn prop_arb_properties_tag_sets_have_no_duplicates(props in generators::arb_properties()) {
            for field in TagField::ALL {
                let tags = props.tags(field).as_slice();
                for (i, tag) in tags.iter().enumerate() {
                    prop_assert!(!tags[i + 1..].contains(tag));
                }
            }
        }

        #[test]
        fn prop_arb_case_id_is_canonical(id in generators::arb_case_id()) {
            prop_assert!(!id.doc_id().is_replica());
        }
    }
}
