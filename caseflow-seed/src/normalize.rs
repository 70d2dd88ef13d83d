//! Raw record to case normalization rules

use crate::humanize::humanize_raw;
use crate::raw::{present, RawCase};
use caseflow_core::{
    Agent, Case, CaseRecord, CaseStatus, CaseflowConfig, Message, Properties, Reporter, TagField,
    TagSet, Timestamp,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Line marker meaning no agent was assigned.
const UNASSIGNED_SENTINEL: &str = "Not specified";

/// Report types that carry a compliance tag of the same name.
const COMPLIANCE_REPORT_TYPES: [&str; 3] = ["AE", "PC", "AE and PC"];

const TITLE_CHARS: usize = 50;

static REPORTER_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(.*) \((.*)\)").ok());

/// Reporter name and handle parsed from free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReporter {
    pub name: String,
    pub handle: String,
}

/// Split `"<name> (<handle>)"`. Anything else becomes the name, with a handle
/// derived from it.
pub fn parse_reporter(text: &str) -> ParsedReporter {
    if let Some(caps) = REPORTER_PATTERN.as_ref().and_then(|re| re.captures(text)) {
        return ParsedReporter {
            name: caps[1].to_string(),
            handle: caps[2].to_string(),
        };
    }
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    ParsedReporter {
        name: text.to_string(),
        handle: format!("@{}", slug),
    }
}

/// Display channel for a raw intake channel.
pub fn map_channel(raw: &str) -> String {
    match raw {
        "Unknown" => "Twitter".to_string(),
        "Facebook" => "Meta".to_string(),
        other => other.to_string(),
    }
}

/// Roster agent named on the first line of `text`, matched exactly.
pub fn resolve_agent<'a>(config: &'a CaseflowConfig, text: &str) -> Option<&'a Agent> {
    if text.contains(UNASSIGNED_SENTINEL) {
        return None;
    }
    let name = text.split('\n').next().unwrap_or_default().trim();
    config.agent_by_name(name)
}

/// `{report_type}` for the compliance report types, empty otherwise.
pub fn compliance_tags_for(report_type: &str) -> TagSet {
    if COMPLIANCE_REPORT_TYPES.contains(&report_type) {
        std::iter::once(report_type).collect()
    } else {
        TagSet::new()
    }
}

fn title_for(details: &str) -> String {
    let head: String = details.chars().take(TITLE_CHARS).collect();
    format!("{}...", head)
}

fn audience_for(respondent_type: Option<&str>) -> TagSet {
    match respondent_type {
        Some("HCP") => std::iter::once("Health Care Provider").collect(),
        Some(other) => std::iter::once(other).collect(),
        None => TagSet::new(),
    }
}

fn initial_status(config: &CaseflowConfig, case_id: &str, agent: Option<&Agent>) -> CaseStatus {
    if config.override_for(case_id).is_some_and(|o| o.marks_closed()) {
        CaseStatus::Closed
    } else if agent.is_some_and(|a| a.is_automation(&config.automation_email)) {
        CaseStatus::AutomationAssigned
    } else {
        CaseStatus::Assigned
    }
}

fn raw_text(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_string)
}

/// Build the property bag: defaults, then raw fields, then curated overrides.
fn properties_for(config: &CaseflowConfig, raw: &RawCase, channel: &str) -> Properties {
    let defaults = &config.seed.defaults;
    let placeholder = || Some(config.seed.placeholder.clone());
    let negative = || Some(config.seed.negative_placeholder.clone());
    let report_type = raw_text(&raw.report_type);

    let mut props = Properties {
        status: Some(defaults.status.clone()),
        priority: Some(defaults.priority.clone()),
        sla_status: Some(defaults.sla_status.clone()),
        report_type: report_type.clone(),
        products: present(&raw.lilly_products)
            .filter(|p| *p != "Unknown")
            .into_iter()
            .collect(),
        language: Some(defaults.language.clone()),
        country: Some(defaults.country.clone()),
        associated_messages: defaults.associated_messages,
        custom_status: Some(defaults.custom_status.clone()),
        channel: Some(channel.to_string()),
        region: Some(defaults.region.clone()),
        audience: audience_for(present(&raw.respondent_type)),
        compliance: compliance_tags_for(report_type.as_deref().unwrap_or_default()),
        issue_type: placeholder(),
        theme_matches: placeholder(),
        topic_matches: placeholder(),
        topic_group_matches: placeholder(),
        sourced_from_listening: negative(),
        sourced_from_ctm: negative(),
        ctm_ad_id: placeholder(),
        initial_message_privacy: placeholder(),
        hcp_type: raw_text(&raw.hcp_type),
        patient_gender: raw_text(&raw.patient_gender),
        patient_age: raw_text(&raw.patient_age),
        contacted_poster: raw_text(&raw.contacted_poster).or_else(negative),
        poster_consent: raw_text(&raw.poster_consent).or_else(negative),
        poster_contact_info: raw_text(&raw.poster_contact_info),
        lot_control_number: present(&raw.lot_control_number).map(|lot| format!("#{} (Unknown)", lot)),
        ..Properties::default()
    };

    if let Some(extra) = config.override_for(&raw.case_id) {
        if let Some(priority) = &extra.priority {
            props.priority = Some(priority.clone());
        }
        if let Some(country) = &extra.country {
            props.country = Some(country.clone());
        }
        if let Some(count) = extra.associated_messages {
            props.associated_messages = count;
        }
        if let Some(custom_status) = &extra.custom_status {
            props.custom_status = Some(custom_status.clone());
        }
        if let Some(region) = &extra.region {
            props.region = Some(region.clone());
        }
        for field in TagField::ALL {
            props.tags_mut(field).union_with(extra.tags(field).iter());
        }
    }
    props
}

/// Normalize one raw record. Pure and deterministic for a fixed `as_of`.
pub fn normalize(config: &CaseflowConfig, raw: &RawCase, as_of: Timestamp) -> Case {
    let reporter = parse_reporter(present(&raw.reporter_information).unwrap_or("Unknown"));
    let agent = raw
        .lilly_agent_assigned
        .as_deref()
        .and_then(|text| resolve_agent(config, text));
    let channel = map_channel(present(&raw.channel).unwrap_or("Unknown"));
    let details = raw.ae_pc_details.clone().unwrap_or_default();
    let avatar_url = config.seed.avatar_for(&raw.case_id);
    let received = present(&raw.receipt_date)
        .map(|date| humanize_raw(date, as_of))
        .unwrap_or_else(|| config.seed.placeholder.clone());

    let record = CaseRecord {
        title: title_for(&details),
        preview: details.clone(),
        status: initial_status(config, &raw.case_id, agent),
        assignee: agent.cloned(),
        created_at: received.clone(),
        source: channel.clone(),
        user: Reporter {
            name: reporter.name.clone(),
            handle: reporter.handle,
            avatar_url: avatar_url.clone(),
        },
        conversation: vec![Message {
            id: "msg1".to_string(),
            author: reporter.name,
            avatar_url,
            text: details,
            timestamp: received,
        }],
        properties: properties_for(config, raw, &channel),
    };
    Case::canonical(raw.case_id.as_str(), record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn as_of() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn raw(case_id: &str) -> RawCase {
        RawCase {
            channel: Some("Facebook".to_string()),
            lilly_agent_assigned: Some("Sarah Johnson\nAssigned 2025-05-28".to_string()),
            reporter_information: Some("Jane Doe (@janedoe)".to_string()),
            receipt_date: Some("2025-05-29".to_string()),
            lilly_products: Some("Humalog".to_string()),
            respondent_type: Some("HCP".to_string()),
            ae_pc_details: Some(
                "Patient reported dizziness and nausea two days after switching pens".to_string(),
            ),
            report_type: Some("AE".to_string()),
            lot_control_number: Some("D123456".to_string()),
            ..RawCase::new(case_id)
        }
    }

    #[test]
    fn test_parse_reporter_with_handle() {
        assert_eq!(
            parse_reporter("Jane Doe (@janedoe)"),
            ParsedReporter {
                name: "Jane Doe".to_string(),
                handle: "@janedoe".to_string()
            }
        );
    }

    #[test]
    fn test_parse_reporter_without_handle() {
        assert_eq!(
            parse_reporter("Jane Doe"),
            ParsedReporter {
                name: "Jane Doe".to_string(),
                handle: "@jane_doe".to_string()
            }
        );
    }

    #[test]
    fn test_map_channel() {
        assert_eq!(map_channel("Unknown"), "Twitter");
        assert_eq!(map_channel("Facebook"), "Meta");
        assert_eq!(map_channel("Email"), "Email");
    }

    #[test]
    fn test_compliance_tags_for() {
        assert_eq!(compliance_tags_for("AE").as_slice(), &["AE".to_string()]);
        assert_eq!(compliance_tags_for("AE and PC").len(), 1);
        assert!(compliance_tags_for("Spam").is_empty());
    }

    #[test]
    fn test_resolve_agent() {
        let config = CaseflowConfig::builtin();
        assert_eq!(
            resolve_agent(&config, "  Mike Chen  \nsecond line").map(|a| a.id.as_str()),
            Some("6")
        );
        assert!(resolve_agent(&config, "Not specified").is_none());
        assert!(resolve_agent(&config, "mike chen").is_none());
        assert!(resolve_agent(&config, "Nobody").is_none());
    }

    #[test]
    fn test_normalize_full_record() {
        let config = CaseflowConfig::builtin();
        let case = normalize(&config, &raw("900"), as_of());
        let record = &case.record;

        assert_eq!(case.id.as_str(), "900");
        assert_eq!(record.status, CaseStatus::Assigned);
        assert_eq!(record.assignee.as_ref().map(|a| a.name.as_str()), Some("Sarah Johnson"));
        assert_eq!(record.source, "Meta");
        assert_eq!(record.created_at, "3 days ago");
        assert_eq!(record.title.chars().count(), TITLE_CHARS + 3);
        assert!(record.title.ends_with("..."));
        assert_eq!(record.user.handle, "@janedoe");
        assert_eq!(record.user.avatar_url, "https://picsum.photos/seed/user900/40/40");
        assert_eq!(record.conversation.len(), 1);
        assert_eq!(record.conversation[0].id, "msg1");
        assert_eq!(record.conversation[0].author, "Jane Doe");

        let props = &record.properties;
        assert_eq!(props.channel.as_deref(), Some("Meta"));
        assert!(props.audience.contains("Health Care Provider"));
        assert!(props.compliance.contains("AE"));
        assert!(props.products.contains("Humalog"));
        assert_eq!(props.lot_control_number.as_deref(), Some("#D123456 (Unknown)"));
        assert_eq!(props.issue_type.as_deref(), Some("Click to Add"));
        assert_eq!(props.sourced_from_ctm.as_deref(), Some("No"));
        assert_eq!(props.region.as_deref(), Some("FRANCE"));
        assert_eq!(props.hcp_type, None);
    }

    #[test]
    fn test_normalize_sparse_record() {
        let config = CaseflowConfig::builtin();
        let case = normalize(&config, &RawCase::new("901"), as_of());
        let record = &case.record;
        assert_eq!(record.source, "Twitter");
        assert_eq!(record.assignee, None);
        assert_eq!(record.title, "...");
        assert_eq!(record.user.handle, "@unknown");
        assert!(record.properties.products.is_empty());
        assert!(record.properties.compliance.is_empty());
        assert_eq!(record.properties.report_type, None);
        assert_eq!(record.properties.lot_control_number, None);
        assert_eq!(record.properties.contacted_poster.as_deref(), Some("No"));
    }

    #[test]
    fn test_unknown_products_are_dropped() {
        let config = CaseflowConfig::builtin();
        let mut input = raw("902");
        input.lilly_products = Some("Unknown".to_string());
        let case = normalize(&config, &input, as_of());
        assert!(case.record.properties.products.is_empty());
    }

    #[test]
    fn test_automation_agent_seeds_automation_stage() {
        let config = CaseflowConfig::builtin();
        let mut input = raw("903");
        input.lilly_agent_assigned = Some("Pace".to_string());
        let case = normalize(&config, &input, as_of());
        assert_eq!(case.record.status, CaseStatus::AutomationAssigned);
    }

    #[test]
    fn test_overrides_merge() {
        let config = CaseflowConfig::builtin();
        let mut input = raw("127013");
        input.report_type = Some("PC".to_string());
        let case = normalize(&config, &input, as_of());
        let props = &case.record.properties;
        assert_eq!(props.priority.as_deref(), Some("very high"));
        assert_eq!(props.region.as_deref(), Some("US"));
        assert_eq!(props.associated_messages, 3);
        // PC from the report type and from the override collapse into one
        assert_eq!(props.compliance.as_slice(), &["PC".to_string(), "Broken Seal".to_string()]);
        assert_eq!(props.products.len(), 1);
    }

    #[test]
    fn test_closed_override_seeds_closed() {
        let config = CaseflowConfig::builtin();
        let case = normalize(&config, &raw("127007"), as_of());
        assert_eq!(case.record.status, CaseStatus::Closed);
        assert!(case.record.properties.products.contains("Alimta"));
        assert!(case.record.properties.products.contains("Humalog"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let config = CaseflowConfig::builtin();
        let input = raw("127002");
        assert_eq!(normalize(&config, &input, as_of()), normalize(&config, &input, as_of()));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_plain_reporter_handle_has_no_whitespace(name in "[A-Za-z]{1,8}( [A-Za-z]{1,8}){0,2}") {
            let parsed = parse_reporter(&name);
            prop_assert_eq!(&parsed.name, &name);
            prop_assert!(parsed.handle.starts_with('@'));
            prop_assert!(!parsed.handle.chars().any(char::is_whitespace));
        }

        #[test]
        fn prop_normalize_is_deterministic(
            case_id in "[0-9]{1,6}",
            details in "[ -~]{0,80}",
            report_type in proptest::option::of(prop_oneof![
                Just("AE".to_string()), Just("PC".to_string()), Just("Spam".to_string())
            ])
        ) {
            let config = CaseflowConfig::builtin();
            let as_of = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
            let raw = RawCase {
                ae_pc_details: Some(details),
                report_type,
                ..RawCase::new(case_id)
            };
            prop_assert_eq!(normalize(&config, &raw, as_of), normalize(&config, &raw, as_of));
        }
    }
}
