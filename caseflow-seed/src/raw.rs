//! Raw import record shape

use serde::{Deserialize, Serialize};

/// Top-level shape of an import file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImport {
    #[serde(default)]
    pub cases: Vec<RawCase>,
}

/// One case as exported by the intake system.
///
/// Only `case_id` is guaranteed. Every other field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCase {
    pub case_id: String,
    pub extraction_timestamp: Option<String>,
    pub channel: Option<String>,
    pub lilly_agent_assigned: Option<String>,
    pub reporter_information: Option<String>,
    pub receipt_date: Option<String>,
    pub lilly_products: Option<String>,
    pub respondent_type: Option<String>,
    pub hcp_type: Option<String>,
    pub patient_gender: Option<String>,
    pub patient_age: Option<String>,
    pub ae_pc_details: Option<String>,
    pub report_type: Option<String>,
    pub contacted_poster: Option<String>,
    pub poster_consent: Option<String>,
    pub poster_contact_info: Option<String>,
    pub lot_control_number: Option<String>,
}

impl RawCase {
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            ..Self::default()
        }
    }
}

/// Trimmed, non-empty value of an optional raw field.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_none() {
        let import: RawImport = serde_json::from_str(r#"{"cases":[{"case_id":"49"}]}"#).unwrap();
        assert_eq!(import.cases, vec![RawCase::new("49")]);
    }

    #[test]
    fn test_present_ignores_blank() {
        assert_eq!(present(&Some("  ".to_string())), None);
        assert_eq!(present(&Some(" AE ".to_string())), Some("AE"));
        assert_eq!(present(&None), None);
    }
}
