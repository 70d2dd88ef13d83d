//! Case property bag and its typed field addressing.
//!
//! Every field of the bag is reachable through [`PropertyKey`]: tag fields
//! through [`TagField`], scalar text fields through [`TextField`]. The wire
//! names parsed by `PropertyKey::from_str` are the persisted document keys.

use crate::{CaseError, CaseResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TAG SET
// ============================================================================

/// Multi-valued tag field with set semantics.
///
/// Keeps first-insertion order so persisted arrays are stable, but never holds
/// a duplicate. Deserializing an array with duplicates collapses them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`. Returns false if it was already present.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    /// Remove `value`. Returns false if it was absent.
    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|v| v != value);
        self.0.len() != before
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    /// Set union, keeping `self`'s order and appending new values from `other`.
    pub fn union_with<'a, I>(&mut self, other: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for value in other {
            self.insert(value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for TagSet {
    fn from(values: Vec<String>) -> Self {
        let mut set = TagSet::new();
        for value in values {
            set.insert(value);
        }
        set
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.0
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = TagSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

// ============================================================================
// FIELD KEYS
// ============================================================================

/// The fixed set of multi-valued tag fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TagField {
    Corporate,
    Audience,
    Compliance,
    TherapeuticArea,
    TopicGeneral,
    Brand,
    LillyHealthApp,
    Products,
}

impl TagField {
    pub const ALL: [TagField; 8] = [
        TagField::Corporate,
        TagField::Audience,
        TagField::Compliance,
        TagField::TherapeuticArea,
        TagField::TopicGeneral,
        TagField::Brand,
        TagField::LillyHealthApp,
        TagField::Products,
    ];

    /// Key used in the persisted document.
    pub fn wire_name(&self) -> &'static str {
        match self {
            TagField::Corporate => "corporate",
            TagField::Audience => "audience",
            TagField::Compliance => "compliance",
            TagField::TherapeuticArea => "therapeuticArea",
            TagField::TopicGeneral => "topicGeneral",
            TagField::Brand => "brand",
            TagField::LillyHealthApp => "lillyHealthApp",
            TagField::Products => "products",
        }
    }

    fn from_wire(name: &str) -> Option<Self> {
        match name {
            "corporate" => Some(TagField::Corporate),
            "audience" => Some(TagField::Audience),
            "compliance" => Some(TagField::Compliance),
            "therapeuticArea" => Some(TagField::TherapeuticArea),
            "topicGeneral" => Some(TagField::TopicGeneral),
            "brand" => Some(TagField::Brand),
            "lillyHealthApp" => Some(TagField::LillyHealthApp),
            "products" | "lilly_products" => Some(TagField::Products),
            _ => None,
        }
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Scalar text fields of the property bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextField {
    Status,
    Priority,
    SlaStatus,
    ReportType,
    Language,
    Country,
    CustomStatus,
    Channel,
    Region,
    IssueType,
    ThemeMatches,
    TopicMatches,
    TopicGroupMatches,
    SourcedFromListening,
    SourcedFromCtm,
    CtmAdId,
    InitialMessagePrivacy,
    HcpType,
    PatientGender,
    PatientAge,
    ContactedPoster,
    PosterConsent,
    PosterContactInfo,
    LotControlNumber,
}

impl TextField {
    pub const ALL: [TextField; 24] = [
        TextField::Status,
        TextField::Priority,
        TextField::SlaStatus,
        TextField::ReportType,
        TextField::Language,
        TextField::Country,
        TextField::CustomStatus,
        TextField::Channel,
        TextField::Region,
        TextField::IssueType,
        TextField::ThemeMatches,
        TextField::TopicMatches,
        TextField::TopicGroupMatches,
        TextField::SourcedFromListening,
        TextField::SourcedFromCtm,
        TextField::CtmAdId,
        TextField::InitialMessagePrivacy,
        TextField::HcpType,
        TextField::PatientGender,
        TextField::PatientAge,
        TextField::ContactedPoster,
        TextField::PosterConsent,
        TextField::PosterContactInfo,
        TextField::LotControlNumber,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            TextField::Status => "status",
            TextField::Priority => "priority",
            TextField::SlaStatus => "slaStatus",
            TextField::ReportType => "report_type",
            TextField::Language => "language",
            TextField::Country => "country",
            TextField::CustomStatus => "customStatus",
            TextField::Channel => "channel",
            TextField::Region => "region",
            TextField::IssueType => "issueType",
            TextField::ThemeMatches => "themeMatches",
            TextField::TopicMatches => "topicMatches",
            TextField::TopicGroupMatches => "topicGroupMatches",
            TextField::SourcedFromListening => "sourcedFromListening",
            TextField::SourcedFromCtm => "sourcedFromCTM",
            TextField::CtmAdId => "ctmAdId",
            TextField::InitialMessagePrivacy => "initialMessagePrivacy",
            TextField::HcpType => "hcpType",
            TextField::PatientGender => "patientGender",
            TextField::PatientAge => "patientAge",
            TextField::ContactedPoster => "contactedPoster",
            TextField::PosterConsent => "posterConsent",
            TextField::PosterContactInfo => "posterContactInfo",
            TextField::LotControlNumber => "lotControlNumber",
        }
    }

    fn from_wire(name: &str) -> Option<Self> {
        TextField::ALL.into_iter().find(|field| field.wire_name() == name)
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Address of one field in the property bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    Tag(TagField),
    Text(TextField),
}

impl PropertyKey {
    pub fn wire_name(&self) -> &'static str {
        match self {
            PropertyKey::Tag(field) => field.wire_name(),
            PropertyKey::Text(field) => field.wire_name(),
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, PropertyKey::Tag(_))
    }
}

impl From<TagField> for PropertyKey {
    fn from(field: TagField) -> Self {
        PropertyKey::Tag(field)
    }
}

impl From<TextField> for PropertyKey {
    fn from(field: TextField) -> Self {
        PropertyKey::Text(field)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for PropertyKey {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(field) = TagField::from_wire(s) {
            return Ok(PropertyKey::Tag(field));
        }
        if let Some(field) = TextField::from_wire(s) {
            return Ok(PropertyKey::Text(field));
        }
        Err(ValidationError::UnknownProperty {
            name: s.to_string(),
        }
        .into())
    }
}

// ============================================================================
// PROPERTY BAG
// ============================================================================

/// Properties of a case.
///
/// Absent scalars serialize as explicit `null`. Tag arrays are always
/// present; an empty array means unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub sla_status: Option<String>,
    #[serde(rename = "report_type")]
    pub report_type: Option<String>,
    #[serde(default, alias = "lilly_products")]
    pub products: TagSet,
    pub language: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "associated_messages", default)]
    pub associated_messages: u32,
    pub custom_status: Option<String>,
    pub channel: Option<String>,
    pub region: Option<String>,

    // Tag fields
    #[serde(default)]
    pub corporate: TagSet,
    #[serde(default)]
    pub audience: TagSet,
    #[serde(default)]
    pub compliance: TagSet,
    #[serde(default)]
    pub therapeutic_area: TagSet,
    #[serde(default)]
    pub topic_general: TagSet,
    #[serde(default)]
    pub brand: TagSet,
    #[serde(default)]
    pub lilly_health_app: TagSet,

    // Display fields
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub theme_matches: Option<String>,
    #[serde(default)]
    pub topic_matches: Option<String>,
    #[serde(default)]
    pub topic_group_matches: Option<String>,
    #[serde(default)]
    pub sourced_from_listening: Option<String>,
    #[serde(rename = "sourcedFromCTM", default)]
    pub sourced_from_ctm: Option<String>,
    #[serde(default)]
    pub ctm_ad_id: Option<String>,
    #[serde(default)]
    pub initial_message_privacy: Option<String>,
    #[serde(default)]
    pub hcp_type: Option<String>,
    #[serde(default)]
    pub patient_gender: Option<String>,
    #[serde(default)]
    pub patient_age: Option<String>,
    #[serde(default)]
    pub contacted_poster: Option<String>,
    #[serde(default)]
    pub poster_consent: Option<String>,
    #[serde(default)]
    pub poster_contact_info: Option<String>,
    #[serde(default)]
    pub lot_control_number: Option<String>,
}

impl Properties {
    pub fn tags(&self, field: TagField) -> &TagSet {
        match field {
            TagField::Corporate => &self.corporate,
            TagField::Audience => &self.audience,
            TagField::Compliance => &self.compliance,
            TagField::TherapeuticArea => &self.therapeutic_area,
            TagField::TopicGeneral => &self.topic_general,
            TagField::Brand => &self.brand,
            TagField::LillyHealthApp => &self.lilly_health_app,
            TagField::Products => &self.products,
        }
    }

    pub fn tags_mut(&mut self, field: TagField) -> &mut TagSet {
        match field {
            TagField::Corporate => &mut self.corporate,
            TagField::Audience => &mut self.audience,
            TagField::Compliance => &mut self.compliance,
            TagField::TherapeuticArea => &mut self.therapeutic_area,
            TagField::TopicGeneral => &mut self.topic_general,
            TagField::Brand => &mut self.brand,
            TagField::LillyHealthApp => &mut self.lilly_health_app,
            TagField::Products => &mut self.products,
        }
    }

    pub fn text(&self, field: TextField) -> Option<&str> {
        self.text_slot(field).as_deref()
    }

    pub fn set_text(&mut self, field: TextField, value: Option<String>) {
        *self.text_slot_mut(field) = value;
    }

    fn text_slot(&self, field: TextField) -> &Option<String> {
        match field {
            TextField::Status => &self.status,
            TextField::Priority => &self.priority,
            TextField::SlaStatus => &self.sla_status,
            TextField::ReportType => &self.report_type,
            TextField::Language => &self.language,
            TextField::Country => &self.country,
            TextField::CustomStatus => &self.custom_status,
            TextField::Channel => &self.channel,
            TextField::Region => &self.region,
            TextField::IssueType => &self.issue_type,
            TextField::ThemeMatches => &self.theme_matches,
            TextField::TopicMatches => &self.topic_matches,
            TextField::TopicGroupMatches => &self.topic_group_matches,
            TextField::SourcedFromListening => &self.sourced_from_listening,
            TextField::SourcedFromCtm => &self.sourced_from_ctm,
            TextField::CtmAdId => &self.ctm_ad_id,
            TextField::InitialMessagePrivacy => &self.initial_message_privacy,
            TextField::HcpType => &self.hcp_type,
            TextField::PatientGender => &self.patient_gender,
            TextField::PatientAge => &self.patient_age,
            TextField::ContactedPoster => &self.contacted_poster,
            TextField::PosterConsent => &self.poster_consent,
            TextField::PosterContactInfo => &self.poster_contact_info,
            TextField::LotControlNumber => &self.lot_control_number,
        }
    }

    fn text_slot_mut(&mut self, field: TextField) -> &mut Option<String> {
        match field {
            TextField::Status => &mut self.status,
            TextField::Priority => &mut self.priority,
            TextField::SlaStatus => &mut self.sla_status,
            TextField::ReportType => &mut self.report_type,
            TextField::Language => &mut self.language,
            TextField::Country => &mut self.country,
            TextField::CustomStatus => &mut self.custom_status,
            TextField::Channel => &mut self.channel,
            TextField::Region => &mut self.region,
            TextField::IssueType => &mut self.issue_type,
            TextField::ThemeMatches => &mut self.theme_matches,
            TextField::TopicMatches => &mut self.topic_matches,
            TextField::TopicGroupMatches => &mut self.topic_group_matches,
            TextField::SourcedFromListening => &mut self.sourced_from_listening,
            TextField::SourcedFromCtm => &mut self.sourced_from_ctm,
            TextField::CtmAdId => &mut self.ctm_ad_id,
            TextField::InitialMessagePrivacy => &mut self.initial_message_privacy,
            TextField::HcpType => &mut self.hcp_type,
            TextField::PatientGender => &mut self.patient_gender,
            TextField::PatientAge => &mut self.patient_age,
            TextField::ContactedPoster => &mut self.contacted_poster,
            TextField::PosterConsent => &mut self.poster_consent,
            TextField::PosterContactInfo => &mut self.poster_contact_info,
            TextField::LotControlNumber => &mut self.lot_control_number,
        }
    }

    /// Current value of `key`, packaged as a single-field patch.
    pub fn patch_for(&self, key: PropertyKey) -> PropertyPatch {
        let value = match key {
            PropertyKey::Tag(field) => PropertyValue::Tags(self.tags(field).clone()),
            PropertyKey::Text(field) => PropertyValue::Text(self.text_slot(field).clone()),
        };
        PropertyPatch { key, value }
    }

    /// Write one field. A value of the wrong shape for `key` is rejected.
    pub fn apply_patch(&mut self, patch: &PropertyPatch) -> CaseResult<()> {
        match (patch.key, &patch.value) {
            (PropertyKey::Tag(field), PropertyValue::Tags(tags)) => {
                *self.tags_mut(field) = tags.clone();
                Ok(())
            }
            (PropertyKey::Text(field), PropertyValue::Text(text)) => {
                self.set_text(field, text.clone());
                Ok(())
            }
            (key, _) => Err(ValidationError::InvalidValue {
                field: key.wire_name().to_string(),
                reason: "value shape does not match field".to_string(),
            }
            .into()),
        }
    }
}

/// Value written to a single property field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Tags(TagSet),
    Text(Option<String>),
}

/// Field-level write to the property bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyPatch {
    pub key: PropertyKey,
    pub value: PropertyValue,
}

impl PropertyPatch {
    pub fn text(field: TextField, value: Option<String>) -> Self {
        Self {
            key: PropertyKey::Text(field),
            value: PropertyValue::Text(value),
        }
    }

    pub fn tags(field: TagField, value: TagSet) -> Self {
        Self {
            key: PropertyKey::Tag(field),
            value: PropertyValue::Tags(value),
        }
    }
}
