//! Configuration loading for Caseflow.
//!
//! The agent roster, tag options and seed settings are read once at process
//! start and never mutated afterwards. Components take an
//! `Arc<CaseflowConfig>`; [`install`] additionally publishes one instance
//! process-wide.

use crate::{Agent, CaseResult, ConfigError, PropertyKey, TagField, TagSet, TextField};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Environment variable naming the config file read by [`CaseflowConfig::load`].
pub const CONFIG_ENV_VAR: &str = "CASEFLOW_CONFIG";

/// Placeholder substituted into the avatar template.
const AVATAR_ID_TOKEN: &str = "{id}";

/// Master configuration struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseflowConfig {
    /// Email that marks the automation agent
    pub automation_email: String,
    pub roster: Vec<Agent>,
    pub tag_options: TagOptions,
    pub seed: SeedSettings,
    /// Curated per-case adjustments, keyed by case id
    #[serde(default)]
    pub overrides: BTreeMap<String, SeedOverride>,
}

/// Selectable values for the multi-select and dropdown fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TagOptions {
    pub corporate: Vec<String>,
    pub audience: Vec<String>,
    pub compliance: Vec<String>,
    pub therapeutic_area: Vec<String>,
    pub topic_general: Vec<String>,
    pub brand: Vec<String>,
    pub lilly_health_app: Vec<String>,
    pub products: Vec<String>,
    pub status: Vec<String>,
    pub priority: Vec<String>,
    pub sla_status: Vec<String>,
    pub language: Vec<String>,
}

impl TagOptions {
    /// Options offered for `key`. Free-text fields have none.
    pub fn options_for(&self, key: PropertyKey) -> &[String] {
        match key {
            PropertyKey::Tag(TagField::Corporate) => &self.corporate,
            PropertyKey::Tag(TagField::Audience) => &self.audience,
            PropertyKey::Tag(TagField::Compliance) => &self.compliance,
            PropertyKey::Tag(TagField::TherapeuticArea) => &self.therapeutic_area,
            PropertyKey::Tag(TagField::TopicGeneral) => &self.topic_general,
            PropertyKey::Tag(TagField::Brand) => &self.brand,
            PropertyKey::Tag(TagField::LillyHealthApp) => &self.lilly_health_app,
            PropertyKey::Tag(TagField::Products) => &self.products,
            PropertyKey::Text(TextField::Status) => &self.status,
            PropertyKey::Text(TextField::Priority) => &self.priority,
            PropertyKey::Text(TextField::SlaStatus) => &self.sla_status,
            PropertyKey::Text(TextField::Language) => &self.language,
            PropertyKey::Text(_) => &[],
        }
    }
}

/// Settings used while normalizing raw import records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedSettings {
    /// Value for unset display fields
    pub placeholder: String,
    /// Value for unset yes/no fields
    pub negative_placeholder: String,
    /// Reporter avatar URL; `{id}` is replaced with the case id
    pub avatar_template: String,
    pub defaults: ScalarDefaults,
}

impl SeedSettings {
    pub fn avatar_for(&self, case_id: &str) -> String {
        self.avatar_template.replace(AVATAR_ID_TOKEN, case_id)
    }
}

/// Scalar property values every seeded case starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScalarDefaults {
    pub status: String,
    pub priority: String,
    pub sla_status: String,
    pub language: String,
    pub country: String,
    pub associated_messages: u32,
    pub custom_status: String,
    pub region: String,
}

/// Manually curated adjustments for one case.
///
/// Scalars replace the defaults. Tag arrays are unioned with whatever the raw
/// record produced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SeedOverride {
    pub priority: Option<String>,
    pub country: Option<String>,
    pub associated_messages: Option<u32>,
    pub custom_status: Option<String>,
    pub region: Option<String>,
    pub corporate: TagSet,
    pub audience: TagSet,
    pub compliance: TagSet,
    pub therapeutic_area: TagSet,
    pub topic_general: TagSet,
    pub brand: TagSet,
    pub lilly_health_app: TagSet,
    pub products: TagSet,
}

impl SeedOverride {
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

    /// Whether the override closes the case at seed time.
    pub fn marks_closed(&self) -> bool {
        self.custom_status.as_deref() == Some("closed")
    }
}

impl CaseflowConfig {
    /// Load from the file named by `CASEFLOW_CONFIG` and validate it.
    pub fn load() -> CaseResult<Self> {
        let path = std::env::var(CONFIG_ENV_VAR).map_err(|_| ConfigError::MissingRequired {
            field: CONFIG_ENV_VAR.to_string(),
        })?;
        let config = Self::from_path(Path::new(&path))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file. Does not validate.
    pub fn from_path(path: &Path) -> CaseResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> CaseResult<Self> {
        let config: CaseflowConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> CaseResult<()> {
        if self.automation_email.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "automation_email".to_string(),
            }
            .into());
        }
        if self.automation_agent().is_none() {
            return Err(invalid(
                "automation_email",
                &self.automation_email,
                "must belong to a roster agent",
            ));
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for agent in &self.roster {
            if !ids.insert(agent.id.as_str()) {
                return Err(invalid("roster.id", &agent.id, "duplicate agent id"));
            }
            if !names.insert(agent.name.as_str()) {
                return Err(invalid("roster.name", &agent.name, "duplicate agent name"));
            }
        }

        if self.seed.placeholder.trim().is_empty() {
            return Err(invalid("seed.placeholder", &self.seed.placeholder, "must not be empty"));
        }
        if self.seed.negative_placeholder.trim().is_empty() {
            return Err(invalid(
                "seed.negative_placeholder",
                &self.seed.negative_placeholder,
                "must not be empty",
            ));
        }
        if !self.seed.avatar_template.contains(AVATAR_ID_TOKEN) {
            return Err(invalid(
                "seed.avatar_template",
                &self.seed.avatar_template,
                "must contain {id}",
            ));
        }
        Ok(())
    }

    pub fn automation_agent(&self) -> Option<&Agent> {
        self.roster.iter().find(|a| a.email == self.automation_email)
    }

    /// Exact, case-sensitive name lookup.
    pub fn agent_by_name(&self, name: &str) -> Option<&Agent> {
        self.roster.iter().find(|a| a.name == name)
    }

    pub fn override_for(&self, case_id: &str) -> Option<&SeedOverride> {
        self.overrides.get(case_id)
    }

    /// The stock roster, options and curated overrides.
    pub fn builtin() -> Self {
        let roster = [
            ("1", "Pace", "pace@zamp.ai", "pace"),
            ("2", "Sherina Espinoza", "sherina.espinoza@lilly.com", "sherina"),
            ("3", "Kunal Test", "kunal.test@lilly.com", "kunal"),
            ("4", "Sarah Johnson", "sarah.johnson@lilly.com", "sarah"),
            ("5", "Emma Wilson", "emma.wilson@lilly.com", "emma"),
            ("6", "Mike Chen", "mike.chen@lilly.com", "mike"),
            ("7", "David Lee", "david.lee@lilly.com", "david"),
            ("8", "HR Team", "careers@lilly.com", "hr"),
            ("9", "Medical Affairs", "medical.affairs@lilly.com", "medaffairs"),
            ("10", "Quality Assurance", "qa@lilly.com", "qa"),
            ("11", "Patient Support", "patient.support@lilly.com", "support"),
            ("12", "Scientific Affairs", "scientific.affairs@lilly.com", "sci-affairs"),
            ("13", "Lisa Brown", "lisa.brown@lilly.com", "lisa"),
            ("14", "Community Manager", "community@lilly.com", "community"),
            ("15", "Patient Advocacy", "patient.advocacy@lilly.com", "advocacy"),
            ("16", "Medical Information", "med.info@lilly.com", "medinfo"),
            ("17", "John Doe", "john.doe@example.com", "john"),
            ("18", "Jane Smith", "jane.smith@example.com", "jane"),
        ]
        .into_iter()
        .map(|(id, name, email, seed)| {
            Agent::new(id, name, email, format!("https://picsum.photos/seed/{}/40/40", seed))
        })
        .collect();

        let tag_options = TagOptions {
            corporate: strings(&["Careers", "Investor Relations", "Corporate Responsibility"]),
            audience: strings(&[
                "Health Care Provider",
                "Patient",
                "Caregiver",
                "Careers-Graduate",
                "Business Partner/Provider",
            ]),
            compliance: strings(&["AE", "PC", "AE and PC", "Broken Seal"]),
            therapeutic_area: strings(&["Diabetes", "Oncology", "Immunology", "Neuroscience"]),
            topic_general: strings(&[
                "Side Effects",
                "Patient Access",
                "Device Issue",
                "Testimonial",
                "Pricing",
            ]),
            brand: strings(&["Humalog", "Trulicity", "Mounjaro", "Alimta"]),
            lilly_health_app: strings(&["Yes", "No"]),
            products: strings(&["Alimta", "Cyramza", "Humalog", "Retevmo"]),
            status: strings(&["Open", "Pending", "Resolved", "Closed"]),
            priority: strings(&["Low", "Medium", "High", "Urgent"]),
            sla_status: strings(&["On Track", "At Risk", "Breached"]),
            language: strings(&["English", "Spanish", "French"]),
        };

        let seed = SeedSettings {
            placeholder: "Click to Add".to_string(),
            negative_placeholder: "No".to_string(),
            avatar_template: "https://picsum.photos/seed/user{id}/40/40".to_string(),
            defaults: ScalarDefaults {
                status: "Open".to_string(),
                priority: "medium".to_string(),
                sla_status: "On Track".to_string(),
                language: "English".to_string(),
                country: "Unknown".to_string(),
                associated_messages: 1,
                custom_status: "assigned".to_string(),
                region: "FRANCE".to_string(),
            },
        };

        let overrides = [
            ("49", curated("medium", "FRANCE", 1, "assigned")),
            (
                "56",
                curated("very high", "FRANCE", 1, "new")
                    .with_tags(TagField::TopicGeneral, &["Side Effects", "Patient Access"]),
            ),
            ("57", curated("medium", "FRANCE", 2, "assigned")),
            ("127001", curated("high", "US", 1, "assigned")),
            (
                "127002",
                curated("very high", "US", 1, "new")
                    .with_tags(TagField::Audience, &["Health Care Provider"]),
            ),
            (
                "127003",
                curated("medium", "UK", 2, "in progress")
                    .with_tags(TagField::TopicGeneral, &["Device Issue"]),
            ),
            ("127004", curated("very high", "CA", 1, "assigned")),
            ("127005", curated("medium", "FR", 3, "assigned")),
            ("127006", curated("low", "US", 1, "assigned")),
            (
                "127007",
                curated("medium", "CA", 4, "closed").with_tags(TagField::Products, &["Alimta"]),
            ),
            ("127008", curated("high", "US", 2, "assigned")),
            (
                "127009",
                curated("low", "US", 1, "assigned")
                    .with_tags(TagField::Audience, &["Careers-Graduate"]),
            ),
            (
                "127010",
                curated("high", "US", 5, "in progress")
                    .with_tags(TagField::Audience, &["Business Partner/Provider"]),
            ),
            (
                "127011",
                curated("very high", "UK", 2, "assigned")
                    .with_tags(TagField::Products, &["Cyramza"]),
            ),
            (
                "127012",
                curated("low", "CA", 1, "closed")
                    .with_tags(TagField::TopicGeneral, &["Testimonial"]),
            ),
            (
                "127013",
                curated("very high", "US", 3, "assigned")
                    .with_tags(TagField::Products, &["Humalog"])
                    .with_tags(TagField::Compliance, &["PC", "Broken Seal"]),
            ),
            ("127014", curated("low", "US", 1, "assigned")),
            ("127015", curated("medium", "US", 2, "assigned")),
            (
                "127016",
                curated("medium", "US", 6, "closed").with_tags(TagField::TopicGeneral, &["Pricing"]),
            ),
            (
                "127017",
                curated("high", "CA", 2, "closed").with_tags(TagField::Products, &["Retevmo"]),
            ),
        ]
        .into_iter()
        .map(|(id, ov)| (id.to_string(), ov))
        .collect();

        Self {
            automation_email: "pace@zamp.ai".to_string(),
            roster,
            tag_options,
            seed,
            overrides,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn curated(priority: &str, region: &str, messages: u32, custom_status: &str) -> SeedOverride {
    SeedOverride {
        priority: Some(priority.to_string()),
        country: Some(region.to_string()),
        associated_messages: Some(messages),
        custom_status: Some(custom_status.to_string()),
        region: Some(region.to_string()),
        ..SeedOverride::default()
    }
}

impl SeedOverride {
    fn with_tags(mut self, field: TagField, values: &[&str]) -> Self {
        let set = match field {
            TagField::Corporate => &mut self.corporate,
            TagField::Audience => &mut self.audience,
            TagField::Compliance => &mut self.compliance,
            TagField::TherapeuticArea => &mut self.therapeutic_area,
            TagField::TopicGeneral => &mut self.topic_general,
            TagField::Brand => &mut self.brand,
            TagField::LillyHealthApp => &mut self.lilly_health_app,
            TagField::Products => &mut self.products,
        };
        for value in values {
            set.insert(*value);
        }
        self
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> crate::CaseError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

// ============================================================================
// PROCESS-WIDE INSTANCE
// ============================================================================

static GLOBAL: OnceCell<Arc<CaseflowConfig>> = OnceCell::new();

/// Validate `config` and publish it process-wide. Only the first call wins.
pub fn install(config: CaseflowConfig) -> CaseResult<Arc<CaseflowConfig>> {
    config.validate()?;
    let shared = Arc::new(config);
    GLOBAL
        .set(Arc::clone(&shared))
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(shared)
}

/// The installed config, if any.
pub fn current() -> Option<Arc<CaseflowConfig>> {
    GLOBAL.get().cloned()
}
