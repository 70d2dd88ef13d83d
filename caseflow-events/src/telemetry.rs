//! Tracing subscriber setup

use caseflow_core::{CaseResult, ConfigError};
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "caseflow=debug,info";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::InvalidValue {
                field: "CASEFLOW_LOG_FORMAT".to_string(),
                value: other.to_string(),
                reason: "expected json or pretty".to_string(),
            }),
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: std::env::var("CASEFLOW_LOG_FORMAT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            filter: std::env::var("CASEFLOW_LOG_FILTER")
                .unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Returns `Ok(false)` if a subscriber was already installed, so repeated
/// calls are harmless. An unparseable filter is a config error.
pub fn init_tracing(config: &TelemetryConfig) -> CaseResult<bool> {
    let env_filter = EnvFilter::try_new(&config.filter).map_err(|e| ConfigError::InvalidValue {
        field: "CASEFLOW_LOG_FILTER".to_string(),
        value: config.filter.clone(),
        reason: e.to_string(),
    })?;

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(format = ?config.format, filter = %config.filter, "Telemetry initialized");
    }
    Ok(installed)
}
