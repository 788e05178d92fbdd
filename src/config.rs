//! Configuration management for the Gatehouse engine

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Per-category quota caps; an omitted value means unlimited
#[derive(Debug, Deserialize, Clone, Default)]
pub struct QuotaLimitsConfig {
    pub monthly: Option<u32>,
    pub yearly: Option<u32>,
    pub host_daily: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuotasConfig {
    #[serde(default = "QuotasConfig::default_day_guest")]
    pub day_guest: QuotaLimitsConfig,
    #[serde(default)]
    pub accommodation_guest: QuotaLimitsConfig,
    #[serde(default)]
    pub supplier: QuotaLimitsConfig,
    #[serde(default)]
    pub reciprocating_member: QuotaLimitsConfig,
}

impl QuotasConfig {
    fn default_day_guest() -> QuotaLimitsConfig {
        QuotaLimitsConfig {
            monthly: Some(4),
            yearly: Some(12),
            host_daily: Some(4),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub quotas: QuotasConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix GATEHOUSE_)
            .add_source(
                Environment::with_prefix("GATEHOUSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for QuotasConfig {
    fn default() -> Self {
        Self {
            day_guest: Self::default_day_guest(),
            accommodation_guest: QuotaLimitsConfig::default(),
            supplier: QuotaLimitsConfig::default(),
            reciprocating_member: QuotaLimitsConfig::default(),
        }
    }
}
