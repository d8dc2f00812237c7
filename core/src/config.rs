//! Startup configuration for a `Dispatcher`.
//!
//! Built once, validated, and then moved into the dispatcher. Nothing reads
//! the environment after construction.

use serde::Deserialize;
use thiserror::Error;

pub const WIDGET_ENV: &str = "FH_WIDGET";
pub const HOST_PREFIX_ENV: &str = "FH_HOST_PREFIX";
pub const SERVICE_MAP_ENV: &str = "FH_SERVICE_MAP";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("configuration invalid: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActConfig {
    /// Identifier of the calling app, sent as the `x-request-with` header.
    pub widget: String,
    /// Prepended to the guid when the guid is used as a hostname.
    pub host_prefix: String,
    /// Raw JSON guid → base URL map for local development.
    pub service_map: Option<String>,
}

impl ActConfig {
    pub fn new(widget: &str) -> Self {
        Self {
            widget: widget.to_string(),
            ..Self::default()
        }
    }

    pub fn with_host_prefix(mut self, prefix: &str) -> Self {
        self.host_prefix = prefix.to_string();
        self
    }

    pub fn with_service_map(mut self, service_map: &str) -> Self {
        self.service_map = Some(service_map.to_string());
        self
    }

    /// Read `FH_WIDGET`, `FH_HOST_PREFIX` and `FH_SERVICE_MAP`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            widget: lookup(WIDGET_ENV).unwrap_or_default(),
            host_prefix: lookup(HOST_PREFIX_ENV).unwrap_or_default(),
            service_map: lookup(SERVICE_MAP_ENV).filter(|raw| !raw.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.widget.chars().any(char::is_control) {
            return Err(ConfigError::Validation(
                "widget must not contain control characters".into(),
            ));
        }
        if self.host_prefix.chars().any(|c| c.is_control() || c == '/') {
            return Err(ConfigError::Validation(
                "host prefix must be a plain hostname fragment".into(),
            ));
        }
        Ok(())
    }
}
