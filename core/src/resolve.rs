//! Guid → base URL resolution.
//!
//! # Design
//! By default the guid is itself the hostname of the target app. For local
//! development a JSON service map (guid → base URL) replaces that default
//! entirely: once a map is configured, a guid missing from it is an error
//! rather than a fallback to DNS. The map text is parsed on every call so a
//! broken map fails each call the same way.

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ActConfig;
use crate::error::ActError;
use crate::validate::ends_in_number;

/// The base URL chosen for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub base_url: Url,
}

impl ResolvedTarget {
    /// Parse a base URL. A value without a scheme is taken to be plain HTTP.
    pub fn parse(base: &str) -> Result<Self, ActError> {
        let candidate = if base.contains("://") {
            base.to_string()
        } else {
            format!("http://{base}")
        };
        let invalid = |reason: String| ActError::InvalidBaseUrl {
            url: base.to_string(),
            reason,
        };
        let base_url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
        if base_url.host_str().is_none() {
            return Err(invalid("no host".to_string()));
        }
        Ok(Self { base_url })
    }

    /// `scheme://host[:port]` without a trailing slash.
    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }
}

/// Anything that can map a guid to a base URL.
pub trait Resolve {
    fn resolve(&self, guid: &str) -> Result<ResolvedTarget, ActError>;
}

impl<F> Resolve for F
where
    F: Fn(&str) -> Result<ResolvedTarget, ActError>,
{
    fn resolve(&self, guid: &str) -> Result<ResolvedTarget, ActError> {
        self(guid)
    }
}

/// Resolver backed by the guid-as-hostname default and an optional
/// development service map.
#[derive(Debug, Clone, Default)]
pub struct ServiceMapResolver {
    host_prefix: String,
    service_map: Option<String>,
}

impl ServiceMapResolver {
    pub fn new(host_prefix: &str, service_map: Option<String>) -> Self {
        Self {
            host_prefix: host_prefix.to_string(),
            service_map: service_map.filter(|raw| !raw.is_empty()),
        }
    }

    pub fn from_config(config: &ActConfig) -> Self {
        Self::new(&config.host_prefix, config.service_map.clone())
    }
}

impl Resolve for ServiceMapResolver {
    fn resolve(&self, guid: &str) -> Result<ResolvedTarget, ActError> {
        let base = match &self.service_map {
            Some(raw) => lookup(raw, guid)?,
            None => default_base(&self.host_prefix, guid)?,
        };
        ResolvedTarget::parse(&base)
    }
}

/// `http://<prefix><guid>`. A host ending in a numeric label would be parsed
/// as an IPv4 address rather than looked up by name, so it is refused.
fn default_base(host_prefix: &str, guid: &str) -> Result<String, ActError> {
    let host = format!("{host_prefix}{guid}");
    let base = format!("http://{host}");
    if ends_in_number(&host) {
        return Err(ActError::InvalidBaseUrl {
            url: base,
            reason: "host would be read as an IPv4 address".to_string(),
        });
    }
    Ok(base)
}

fn lookup(raw: &str, guid: &str) -> Result<String, ActError> {
    debug!(service_map = %raw, guid, "consulting local service map");
    let map: Value = serde_json::from_str(raw).map_err(|e| {
        debug!(error = %e, "local service map is not valid JSON");
        ActError::ServiceMapParse(e.to_string())
    })?;
    match map.get(guid).and_then(Value::as_str) {
        Some(url) if !url.is_empty() => Ok(url.to_string()),
        _ => Err(ActError::HostNotFound(guid.to_string())),
    }
}
