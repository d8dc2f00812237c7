//! Caller-facing DTOs.
//!
//! # Design
//! `CallRequest` mirrors the JSON shape callers have always sent, so it can
//! be deserialized directly from a validated `serde_json::Value` or built in
//! Rust with the constructor helpers. Defaults are applied at read time
//! through the accessor methods; the stored fields keep exactly what the
//! caller supplied.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::HttpMethod;

pub const DEFAULT_METHOD: &str = "POST";
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// A request to invoke an endpoint on another application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Identifier of the target application.
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Cloud endpoint name, served under `/cloud/<endpoint>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Timeout in milliseconds; `0` disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl CallRequest {
    pub fn endpoint(guid: &str, endpoint: &str) -> Self {
        Self {
            guid: guid.to_string(),
            endpoint: Some(endpoint.to_string()),
            ..Self::default()
        }
    }

    pub fn path(guid: &str, path: &str) -> Self {
        Self {
            guid: guid.to_string(),
            path: Some(path.to_string()),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = Some(json);
        self
    }

    pub fn http_method(&self) -> HttpMethod {
        HttpMethod::parse(self.method.as_deref().unwrap_or(DEFAULT_METHOD))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn decode_json(&self) -> bool {
        self.json.unwrap_or(true)
    }

    /// The payload sent to the target; an empty object when no params were given.
    pub fn payload(&self) -> Map<String, Value> {
        self.params.clone().unwrap_or_default()
    }
}
