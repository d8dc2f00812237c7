//! Turns a validated `CallRequest` and a `ResolvedTarget` into an
//! `HttpRequest`.
//!
//! # Design
//! `RequestBuilder` holds only the identity header value and carries no
//! mutable state between calls. It never touches the network: the result is
//! plain data that a `Transport` (or the host) executes.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ActError;
use crate::http::{HttpMethod, HttpRequest};
use crate::resolve::ResolvedTarget;
use crate::types::CallRequest;

pub const ACCEPT_HEADER: &str = "accept";
pub const IDENTITY_HEADER: &str = "x-request-with";
pub const CONTENT_TYPE_HEADER: &str = "content-type";
const JSON_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    widget: String,
}

impl RequestBuilder {
    pub fn new(widget: &str) -> Self {
        Self {
            widget: widget.to_string(),
        }
    }

    pub fn build(&self, target: &ResolvedTarget, request: &CallRequest) -> Result<HttpRequest, ActError> {
        let method = request.http_method();
        let payload = request.payload();

        let path = target_path(target.base_url.path(), request);
        let mut url = target.base_url.clone();
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        let _ = url.set_username("");
        let _ = url.set_password(None);

        let body = if method == HttpMethod::Get {
            let pairs = query_pairs(&payload);
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
            None
        } else {
            let encoded = serde_json::to_string(&payload).map_err(|e| ActError::Serialization(e.to_string()))?;
            Some(encoded)
        };

        Ok(HttpRequest {
            headers: self.headers(request, body.is_some()),
            method,
            url: url.into(),
            body,
            timeout: request.timeout(),
            json: request.decode_json(),
        })
    }

    /// Caller headers, then the content type for bodies, then the two
    /// headers callers may not override.
    fn headers(&self, request: &CallRequest, has_body: bool) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .flatten()
            .filter(|(name, _)| {
                !name.eq_ignore_ascii_case(ACCEPT_HEADER) && !name.eq_ignore_ascii_case(IDENTITY_HEADER)
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let has_content_type = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER));
        if has_body && !has_content_type {
            headers.push((CONTENT_TYPE_HEADER.to_string(), JSON_MEDIA_TYPE.to_string()));
        }
        headers.push((ACCEPT_HEADER.to_string(), JSON_MEDIA_TYPE.to_string()));
        headers.push((IDENTITY_HEADER.to_string(), self.widget.clone()));
        headers
    }
}

fn target_path(base_path: &str, request: &CallRequest) -> String {
    match (&request.path, &request.endpoint) {
        (Some(path), endpoint) => {
            if endpoint.is_some() {
                warn!(guid = %request.guid, path = %path, "both path and endpoint given, using path");
            }
            url_path_join(&[base_path, path.as_str()])
        }
        (None, Some(endpoint)) => url_path_join(&[base_path, "cloud", endpoint.as_str()]),
        (None, None) => url_path_join(&[base_path]),
    }
}

/// Join URL path segments with `/`, collapsing repeated separators and
/// guaranteeing a leading slash.
pub fn url_path_join(segments: &[&str]) -> String {
    let joined = segments.join("/");
    let mut path = String::with_capacity(joined.len() + 1);
    path.push('/');
    for c in joined.chars() {
        if c == '/' && path.ends_with('/') {
            continue;
        }
        path.push(c);
    }
    path
}

/// Flatten a payload into query pairs using bracket notation for nesting.
fn query_pairs(payload: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in payload {
        flatten(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => pairs.push((key, String::new())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Bool(_) | Value::Number(_) => pairs.push((key, value.to_string())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(format!("{key}[{index}]"), item, pairs);
            }
        }
        Value::Object(fields) => {
            for (name, item) in fields {
                flatten(format!("{key}[{name}]"), item, pairs);
            }
        }
    }
}
