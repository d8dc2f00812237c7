//! HTTP request/response descriptors exchanged with the transport.
//!
//! # Design
//! These types describe HTTP traffic as plain data. The core builds
//! `HttpRequest` values and normalizes `HttpResponse` values; a `Transport`
//! (or the host itself) performs the actual I/O. All fields use owned types so
//! values can cross the FFI boundary without lifetime concerns.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

/// HTTP method for a request.
///
/// Callers may name any method; the common ones get their own variant and
/// everything else is kept upper-cased in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Other(String),
}

impl HttpMethod {
    /// Parse a method name case-insensitively.
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(name) => name,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-formed HTTP request described as plain data.
///
/// Built by `RequestBuilder::build`. The transport executes it and returns
/// the corresponding `HttpResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL including any query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Zero means no timeout.
    pub timeout: Duration,
    /// Whether the response body should be decoded as JSON.
    pub json: bool,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// The response body as handed to the completion callback.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Decode `raw` as JSON when `json` is set, keeping the raw text when it
    /// does not parse.
    pub fn decode(raw: &str, json: bool) -> Self {
        if json {
            if let Ok(value) = serde_json::from_str(raw) {
                return ResponseBody::Json(value);
            }
        }
        ResponseBody::Text(raw.to_string())
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Render the body back to text. JSON values are re-serialized.
    pub fn to_text(&self) -> String {
        match self {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text.clone(),
        }
    }
}
