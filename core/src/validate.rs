//! Call-request validation.
//!
//! Checks run in a fixed order and stop at the first failure, so a request
//! with several problems always reports the same one.

use serde_json::{Map, Value};

use crate::error::ActError;
use crate::types::CallRequest;

/// Longest guid accepted, matching the DNS label limit.
pub const MAX_GUID_LEN: usize = 63;

/// Returns true when `guid` is usable as a hostname: alphanumeric at both
/// ends, alphanumerics, `.`, `-` or `_` in between, and not something a URL
/// parser would read as an IPv4 address (`123`, `app.1`, `svc.0x1f`).
pub fn is_valid_guid(guid: &str) -> bool {
    let bytes = guid.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    bytes.len() <= MAX_GUID_LEN
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
        && !ends_in_number(guid)
}

/// True when the last dot-separated label of `host` is a decimal or `0x` hex
/// number. URL parsers treat such hosts as IPv4 literals.
pub(crate) fn ends_in_number(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    let label = host.rsplit('.').next().unwrap_or(host);
    if !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    label
        .strip_prefix("0x")
        .or_else(|| label.strip_prefix("0X"))
        .is_some_and(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Validate an untyped call request and convert it into a `CallRequest`.
pub fn validate(raw: &Value) -> Result<CallRequest, ActError> {
    let fields = raw.as_object().ok_or(ActError::MissingParms)?;

    let guid = match fields.get("guid") {
        None | Some(Value::Null) => return Err(ActError::MissingArgument("guid")),
        Some(Value::String(guid)) => guid,
        Some(_) => return Err(invalid("guid", "string")),
    };
    if !is_valid_guid(guid) {
        return Err(ActError::InvalidGuid(guid.clone()));
    }

    if present(fields, "params").is_some_and(|params| !params.is_object()) {
        return Err(invalid("params", "object"));
    }

    if present(fields, "path").is_none() && present(fields, "endpoint").is_none() {
        return Err(ActError::MissingAddress);
    }

    expect(fields, "path", "string", Value::is_string)?;
    expect(fields, "endpoint", "string", Value::is_string)?;
    expect(fields, "method", "non-empty string", |v| {
        v.as_str().is_some_and(|s| !s.is_empty())
    })?;
    expect(fields, "timeout", "non-negative integer", Value::is_u64)?;
    expect(fields, "headers", "object of strings", |v| {
        v.as_object()
            .is_some_and(|headers| headers.values().all(Value::is_string))
    })?;
    expect(fields, "json", "boolean", Value::is_boolean)?;

    serde_json::from_value(raw.clone()).map_err(|e| ActError::MalformedRequest(e.to_string()))
}

/// Validate a request that was built in Rust rather than parsed.
pub fn validate_request(request: &CallRequest) -> Result<(), ActError> {
    if !is_valid_guid(&request.guid) {
        return Err(ActError::InvalidGuid(request.guid.clone()));
    }
    if request.path.is_none() && request.endpoint.is_none() {
        return Err(ActError::MissingAddress);
    }
    if request.method.as_deref().is_some_and(str::is_empty) {
        return Err(invalid("method", "non-empty string"));
    }
    Ok(())
}

fn invalid(name: &'static str, expected: &'static str) -> ActError {
    ActError::InvalidArgument { name, expected }
}

/// A field counts as present only when it holds something other than `null`.
fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|value| !value.is_null())
}

fn expect(
    fields: &Map<String, Value>,
    key: &'static str,
    expected: &'static str,
    check: impl Fn(&Value) -> bool,
) -> Result<(), ActError> {
    match present(fields, key) {
        Some(value) if !check(value) => Err(invalid(key, expected)),
        _ => Ok(()),
    }
}
