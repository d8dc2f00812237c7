//! A stand-in target application for exercising cross-app calls.
//!
//! Every request that does not hit one of the fixed routes is echoed back as
//! JSON, so tests can assert on exactly what the dispatcher put on the wire.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::Query,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::any,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::debug;

/// How long `/cloud/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_millis(500);

/// What the target app saw, as returned by the echo handler.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON body, the raw text if it is not JSON, `null` if empty.
    pub body: Value,
}

pub fn app() -> Router {
    Router::new()
        .route("/cloud/fail", any(fail))
        .route("/cloud/text", any(text))
        .route("/cloud/slow", any(slow))
        .fallback(echo)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    method: Method,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    debug!(%method, %uri, "echoing call");
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
        headers,
        body: decode_body(&body),
    })
}

async fn fail() -> (StatusCode, Json<Value>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"})))
}

async fn text() -> &'static str {
    "pong"
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(json!({"slow": true}))
}

fn decode_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}
