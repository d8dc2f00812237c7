//! Validate → resolve → build → execute, and hand the outcome to a single
//! completion callback.
//!
//! # Design
//! The callback receives `(error, body, response)`: error first, then the
//! decoded body, then the raw response. Callers written against the legacy
//! API depend on body coming before response, so the order is fixed here and
//! nowhere else. Every failure before the transport call is returned early,
//! which keeps configuration and resolution errors distinct from network
//! errors and guarantees no I/O happens for them.

use serde_json::Value;
use tracing::{debug, warn};

use crate::builder::RequestBuilder;
use crate::config::{ActConfig, ConfigError};
use crate::error::ActError;
use crate::http::{HttpRequest, HttpResponse, ResponseBody};
use crate::resolve::{Resolve, ServiceMapResolver};
use crate::transport::Transport;
use crate::types::CallRequest;
use crate::validate::{validate, validate_request};

/// Outcome of one call, in callback order.
#[derive(Debug)]
pub struct CallResult {
    pub error: Option<ActError>,
    pub body: Option<ResponseBody>,
    pub response: Option<HttpResponse>,
}

impl CallResult {
    pub fn failed(error: ActError) -> Self {
        Self {
            error: Some(error),
            body: None,
            response: None,
        }
    }

    /// Normalize a response, decoding the body as JSON when `json` is set.
    pub fn from_response(response: HttpResponse, json: bool) -> Self {
        Self {
            error: None,
            body: Some(ResponseBody::decode(&response.body, json)),
            response: Some(response),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_parts(self) -> (Option<ActError>, Option<ResponseBody>, Option<HttpResponse>) {
        (self.error, self.body, self.response)
    }
}

/// Calls endpoints on other apps by guid.
///
/// Immutable after construction; concurrent calls share nothing mutable.
#[derive(Debug)]
pub struct Dispatcher<T, R = ServiceMapResolver> {
    resolver: R,
    builder: RequestBuilder,
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(config: ActConfig, transport: T) -> Result<Self, ConfigError> {
        let resolver = ServiceMapResolver::from_config(&config);
        Self::with_resolver(config, resolver, transport)
    }
}

#[cfg(feature = "ureq")]
impl Dispatcher<crate::transport::UreqTransport> {
    /// Dispatcher over `ureq`, configured from `FH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ActConfig::from_env()?, crate::transport::UreqTransport::new())
    }
}

impl<T: Transport, R: Resolve> Dispatcher<T, R> {
    pub fn with_resolver(config: ActConfig, resolver: R, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            resolver,
            builder: RequestBuilder::new(&config.widget),
            transport,
        })
    }

    /// Dispatch `params` and invoke `callback` exactly once with
    /// `(error, body, response)`.
    pub fn call<F>(&self, params: &Value, callback: F)
    where
        F: FnOnce(Option<ActError>, Option<ResponseBody>, Option<HttpResponse>),
    {
        let (error, body, response) = self.dispatch(params).into_parts();
        callback(error, body, response)
    }

    pub fn call_request<F>(&self, request: &CallRequest, callback: F)
    where
        F: FnOnce(Option<ActError>, Option<ResponseBody>, Option<HttpResponse>),
    {
        let (error, body, response) = self.dispatch_request(request).into_parts();
        callback(error, body, response)
    }

    pub fn dispatch(&self, params: &Value) -> CallResult {
        match validate(params) {
            Ok(request) => self.dispatch_request(&request),
            Err(error) => CallResult::failed(error),
        }
    }

    pub fn dispatch_request(&self, request: &CallRequest) -> CallResult {
        let prepared = match self.prepare_request(request) {
            Ok(prepared) => prepared,
            Err(error) => return CallResult::failed(error),
        };

        debug!(guid = %request.guid, method = %prepared.method, url = %prepared.url, "dispatching call");
        match self.transport.execute(&prepared) {
            Ok(response) => CallResult::from_response(response, prepared.json),
            Err(error) => {
                warn!(guid = %request.guid, url = %prepared.url, %error, "call failed in transport");
                CallResult::failed(error.into())
            }
        }
    }

    /// Validate, resolve and build without performing any I/O.
    pub fn prepare(&self, params: &Value) -> Result<HttpRequest, ActError> {
        let request = validate(params)?;
        self.prepare_request(&request)
    }

    pub fn prepare_request(&self, request: &CallRequest) -> Result<HttpRequest, ActError> {
        validate_request(request)?;
        let target = self.resolver.resolve(&request.guid)?;
        self.builder.build(&target, request)
    }
}
