//! The I/O boundary.
//!
//! The core never opens sockets itself. A `Transport` receives a finished
//! `HttpRequest` and returns the raw `HttpResponse`; status codes are data,
//! not errors. `UreqTransport` is the blocking implementation shipped with
//! the default `ureq` feature.

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError>,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use super::Transport;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};

    /// Executes requests with a `ureq` agent configured per call.
    ///
    /// The agent is built for each request so the request's own timeout
    /// applies, and 4xx/5xx responses come back as data. A zero timeout
    /// means no timeout.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UreqTransport;

    impl UreqTransport {
        pub fn new() -> Self {
            Self
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .allow_non_standard_methods(true)
                .timeout_global((!request.timeout.is_zero()).then_some(request.timeout))
                .build()
                .new_agent();

            let mut builder = ureq::http::Request::builder()
                .method(request.method.as_str())
                .uri(request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let result = match &request.body {
                Some(body) => builder
                    .body(body.clone())
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))
                    .and_then(|req| agent.run(req).map_err(into_transport_error)),
                None => builder
                    .body(())
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))
                    .and_then(|req| agent.run(req).map_err(into_transport_error)),
            };
            let mut response = result?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(into_transport_error)?;

            Ok(HttpResponse { status, headers, body })
        }
    }

    fn into_transport_error(err: ureq::Error) -> TransportError {
        match err {
            ureq::Error::Timeout(_) => TransportError::Timeout(err.to_string()),
            other => TransportError::Io(other.to_string()),
        }
    }
}
