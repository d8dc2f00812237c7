//! Call an endpoint on another application by its guid.
//!
//! # Overview
//! A caller names a target app (`guid`) and an operation (`endpoint` or
//! `path`). The core validates the request, resolves the guid to a base URL,
//! builds an `HttpRequest`, hands it to a `Transport`, and reports the
//! outcome through one callback as `(error, body, response)`.
//!
//! # Design
//! - `Dispatcher` is immutable after construction; its configuration is an
//!   explicit `ActConfig` value, never process-global state.
//! - Validation, resolution and request building are pure and usable on
//!   their own (`Dispatcher::prepare`) when the host wants to do the I/O.
//! - The transport is a trait; `UreqTransport` ships behind the default
//!   `ureq` feature.

pub mod builder;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod resolve;
pub mod transport;
pub mod types;
pub mod validate;

pub use builder::{url_path_join, RequestBuilder, IDENTITY_HEADER};
pub use config::{ActConfig, ConfigError};
pub use dispatch::{CallResult, Dispatcher};
pub use error::{ActError, ErrorKind, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};
pub use resolve::{Resolve, ResolvedTarget, ServiceMapResolver};
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::CallRequest;
pub use validate::{is_valid_guid, validate, validate_request};
