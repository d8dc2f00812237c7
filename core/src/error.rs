//! Error types for the call-dispatch core.
//!
//! # Design
//! Every recoverable failure is an `ActError` value handed to the completion
//! callback as its first argument. Display strings keep the wording callers
//! already match on. `ErrorKind` groups the variants by the stage that
//! produced them, so callers can tell a bad request from a bad service map
//! from a network failure without matching every variant.

use thiserror::Error;

/// Coarse classification of an `ActError` by the stage that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The call request was malformed. Raised before any I/O.
    Validation,
    /// The local service map could not be parsed. Raised before any I/O.
    Config,
    /// No base URL could be determined for the guid. Raised before any I/O.
    Resolution,
    /// The payload could not be encoded.
    Serialization,
    /// The transport failed to complete the request.
    Transport,
}

/// Errors delivered through the completion callback.
#[derive(Debug, Error)]
pub enum ActError {
    #[error("params is missing")]
    MissingParms,

    #[error("The param {0} is missing")]
    MissingArgument(&'static str),

    #[error("The param {name} is invalid it is required to be a {expected}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
    },

    #[error("The app identifier (guid) is invalid {0} . Please check it.")]
    InvalidGuid(String),

    #[error("Either \"path\" or \"endpoint\" is required.")]
    MissingAddress,

    /// The request passed the field checks but still does not describe a call.
    #[error("params is invalid: {0}")]
    MalformedRequest(String),

    /// Carries the parser's reason for logging; the message stays fixed.
    #[error("Unable to parse local service map from FH_SERVICE_MAP environment variable")]
    ServiceMapParse(String),

    #[error("Unable to find mapping for guid {0}  in service map from FH_SERVICE_MAP environment variable")]
    HostNotFound(String),

    #[error("Unable to determine base url {url} for target app: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ActError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActError::MissingParms
            | ActError::MissingArgument(_)
            | ActError::InvalidArgument { .. }
            | ActError::InvalidGuid(_)
            | ActError::MissingAddress
            | ActError::MalformedRequest(_) => ErrorKind::Validation,
            ActError::ServiceMapParse(_) => ErrorKind::Config,
            ActError::HostNotFound(_) | ActError::InvalidBaseUrl { .. } => ErrorKind::Resolution,
            ActError::Serialization(_) => ErrorKind::Serialization,
            ActError::Transport(_) => ErrorKind::Transport,
        }
    }
}

/// Failures reported by a `Transport` implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within its timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection, DNS, TLS or body read failure.
    #[error("transport failure: {0}")]
    Io(String),

    /// The descriptor could not be turned into a wire request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_keep_legacy_wording() {
        assert_eq!(ActError::MissingParms.to_string(), "params is missing");
        assert_eq!(ActError::MissingArgument("guid").to_string(), "The param guid is missing");
        assert_eq!(
            ActError::InvalidArgument { name: "params", expected: "object" }.to_string(),
            "The param params is invalid it is required to be a object"
        );
        assert_eq!(
            ActError::InvalidGuid("-bad".into()).to_string(),
            "The app identifier (guid) is invalid -bad . Please check it."
        );
        assert_eq!(
            ActError::MissingAddress.to_string(),
            "Either \"path\" or \"endpoint\" is required."
        );
        assert_eq!(
            ActError::ServiceMapParse("eof".into()).to_string(),
            "Unable to parse local service map from FH_SERVICE_MAP environment variable"
        );
        assert_eq!(
            ActError::HostNotFound("app-2".into()).to_string(),
            "Unable to find mapping for guid app-2  in service map from FH_SERVICE_MAP environment variable"
        );
    }

    #[test]
    fn kinds_follow_the_raising_stage() {
        assert_eq!(ActError::MissingParms.kind(), ErrorKind::Validation);
        assert_eq!(ActError::MalformedRequest("shape".into()).kind(), ErrorKind::Validation);
        assert_eq!(ActError::ServiceMapParse("eof".into()).kind(), ErrorKind::Config);
        assert_eq!(ActError::HostNotFound("app".into()).kind(), ErrorKind::Resolution);
        let err: ActError = TransportError::Timeout("global".into()).into();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
