//! Error types for link resolution
//!
//! - `TransportError`: the request never produced a usable service envelope
//! - `ResolveError`: anything that ends a resolution path

use thiserror::Error;

use crate::models::ServiceError;

/// Network or decoding failure talking to the resolution service.
///
/// Kept clonable (the reqwest error is flattened to text) so poll sessions can
/// publish it as a terminal state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Service returned HTTP {0}")]
    Http(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err.to_string())
    }
}

/// Terminal failure of a resolution path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ResolveError {
    /// The service-reported failure, if this is one
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            ResolveError::Service(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_is_shown_verbatim() {
        let err = ResolveError::from(ServiceError::new("Link is dead"));
        assert_eq!(err.to_string(), "Link is dead");
        assert_eq!(err.service_error().map(|e| e.message.as_str()), Some("Link is dead"));
    }

    #[test]
    fn test_transport_error_display() {
        let err = ResolveError::from(TransportError::Http(503));
        assert_eq!(err.to_string(), "Service returned HTTP 503");
        assert!(err.service_error().is_none());
    }
}
