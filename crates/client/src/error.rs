//! Client Error Types
//!
//! Everything in here is a protocol failure from the point of view of a
//! backup run: the platform answered with something other than a successful,
//! well-formed page. None of them are retried.

use crate::models::CollectionKind;
use derive_more::{Display, Error};

/// A client error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The platform answered with a non-success status.
    #[display("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    /// The request never produced a response (DNS, TLS, timeout, reset…).
    #[display("request to {_0} failed")]
    Network(#[error(not(source))] String),
    /// A configured domain or a server-provided link is not a valid URL.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// A page matched none of the known collection schemas.
    #[display("response contains none of the known collections")]
    UnknownCollection,
    /// A pagination walk changed resource kind half-way through.
    #[display("expected a page of {expected}, got {found}")]
    MismatchedCollection { expected: CollectionKind, found: CollectionKind },
    /// A single-resource response lacked its wrapping field.
    #[display("response is missing field '{_0}'")]
    MissingField(#[error(not(source))] &'static str),
    /// The body was not the JSON shape expected for this endpoint.
    #[display("could not decode {_0}")]
    Decode(#[error(not(source))] &'static str),
    /// A `next_page` link pointed back at a page that was already visited.
    #[display("pagination loops back to {_0}")]
    PaginationLoop(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::ResultExt;

    #[test]
    fn error_kind_display() {
        let status = ErrorKind::Status {
            url: "https://acme.example.com/api/v2/help_center/locales".to_string(),
            status: 403,
        };
        assert_eq!(status.to_string(), "https://acme.example.com/api/v2/help_center/locales responded with HTTP 403");
        let mismatch = ErrorKind::MismatchedCollection {
            expected: CollectionKind::Articles,
            found: CollectionKind::Sections,
        };
        assert_eq!(mismatch.to_string(), "expected a page of articles, got sections");
    }

    #[test]
    fn error_kind_retryable() {
        let status = |status| ErrorKind::Status { url: String::new(), status };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!ErrorKind::UnknownCollection.is_retryable());
        assert!(ErrorKind::Network("x".to_string()).is_retryable());
    }

    #[test]
    fn error_from_result() {
        let result: std::result::Result<(), serde_json::Error> = serde_json::from_str::<()>("{").map(|_| ());
        let err: Result<()> = result.or_raise(|| ErrorKind::Decode("page"));
        assert_eq!(*err.unwrap_err(), ErrorKind::Decode("page"));
    }
}
