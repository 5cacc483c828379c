use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A source could not be read or did not match the expected shape.
    #[display("could not load configuration")]
    Load,
    /// An explicitly requested config file does not exist or has an
    /// unsupported extension.
    #[display("unusable config file: {_0}")]
    File(#[error(not(source))] String),
    #[display("missing required setting '{_0}'")]
    Missing(#[error(not(source))] &'static str),
    #[display("invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
