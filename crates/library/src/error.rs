//! Library Error Types
//!
//! Every variant is fatal to a backup run. The error tree built by `exn`
//! keeps the underlying client or storage failure as a child, so the binary
//! can print the full cause chain.

use derive_more::{Display, Error};
use helpvault_client::models::Locale;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a backup failure.
///
/// ### Data Errors
/// - [`ErrorKind::Resolution`]
/// - [`ErrorKind::Integrity`]
/// - [`ErrorKind::Collision`]
/// - [`ErrorKind::Markup`]
/// - [`ErrorKind::UnknownSetting`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Protocol`]
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Template`]
/// - [`ErrorKind::Encode`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The platform returned a non-success status or an unrecognized payload.
    #[display("help center request failed")]
    Protocol,
    /// A reference points at data that was never collected.
    #[display("unresolved reference: {_0}")]
    Resolution(#[error(not(source))] Dangling),
    /// An attachment reached rendering without its payload.
    #[display("attachment {_0} has no downloaded content")]
    Integrity(#[error(not(source))] u64),
    /// Writing to the output directory failed.
    #[display("could not write backup output")]
    Storage,
    /// The layout template could not be compiled or rendered.
    #[display("issue with path generation from template")]
    Template,
    /// Two articles were planned onto the same output file.
    #[display("output path collision at {_0}")]
    Collision(#[error(not(source))] String),
    /// An article body could not be rewritten.
    #[display("could not rewrite article body")]
    Markup,
    /// A snapshot or manifest document could not be serialized.
    #[display("could not encode {_0}")]
    Encode(#[error(not(source))] String),
    /// A policy name that does not match any variant.
    #[display("unknown {setting} '{value}'")]
    UnknownSetting { setting: &'static str, value: String },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The underlying request might have been a timeout or 5xx.
        matches!(self, Self::Protocol)
    }
}

/// The missing end of a reference.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Dangling {
    #[display("article {article_id} ({locale}) belongs to unknown section {section_id}")]
    Section { locale: Locale, article_id: u64, section_id: u64 },
    #[display("section {section_id} ({locale}) belongs to unknown category {category_id}")]
    Category { locale: Locale, section_id: u64, category_id: u64 },
    #[display("article {article_id} ({locale}) embeds unknown attachment {attachment_id}")]
    Attachment { locale: Locale, article_id: u64, attachment_id: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let kind = ErrorKind::Resolution(Dangling::Attachment {
            locale: Locale::from("fr"),
            article_id: 1001,
            attachment_id: 999,
        });
        assert_eq!(kind.to_string(), "unresolved reference: article 1001 (fr) embeds unknown attachment 999");
        assert_eq!(ErrorKind::Integrity(555).to_string(), "attachment 555 has no downloaded content");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Protocol.is_retryable());
        assert!(!ErrorKind::Integrity(1).is_retryable());
        assert!(!ErrorKind::Collision("a/b.md".to_string()).is_retryable());
    }
}
