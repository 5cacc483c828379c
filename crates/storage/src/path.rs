//! Path validation for everything written below a backup root.
//!
//! Category, section and article names come from the help center and are
//! sanitized before they ever reach this module, but the backend still refuses
//! any relative path that would climb out of the backup root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a path relative to the backup root.
///
/// `.` components and duplicate separators are dropped, `..` is resolved
/// against the components seen so far and must never pop past the root.
/// Null bytes and platform prefixes are rejected, as is a path that
/// normalizes to nothing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use helpvault_storage::validate_path;
/// assert!(validate_path("Billing/Invoices/Refunds.md").is_ok());
/// assert!(validate_path("raw/articles/articles_en-us.json").is_ok());
/// assert!(validate_path("../outside.md").is_err());
/// assert!(validate_path("Billing/../../outside.md").is_err());
/// assert_eq!(
///     validate_path("./Billing//Invoices/attachments/555/").unwrap(),
///     Path::new("Billing/Invoices/attachments/555")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Null bytes survive Path::components() on Unix and then
                // truncate the path inside the syscall.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
    }
    Ok(components.into_iter().collect())
}
