//! Storage backend trait and implementations.
//!
//! Every file a backup produces (raw JSON snapshot, rendered Markdown/HTML,
//! attachment payloads and the completion manifest) is written through a
//! [`StorageBackend`], so the pipeline can run against the local filesystem
//! or, in tests, an in-memory map.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for backup targets.
///
/// A backup only ever writes; nothing is read back from the target.
///
/// # Path Handling
/// All paths are relative to the backup root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use helpvault_storage::{backend::StorageBackend, error::Result};
///
/// async fn save_article(backend: &dyn StorageBackend, markdown: &str) -> Result<()> {
///     backend.create_dir_all(Path::new("Billing/Invoices/attachments")).await?;
///     backend.write(Path::new("Billing/Invoices/Refunds.md"), markdown.as_bytes()).await
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// Write file contents, overwriting any existing file.
    ///
    /// # Notes
    /// - Implementations create parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Create a directory (and its parents) if it is absent.
    ///
    /// Succeeds without doing anything if the directory already exists.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;
}
