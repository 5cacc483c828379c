//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::Result;
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Files and directories are kept behind a [`RwLock`], so all trait methods
/// can operate on `&self`. Writing a file implicitly creates its parent
/// directories, like [`LocalBackend`](super::LocalBackend) does.
///
/// # Examples
///
/// ```
/// use helpvault_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::default();
/// backend.write(Path::new("Billing/Invoices/Refunds.md"), b"# Refunds").await?;
/// assert!(backend.directories().await.contains(&Path::new("Billing/Invoices").to_path_buf()));
/// assert_eq!(backend.files().await, vec![Path::new("Billing/Invoices/Refunds.md").to_path_buf()]);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    directories: RwLock<BTreeSet<PathBuf>>,
}

impl MockBackend {
    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Every file path currently stored, in sorted order.
    pub async fn files(&self) -> Vec<PathBuf> {
        self.files.read().await.keys().cloned().collect()
    }

    /// Every directory currently known, in sorted order.
    pub async fn directories(&self) -> Vec<PathBuf> {
        self.directories.read().await.iter().cloned().collect()
    }

    /// Reads a stored file as UTF-8, panicking if it is missing or not text.
    ///
    /// Test helper; setup mistakes should fail loudly.
    pub async fn read_to_string(&self, path: impl AsRef<Path>) -> String {
        let Some(data) = self.files.read().await.get(path.as_ref()).cloned() else {
            panic!("MockBackend::read_to_string: no file at {}", path.as_ref().display());
        };
        match String::from_utf8(data) {
            Ok(text) => text,
            Err(_) => panic!("MockBackend::read_to_string: {} is not UTF-8", path.as_ref().display()),
        }
    }

    async fn register_parents(&self, path: &Path) {
        let mut directories = self.directories.write().await;
        let mut current = path.parent();
        while let Some(parent) = current
            && !parent.as_os_str().is_empty()
        {
            directories.insert(parent.to_path_buf());
            current = parent.parent();
        }
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            files: RwLock::new(BTreeMap::new()),
            directories: RwLock::new(BTreeSet::new()),
        }
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.register_parents(&path).await;
        self.files.write().await.insert(path, data.to_vec());
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.register_parents(&path).await;
        self.directories.write().await.insert(path);
        Ok(())
    }
}
