//! Raw JSON snapshot and completion manifest.
//!
//! The snapshot is a pure export of fetched state: collections are written in
//! the order they were fetched, bodies as the platform returned them, and
//! attachment payloads base64-encoded so the snapshot alone is enough for a
//! restore.

use crate::error::{ErrorKind, Result};
use crate::graph::{ResourceGraph, ResourceKind};
use crate::plan::CollisionPolicy;
use crate::resolve::{AttachmentIndex, Identity};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::ResultExt;
use helpvault_client::models::{Attachment, Extra, Locale};
use helpvault_storage::BackendHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{info, instrument};

pub const RAW_DIR: &str = "raw";
pub const MANIFEST: &str = "manifest.json";

/// Serializes `value` with four-space indentation and a trailing newline.
fn to_pretty_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer).or_raise(|| ErrorKind::Encode(what.to_string()))?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// `{"<key>": [...]}`
fn wrapped<T: Serialize>(key: &str, items: &[T]) -> Result<Vec<u8>> {
    let document = BTreeMap::from([(key, items)]);
    to_pretty_json(&document, key)
}

/// The attachment object as fetched, plus a base64 `content` field holding
/// the downloaded payload.
fn attachment_record(attachment: &Attachment) -> Extra {
    let mut record = attachment.raw().clone();
    let content = attachment.content.as_deref().map(|content| BASE64.encode(content));
    record.insert("content".to_string(), content.map_or(Value::Null, Value::String));
    record
}

async fn write(backend: &BackendHandle, path: &Path, data: &[u8]) -> Result<()> {
    backend.write(path, data).await.or_raise(|| ErrorKind::Storage)
}

/// Writes the raw snapshot below `raw/`, returning the written paths.
///
/// ```text
/// raw/articles/articles_<locale>.json
/// raw/categories/categories_<locale>.json
/// raw/sections/sections_<locale>.json
/// raw/articles_attachments.json
/// ```
#[instrument(skip_all)]
pub async fn write_snapshot(
    backend: &BackendHandle,
    graph: &ResourceGraph,
    attachments: &AttachmentIndex,
) -> Result<Vec<PathBuf>> {
    let raw = Path::new(RAW_DIR);
    let mut written = Vec::new();
    for (locale, resources) in graph.iter() {
        let documents = [
            ("articles", wrapped("articles", resources.articles())?),
            ("categories", wrapped("categories", resources.categories())?),
            ("sections", wrapped("sections", resources.sections())?),
        ];
        for (kind, document) in documents {
            let path = raw.join(kind).join(format!("{kind}_{locale}.json"));
            write(backend, &path, &document).await?;
            written.push(path);
        }
    }

    let records: Vec<_> = attachments.iter().map(|(_, attachment)| attachment_record(attachment)).collect();
    let path = raw.join("articles_attachments.json");
    write(backend, &path, &wrapped("articles_attachments", &records)?).await?;
    written.push(path);

    info!(files = written.len(), attachments = records.len(), "raw snapshot written");
    Ok(written)
}

/// Per-locale resource counts recorded in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleSummary {
    pub articles: usize,
    pub categories: usize,
    pub sections: usize,
}

/// Written last, so its presence marks a backup as complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub generator: String,
    pub domain: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub completed_at: OffsetDateTime,
    pub identity: Identity,
    pub collisions: CollisionPolicy,
    pub locales: BTreeMap<Locale, LocaleSummary>,
    pub attachments: usize,
    pub rendered: usize,
    pub collisions_detected: usize,
}

impl Manifest {
    pub fn summarize(graph: &ResourceGraph) -> BTreeMap<Locale, LocaleSummary> {
        graph
            .iter()
            .map(|(locale, resources)| {
                (
                    locale.clone(),
                    LocaleSummary {
                        articles: resources.articles().len(),
                        categories: resources.categories().len(),
                        sections: resources.sections().len(),
                    },
                )
            })
            .collect()
    }

    pub fn total(&self, kind: ResourceKind) -> usize {
        self.locales
            .values()
            .map(|summary| match kind {
                ResourceKind::Article => summary.articles,
                ResourceKind::Category => summary.categories,
                ResourceKind::Section => summary.sections,
            })
            .sum()
    }
}

pub async fn write_manifest(backend: &BackendHandle, manifest: &Manifest) -> Result<()> {
    write(backend, Path::new(MANIFEST), &to_pretty_json(manifest, MANIFEST)?).await
}
