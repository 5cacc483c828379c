//! Attachment discovery and download.
//!
//! The platform's per-article attachment listing is unreliable, so the bodies
//! are the source of truth: every platform image embedded in a body becomes an
//! attachment of that article. Metadata is then fetched once per distinct id,
//! and finally every payload is downloaded. [`resolve`] only returns once all
//! of that has finished, which is the barrier rendering depends on.

use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::graph::{ArticleKey, ResourceGraph};
use exn::ResultExt;
use futures::{StreamExt, TryStreamExt, stream};
use helpvault_client::models::{Article, Attachment, Locale};
use helpvault_client::{HelpCenter, Transport};
use helpvault_extract::{Target, noscript_references, sanitize_filename, scan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// How article records of different locales relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Identity {
    /// `(locale, id)` is the article key; every locale's body is scanned and
    /// owns its own attachment list.
    #[default]
    PerLocale,
    /// The numeric id is canonical across locales. One record per id is
    /// scanned (the default locale's when present) and its attachment list is
    /// shared by every locale.
    ById,
}

impl FromStr for Identity {
    type Err = ErrorKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-locale" => Ok(Self::PerLocale),
            "by-id" => Ok(Self::ById),
            _ => Err(ErrorKind::UnknownSetting {
                setting: "identity",
                value: s.to_string(),
            }),
        }
    }
}

impl Identity {
    pub fn owner(&self, key: &ArticleKey) -> Owner {
        match self {
            Self::PerLocale => Owner::Localized(key.clone()),
            Self::ById => Owner::Canonical(key.id),
        }
    }

    /// The articles whose bodies are scanned under this policy.
    pub fn distinct_articles<'a>(
        &self,
        graph: &'a ResourceGraph,
        default_locale: &Locale,
    ) -> Vec<(ArticleKey, &'a Article)> {
        match self {
            Self::PerLocale => graph.articles().collect(),
            Self::ById => {
                let mut canonical: BTreeMap<u64, (ArticleKey, &Article)> = BTreeMap::new();
                for (key, article) in graph.articles() {
                    match canonical.entry(key.id) {
                        Entry::Vacant(entry) => {
                            entry.insert((key, article));
                        },
                        Entry::Occupied(mut entry) if &key.locale == default_locale => {
                            entry.insert((key, article));
                        },
                        Entry::Occupied(_) => {},
                    }
                }
                canonical.into_values().collect()
            },
        }
    }
}

/// Key of an attachment list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Owner {
    Localized(ArticleKey),
    Canonical(u64),
}

/// Name an attachment is stored under, both on disk and in rewritten links.
pub fn file_name(attachment: &Attachment) -> String {
    sanitize_filename(&attachment.display_name())
}

/// The global, cross-locale attachment index.
#[derive(Debug, Clone, Default)]
pub struct AttachmentIndex {
    identity: Identity,
    attachments: BTreeMap<u64, Attachment>,
    owners: BTreeMap<Owner, Vec<u64>>,
    /// Discovered ids without metadata yet, with the article to fetch them through.
    pending: BTreeMap<u64, u64>,
}

impl AttachmentIndex {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            ..Self::default()
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Records every platform attachment embedded in `body` against the
    /// article, returning the article's full attachment list.
    ///
    /// Ids already on the list are not appended again, so discovering the
    /// same body twice leaves the list unchanged. Foreign media is skipped.
    pub fn discover(&mut self, key: &ArticleKey, body: &str) -> &[u64] {
        let list = self.owners.entry(self.identity.owner(key)).or_default();
        for reference in scan(body) {
            match reference.target {
                Target::Platform(id) => {
                    if !list.contains(&id) {
                        list.push(id);
                    }
                    if !self.attachments.contains_key(&id) {
                        self.pending.entry(id).or_insert(key.id);
                    }
                },
                Target::Foreign => {
                    warn!(article = %key, src = %reference.src, "skipping non-platform media");
                },
            }
        }
        for reference in noscript_references(body) {
            if let Target::Platform(id) = reference.target {
                warn!(article = %key, attachment = id, src = %reference.src, "image inside <noscript> is not backed up");
            }
        }
        list
    }

    /// Stores fetched metadata under the id it was requested as.
    pub fn insert(&mut self, id: u64, attachment: Attachment) {
        if attachment.id != id {
            warn!(requested = id, returned = attachment.id, "attachment metadata id mismatch");
        }
        self.pending.remove(&id);
        self.attachments.insert(id, attachment);
    }

    /// Populates a payload. A payload, once set, is never replaced.
    pub fn set_content(&mut self, id: u64, content: Vec<u8>) -> bool {
        match self.attachments.get_mut(&id) {
            Some(attachment) if attachment.content.is_none() => {
                attachment.content = Some(content);
                true
            },
            _ => false,
        }
    }

    /// The attachment list of one locale's article.
    pub fn for_article(&self, key: &ArticleKey) -> &[u64] {
        self.owners.get(&self.identity.owner(key)).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn get(&self, id: u64) -> Option<&Attachment> {
        self.attachments.get(&id)
    }

    /// Relative link to an attachment from its article's directory.
    pub fn local_path(&self, id: u64) -> Option<String> {
        self.get(id).map(|attachment| format!("./attachments/{id}/{}", file_name(attachment)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &Attachment)> {
        self.attachments.iter().map(|(id, attachment)| (*id, attachment))
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    fn pending_metadata(&self) -> Vec<(u64, u64)> {
        self.pending.iter().map(|(id, article_id)| (*id, *article_id)).collect()
    }

    fn pending_content(&self) -> Vec<(u64, String)> {
        self.attachments
            .iter()
            .filter(|(_, attachment)| attachment.content.is_none())
            .map(|(id, attachment)| (*id, attachment.content_url.clone()))
            .collect()
    }
}

/// Builds the complete attachment index for `graph`.
///
/// Three passes, each finished before the next starts: body scanning,
/// metadata requests, content downloads. Requests run with at most
/// `ctx.concurrency` in flight and each distinct id is requested once no
/// matter how many articles embed it. Any failed request aborts.
#[instrument(skip_all, fields(identity = ?ctx.identity))]
pub async fn resolve<T: Transport>(client: &HelpCenter<T>, graph: &ResourceGraph, ctx: &Context) -> Result<AttachmentIndex> {
    let mut index = AttachmentIndex::new(ctx.identity);
    let articles = ctx.identity.distinct_articles(graph, &ctx.default_locale);
    for (key, article) in &articles {
        let found = index.discover(key, article.body()).len();
        debug!(article = %key, attachments = found, "article scanned");
    }
    let pending = index.pending_metadata();
    info!(articles = articles.len(), attachments = pending.len(), "attachments discovered");

    let fetched: Vec<(u64, Attachment)> = stream::iter(pending)
        .map(|(id, article_id)| async move { client.attachment(article_id, id).await.map(|attachment| (id, attachment)) })
        .buffer_unordered(ctx.concurrency.max(1))
        .try_collect()
        .await
        .or_raise(|| ErrorKind::Protocol)?;
    for (id, attachment) in fetched {
        index.insert(id, attachment);
    }

    let downloads = index.pending_content();
    let contents: Vec<(u64, Vec<u8>)> = stream::iter(downloads)
        .map(|(id, url)| async move { client.download(&url).await.map(|content| (id, content)) })
        .buffer_unordered(ctx.concurrency.max(1))
        .try_collect()
        .await
        .or_raise(|| ErrorKind::Protocol)?;
    let bytes: usize = contents.iter().map(|(_, content)| content.len()).sum();
    for (id, content) in contents {
        index.set_content(id, content);
    }
    info!(attachments = index.len(), bytes, "attachments downloaded");
    Ok(index)
}
