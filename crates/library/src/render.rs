//! The nice tree: attachments, rewritten HTML and Markdown per article.

use crate::error::{Dangling, ErrorKind, Result};
use crate::graph::ArticleKey;
use crate::plan::{PathPlan, PlanEntry};
use crate::resolve::{AttachmentIndex, file_name};
use async_stream::stream;
use exn::{OptionExt, ResultExt};
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use helpvault_extract::{Target, rewrite_sources, scan, to_markdown};
use helpvault_storage::BackendHandle;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Files produced for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub key: ArticleKey,
    /// `None` when a later article took over the document paths.
    pub documents: Option<(PathBuf, PathBuf)>,
    pub attachments: Vec<PathBuf>,
}

/// Progress events emitted by [`Renderer::render_all`].
///
/// [`Started`](Self::Started) comes first and exactly once, followed by one
/// [`Rendered`](Self::Rendered) per planned article and finally
/// [`Complete`](Self::Complete). The first error ends the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Started(usize),
    Rendered(Rendered),
    Complete,
}

/// Writes articles and their attachments to a backend.
///
/// Attachments shared between articles that resolve to the same directory
/// are written only once per run.
pub struct Renderer {
    backend: BackendHandle,
    written: Mutex<HashSet<PathBuf>>,
}

impl Renderer {
    pub fn new(backend: BackendHandle) -> Self {
        Self {
            backend,
            written: Mutex::new(HashSet::new()),
        }
    }

    /// Renders one planned article.
    ///
    /// Every platform image in the body must resolve against the global
    /// `index`; an id that was never discovered is a
    /// [`Resolution`](ErrorKind::Resolution) error, while foreign media is
    /// left verbatim. The article's own attachments must carry their payload,
    /// otherwise this is an [`Integrity`](ErrorKind::Integrity) error.
    #[instrument(skip_all, fields(article = %entry.key))]
    pub async fn render(&self, entry: &PlanEntry<'_>, index: &AttachmentIndex) -> Result<Rendered> {
        let PlanEntry { key, article, path, .. } = entry;
        let body = article.body();

        // Resolve before touching the output so a dangling reference writes nothing.
        for reference in scan(body) {
            match reference.target {
                Target::Platform(id) if index.get(id).is_none() => {
                    exn::bail!(ErrorKind::Resolution(Dangling::Attachment {
                        locale: key.locale.clone(),
                        article_id: key.id,
                        attachment_id: id,
                    }));
                },
                Target::Platform(_) => {},
                Target::Foreign => debug!(src = %reference.src, "foreign media left verbatim"),
            }
        }
        let rewritten = rewrite_sources(body, |id| index.local_path(id)).or_raise(|| ErrorKind::Markup)?;

        self.backend.create_dir_all(&path.attachments()).await.or_raise(|| ErrorKind::Storage)?;
        let mut attachments = Vec::new();
        for &id in index.for_article(key) {
            let attachment = index.get(id).ok_or_raise(|| ErrorKind::Integrity(id))?;
            let content = attachment.content.as_deref().ok_or_raise(|| ErrorKind::Integrity(id))?;
            let target = path.attachment(id, &file_name(attachment));
            if self.written.lock().await.insert(target.clone()) {
                self.backend.write(&target, content).await.or_raise(|| ErrorKind::Storage)?;
            }
            attachments.push(target);
        }

        if entry.superseded {
            debug!(path = %path.markdown().display(), "documents superseded by a later article");
            return Ok(Rendered {
                key: key.clone(),
                documents: None,
                attachments,
            });
        }
        let markdown = to_markdown(&rewritten);
        self.backend.write(&path.markdown(), markdown.as_bytes()).await.or_raise(|| ErrorKind::Storage)?;
        self.backend.write(&path.html(), rewritten.as_bytes()).await.or_raise(|| ErrorKind::Storage)?;
        Ok(Rendered {
            key: key.clone(),
            documents: Some((path.markdown(), path.html())),
            attachments,
        })
    }

    /// Streams [`RenderEvent`]s while rendering every entry of `plan`, at most
    /// `concurrency` articles at a time.
    ///
    /// Must only be called with a fully resolved `index`.
    pub fn render_all<'a>(
        &'a self,
        plan: &'a PathPlan<'a>,
        index: &'a AttachmentIndex,
        concurrency: usize,
    ) -> impl Stream<Item = Result<RenderEvent>> + 'a {
        stream!({
            yield Ok(RenderEvent::Started(plan.len()));

            let mut futures: VecDeque<_> = plan.entries().iter().map(|entry| self.render(entry, index)).collect();
            let mut processing = FuturesUnordered::new();
            processing.extend(futures.drain(..concurrency.max(1).min(futures.len())));
            while let Some(result) = processing.next().await {
                match result {
                    Ok(rendered) => yield Ok(RenderEvent::Rendered(rendered)),
                    Err(err) => {
                        yield Err(err);
                        return;
                    },
                }
                // Pop-n-push, but FIFO instead of LIFO.
                if let Some(next) = futures.pop_front() {
                    processing.push(next);
                }
            }

            info!(articles = plan.len(), "articles rendered");
            yield Ok(RenderEvent::Complete);
        })
    }
}
