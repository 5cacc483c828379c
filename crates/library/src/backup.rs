//! The backup pipeline.
//!
//! Each phase takes the aggregate produced by the previous one and hands back
//! a richer one; nothing is kept in shared state between phases.

use crate::Context;
use crate::error::Result;
use crate::graph::{ResourceGraph, ResourceKind};
use crate::plan::{PathPlan, plan};
use crate::render::{RenderEvent, Renderer};
use crate::resolve::{AttachmentIndex, resolve};
use crate::snapshot::{Manifest, write_manifest, write_snapshot};
use futures::StreamExt;
use helpvault_client::models::Locale;
use helpvault_client::{HelpCenter, Transport};
use helpvault_storage::BackendHandle;
use std::pin::pin;
use time::OffsetDateTime;
use tracing::{info, instrument};

/// Everything fetched and resolved for one run.
#[derive(Debug, Clone)]
pub struct Backup {
    pub graph: ResourceGraph,
    pub attachments: AttachmentIndex,
}

impl Backup {
    /// Fetches the resource graph and resolves every attachment.
    ///
    /// Returns only once the attachment index is complete; rendering relies
    /// on that barrier.
    pub async fn fetch<T: Transport>(client: &HelpCenter<T>, locales: &[Locale], ctx: &Context) -> Result<Self> {
        let graph = ResourceGraph::build(client, locales).await?;
        let attachments = resolve(client, &graph, ctx).await?;
        Ok(Self { graph, attachments })
    }

    pub async fn write_snapshot(&self, backend: &BackendHandle) -> Result<()> {
        write_snapshot(backend, &self.graph, &self.attachments).await.map(|_| ())
    }

    pub fn plan(&self, ctx: &Context) -> Result<PathPlan<'_>> {
        plan(&self.graph, &ctx.layout, ctx.collisions)
    }

    /// Renders every planned article, returning how many were rendered.
    pub async fn render(&self, backend: &BackendHandle, plan: &PathPlan<'_>, ctx: &Context) -> Result<usize> {
        let renderer = Renderer::new(backend.clone());
        let mut events = pin!(renderer.render_all(plan, &self.attachments, ctx.concurrency));
        let mut rendered = 0;
        while let Some(event) = events.next().await {
            if let RenderEvent::Rendered(_) = event? {
                rendered += 1;
            }
        }
        Ok(rendered)
    }
}

/// Runs a complete backup into `backend`: fetch and resolve, raw snapshot,
/// planning, rendering and finally the manifest.
///
/// The manifest is only written when every earlier phase succeeded.
#[instrument(skip_all, fields(backend = backend.name(), domain = %client.domain()))]
pub async fn run<T: Transport>(
    client: &HelpCenter<T>,
    backend: &BackendHandle,
    locales: &[Locale],
    ctx: &Context,
) -> Result<Manifest> {
    let started_at = OffsetDateTime::now_utc();
    let backup = Backup::fetch(client, locales, ctx).await?;
    backup.write_snapshot(backend).await?;
    let plan = backup.plan(ctx)?;
    let rendered = backup.render(backend, &plan, ctx).await?;

    let manifest = Manifest {
        generator: concat!("helpvault ", env!("CARGO_PKG_VERSION")).to_string(),
        domain: client.domain().to_string(),
        started_at,
        completed_at: OffsetDateTime::now_utc(),
        identity: ctx.identity,
        collisions: ctx.collisions,
        locales: Manifest::summarize(&backup.graph),
        attachments: backup.attachments.len(),
        rendered,
        collisions_detected: plan.collisions(),
    };
    write_manifest(backend, &manifest).await?;
    info!(
        articles = manifest.total(ResourceKind::Article),
        categories = manifest.total(ResourceKind::Category),
        sections = manifest.total(ResourceKind::Section),
        attachments = manifest.attachments,
        rendered,
        "backup complete"
    );
    Ok(manifest)
}
