//! Help Center backup pipeline: resource graph, attachment resolution, path
//! planning, rendering and the raw snapshot.

mod backup;
pub mod error;
pub mod graph;
pub mod plan;
pub mod render;
pub mod resolve;
pub mod snapshot;
mod template;

pub use crate::backup::{Backup, run};
pub use crate::graph::{ArticleKey, ResourceGraph};
pub use crate::plan::CollisionPolicy;
pub use crate::resolve::{AttachmentIndex, Identity};
pub use crate::template::{DEFAULT_LAYOUT, PathGenerator};
use helpvault_client::models::Locale;

/// Default number of requests (and article renders) in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Settings shared by every phase of a run.
#[derive(Debug)]
pub struct Context {
    /// Upper bound on concurrent requests and renders; treated as at least 1.
    pub concurrency: usize,
    pub identity: Identity,
    /// Preferred record when several locales share an article id.
    pub default_locale: Locale,
    pub collisions: CollisionPolicy,
    pub layout: PathGenerator,
}

impl Context {
    pub fn new(default_locale: Locale) -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            identity: Identity::default(),
            default_locale,
            collisions: CollisionPolicy::default(),
            layout: PathGenerator::default(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_collisions(mut self, collisions: CollisionPolicy) -> Self {
        self.collisions = collisions;
        self
    }

    pub fn with_layout(mut self, layout: PathGenerator) -> Self {
        self.layout = layout;
        self
    }
}
