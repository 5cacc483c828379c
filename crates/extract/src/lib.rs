mod consts;
pub mod error;
#[cfg(feature = "markdown")]
mod markdown;
mod reference;
mod rewrite;
mod sanitize;

#[cfg(feature = "markdown")]
pub use crate::markdown::to_markdown;
pub use crate::reference::{Reference, Target, noscript_references, platform_ids, scan};
pub use crate::rewrite::rewrite_sources;
pub use crate::sanitize::{MAX_FILENAME_BYTES, UNNAMED, sanitize_filename};
