//! Output directory templating.
//!
//! Converts an article's place in the hierarchy into a directory path using a
//! user-configured [upon] template. The syntax follows upon's Mustache-like
//! conventions (`{{ variable }}`, `{{ value|formatter }}`), extended with:
//!
//! - **`sanitize`**: the safe-filename rules of
//!   [`helpvault_extract::sanitize_filename`]. Every name that ends up as a
//!   path segment should go through it (or `slug`).
//! - **`slug`**: lowercase URL-style slugs, stripping quotation marks first to
//!   avoid artifacts like leading/trailing hyphens.
//! - **`truncate`**: truncates a string to a maximum byte length at a
//!   character boundary, as `truncate(value, n)` or `{{ value|truncate: n }}`.
//!
//! # Template Variables
//!
//! | Variable            | Type          | Description                          |
//! |---------------------|---------------|--------------------------------------|
//! | `locale`            | `String`      | Locale code, e.g. `en-us`            |
//! | `category`          | `String`      | Category name                        |
//! | `category_id`       | `u64`         | Category id                          |
//! | `section`           | `String`      | Section name                         |
//! | `section_id`        | `u64`         | Section id                           |
//! | `parent_section_id` | `Option<u64>` | Id of the enclosing section, if any  |
//!
//! # Example
//!
//! ```
//! use helpvault_library::PathGenerator;
//! # use helpvault_client::models::{Category, Section};
//! # let category: Category = serde_json::from_value(serde_json::json!({
//! #     "id": 10, "name": "Billing & Payments", "locale": "fr",
//! # })).unwrap();
//! # let section: Section = serde_json::from_value(serde_json::json!({
//! #     "id": 20, "category_id": 10, "name": "Invoices", "locale": "fr",
//! # })).unwrap();
//!
//! let generator: PathGenerator = "{{ locale }}/{{ category|slug }}/{{ section|sanitize }}".parse().unwrap();
//! let path = generator.generate(&category, &section).unwrap();
//! assert_eq!(path, "fr/billing-payments/Invoices");
//! ```

use crate::error::{Error, ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use helpvault_client::models::{Category, Section};
use helpvault_storage::validate_path;
use std::str::FromStr;
use tracing::instrument;
use upon::{Engine, Template};

/// `sanitize(category.name)/sanitize(section.name)`
pub const DEFAULT_LAYOUT: &str = "{{ category|sanitize }}/{{ section|sanitize }}";

/// Generates deterministic directory paths from a category/section pair and a
/// user-defined template string.
///
/// Constructed via [`FromStr`], which compiles the template eagerly so that
/// syntax errors surface at creation time rather than at render time.
pub struct PathGenerator {
    engine: Engine<'static>,
    template: Template<'static>,
    source: String,
}
impl FromStr for PathGenerator {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        // Compile the template early so we can fail-fast in construction.
        let template = engine.compile(s.to_string()).or_raise(|| ErrorKind::Template)?;
        Ok(Self {
            engine,
            template,
            source: s.to_string(),
        })
    }
}
impl Default for PathGenerator {
    fn default() -> Self {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let template = match engine.compile(DEFAULT_LAYOUT) {
            Ok(template) => template,
            Err(err) => unreachable!("default layout must compile: {err}"),
        };
        Self {
            engine,
            template,
            source: DEFAULT_LAYOUT.to_string(),
        }
    }
}
impl std::fmt::Debug for PathGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathGenerator").field("template", &self.source).finish_non_exhaustive()
    }
}
impl PathGenerator {
    /// Renders the template for an article filed under `section` of `category`.
    ///
    /// The resulting path is trimmed, segment-wise normalized, and validated to
    /// ensure it stays within the backup root (no directory traversal).
    #[instrument(level = "trace", skip_all, fields(category = category.id, section = section.id))]
    pub fn generate(&self, category: &Category, section: &Section) -> Result<String> {
        let path = self
            .template
            .render(&self.engine, Self::parameters(category, section))
            .to_string()
            .or_raise(|| ErrorKind::Template)?;
        Self::normalize(path)
    }

    /// Trims each path segment, joins them with `/`, then validates via
    /// [`helpvault_storage::validate_path`].
    fn normalize(s: impl Into<String>) -> Result<String> {
        let path = s.into().trim().split('/').map(str::trim).collect::<Vec<_>>().join("/");
        validate_path(&path).or_raise(|| ErrorKind::Template).and_then(|p| {
            p.to_str().map(|p| p.to_string())
            // Infallible: input was String, so won't fail.
            .ok_or_raise(|| ErrorKind::Template)
        })
    }

    fn parameters(category: &Category, section: &Section) -> upon::Value {
        upon::value! {
            locale: section.locale.as_str(),
            category: &category.name,
            category_id: category.id,
            section: &section.name,
            section_id: section.id,
            parent_section_id: section.parent_section_id,
        }
    }
}

/// Custom [`upon`] extensions for path-safe string manipulation.
mod addons {
    use helpvault_extract::sanitize_filename;
    use rslug::slugify;
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// Applies the safe-filename rules to strings; other values print as-is.
    fn sanitize_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => write!(f, "{}", sanitize_filename(s))?,
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    /// Converts strings to URL-safe slugs, dropping quotation marks first.
    fn slug_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                // Various quotation marks: '"''""„"`«»
                let marks = [
                    '\u{0027}', '\u{0022}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{201E}', '\u{201B}',
                    '\u{0060}', '\u{00AB}', '\u{00BB}', '\u{2039}', '\u{203A}',
                ];
                let stripped: String = s.chars().filter(|c| !marks.contains(c)).collect();
                write!(f, "{}", slugify!(&stripped))?
            },
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> String {
        s[..s.floor_char_boundary(max_bytes)].to_string()
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("sanitize", sanitize_formatter);
        engine.add_formatter("slug", slug_formatter);
        engine.add_function("truncate", truncate_to_char_boundary);
    }
}
