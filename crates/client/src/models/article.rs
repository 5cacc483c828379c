use super::timestamp::rfc3339;
use super::{Extra, Locale};
use serde::Deserialize;
use time::OffsetDateTime;

/// A single knowledge-base document.
///
/// `body` holds the HTML exactly as fetched. Rendering never mutates it; the
/// rewritten form is produced as a separate string, so the raw snapshot always
/// reflects what the platform returned.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(remote = "Self")]
pub struct Article {
    pub id: u64,
    pub section_id: u64,
    pub locale: Locale,
    #[serde(default)]
    pub source_locale: Option<Locale>,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub label_names: Vec<String>,
    #[serde(default, with = "rfc3339")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "rfc3339")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, with = "rfc3339")]
    pub edited_at: Option<OffsetDateTime>,
    #[serde(skip)]
    raw: Extra,
}

fetched_record!(Article);

impl Article {
    /// The fetched HTML body; articles without one are treated as empty.
    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}
