use super::timestamp::rfc3339;
use super::{Extra, Locale};
use serde::Deserialize;
use time::OffsetDateTime;

/// Grouping of articles inside a [`Category`](super::Category), optionally
/// nested under another section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(remote = "Self")]
pub struct Section {
    pub id: u64,
    pub category_id: u64,
    #[serde(default)]
    pub parent_section_id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub locale: Locale,
    #[serde(default)]
    pub source_locale: Option<Locale>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub outdated: Option<bool>,
    #[serde(default, with = "rfc3339")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "rfc3339")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(skip)]
    raw: Extra,
}

fetched_record!(Section);
