use super::timestamp::rfc3339;
use super::{Extra, Locale};
use serde::Deserialize;
use time::OffsetDateTime;

/// Top level of the Help Center hierarchy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(remote = "Self")]
pub struct Category {
    pub id: u64,
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

fetched_record!(Category);
