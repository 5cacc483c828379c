use super::timestamp::rfc3339;
use super::{Extra, Locale};
use serde::Deserialize;
use time::OffsetDateTime;

/// Binary media owned by one article.
///
/// Metadata is decoded from the platform; `content` starts out empty and is
/// populated once by the attachment resolver, never to change again.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(remote = "Self")]
pub struct Attachment {
    pub id: u64,
    pub article_id: u64,
    #[serde(default)]
    pub display_file_name: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    pub content_url: String,
    #[serde(default)]
    pub locale: Option<Locale>,
    #[serde(default)]
    pub inline: Option<bool>,
    #[serde(default, with = "rfc3339")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "rfc3339")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(skip)]
    raw: Extra,
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
}

fetched_record!(Attachment);

impl Attachment {
    /// The name the platform shows for this file, falling back to the stored
    /// file name and finally to the id.
    pub fn display_name(&self) -> String {
        [Some(self.display_file_name.as_str()), self.file_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map_or_else(|| self.id.to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({"display_file_name": "foo.png", "file_name": "bar.png"}), "foo.png")]
    #[case(json!({"display_file_name": "  ", "file_name": "bar.png"}), "bar.png")]
    #[case(json!({}), "555")]
    fn test_display_name(#[case] names: serde_json::Value, #[case] expected: &str) {
        let mut value = json!({
            "id": 555,
            "article_id": 1001,
            "content_url": "https://acme.example.com/hc/article_attachments/555/foo.png",
        });
        if let (Some(value), Some(names)) = (value.as_object_mut(), names.as_object()) {
            value.extend(names.clone());
        }
        let attachment: Attachment = serde_json::from_value(value).unwrap();
        assert_eq!(attachment.display_name(), expected);
    }

    #[test]
    fn test_content_is_never_decoded() {
        let attachment: Attachment = serde_json::from_value(json!({
            "id": 1, "article_id": 2, "content_url": "https://x/1", "content": "aGk=",
        }))
        .unwrap();
        assert_eq!(attachment.content, None);
    }
}
