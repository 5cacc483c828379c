//! Help Center resource models.
//!
//! Every record keeps the JSON object it was decoded from next to a typed view
//! of the fields the pipeline reads. Serializing a record writes that object
//! back unchanged, so the raw snapshot holds exactly what the platform sent:
//! explicit `null`s, absent keys and original locale casing included.

/// Wires up serde for a record that carries a private `raw: Extra` field and
/// derives `Deserialize` with `#[serde(remote = "Self")]`.
macro_rules! fetched_record {
    ($record:ident) => {
        impl<'de> ::serde::Deserialize<'de> for $record {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let raw = <$crate::models::Extra as ::serde::Deserialize>::deserialize(deserializer)?;
                // Inherent `deserialize` generated by `remote = "Self"`.
                let mut record =
                    Self::deserialize(::serde_json::Value::Object(raw.clone())).map_err(::serde::de::Error::custom)?;
                record.raw = raw;
                Ok(record)
            }
        }

        impl ::serde::Serialize for $record {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                ::serde::Serialize::serialize(&self.raw, serializer)
            }
        }

        impl $record {
            /// The object exactly as the platform returned it.
            pub fn raw(&self) -> &$crate::models::Extra {
                &self.raw
            }
        }
    };
}

mod article;
mod attachment;
mod category;
mod locale;
mod page;
mod section;

pub use article::Article;
pub use attachment::Attachment;
pub use category::Category;
pub use locale::{Locale, Locales};
pub use page::{Collection, CollectionKind, Page};
pub use section::Section;

/// A record as fetched, kept verbatim.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Optional RFC 3339 timestamps, as the platform sends them.
pub(crate) mod timestamp {
    pub(crate) use time::serde::rfc3339::option as rfc3339;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde::Serialize;
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};

    fn reencode<T: DeserializeOwned + Serialize>(value: &Value) -> Value {
        let record: T = serde_json::from_value(value.clone()).unwrap();
        serde_json::to_value(&record).unwrap()
    }

    #[rstest]
    #[case::article(json!({
        "id": 1, "section_id": 2, "locale": "en-US", "title": "T", "body": "<p/>",
        "source_locale": null, "edited_at": null, "html_url": null, "label_names": [],
    }))]
    #[case::article_without_optional_fields(json!({"id": 1, "section_id": 2, "locale": "fr", "title": "T"}))]
    fn test_article_reencodes_verbatim(#[case] value: Value) {
        assert_eq!(reencode::<Article>(&value), value);
    }

    #[test]
    fn test_section_reencodes_verbatim() {
        let value = json!({
            "id": 20, "category_id": 10, "name": "Invoices", "locale": "FR",
            "parent_section_id": null, "position": 0, "outdated": false, "sorting": "manual",
        });
        assert_eq!(reencode::<Section>(&value), value);
    }

    #[test]
    fn test_category_reencodes_verbatim() {
        let value = json!({"id": 10, "name": "Billing", "locale": "en-us", "created_at": "2024-03-01T10:00:00+00:00"});
        assert_eq!(reencode::<Category>(&value), value);
    }

    #[test]
    fn test_attachment_reencodes_verbatim() {
        let value = json!({
            "id": 555, "article_id": 1001, "file_name": "foo.png", "content_url": "https://x/555",
            "locale": null, "size": 12, "inline": true,
        });
        assert_eq!(reencode::<Attachment>(&value), value);
    }
}
