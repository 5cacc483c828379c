//! Tagged decoding of collection pages.
//!
//! A page response names its contents by the key it stores them under
//! (`{"articles": [...], "next_page": ...}`). The key is the discriminator:
//! the known keys are checked in a fixed order and the first one present
//! decides the schema. A body carrying none of them fails closed.

use super::{Article, Attachment, Category, Section};
use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// The kinds of collection a page can carry, in decode priority order.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    #[display("articles")]
    Articles,
    #[display("categories")]
    Categories,
    #[display("sections")]
    Sections,
    #[display("attachments")]
    Attachments,
}

impl CollectionKind {
    pub const ALL: [Self; 4] = [Self::Articles, Self::Categories, Self::Sections, Self::Attachments];

    /// The JSON key the platform stores this collection under.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Articles => "articles",
            Self::Categories => "categories",
            Self::Sections => "sections",
            Self::Attachments => "article_attachments",
        }
    }

    fn decode(&self, items: Value) -> Result<Collection> {
        fn items_of<T: DeserializeOwned>(items: Value, kind: CollectionKind) -> Result<Vec<T>> {
            serde_json::from_value(items).or_raise(|| ErrorKind::Decode(kind.key()))
        }
        Ok(match self {
            Self::Articles => Collection::Articles(items_of(items, *self)?),
            Self::Categories => Collection::Categories(items_of(items, *self)?),
            Self::Sections => Collection::Sections(items_of(items, *self)?),
            Self::Attachments => Collection::Attachments(items_of(items, *self)?),
        })
    }
}

/// A decoded, homogeneous list of resources.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Articles(Vec<Article>),
    Categories(Vec<Category>),
    Sections(Vec<Section>),
    Attachments(Vec<Attachment>),
}

impl Collection {
    pub fn kind(&self) -> CollectionKind {
        match self {
            Self::Articles(_) => CollectionKind::Articles,
            Self::Categories(_) => CollectionKind::Categories,
            Self::Sections(_) => CollectionKind::Sections,
            Self::Attachments(_) => CollectionKind::Attachments,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Articles(items) => items.len(),
            Self::Categories(items) => items.len(),
            Self::Sections(items) => items.len(),
            Self::Attachments(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends the items of `other`, which must be of the same kind.
    pub fn extend(&mut self, other: Collection) -> Result<()> {
        match (self, other) {
            (Self::Articles(items), Self::Articles(more)) => items.extend(more),
            (Self::Categories(items), Self::Categories(more)) => items.extend(more),
            (Self::Sections(items), Self::Sections(more)) => items.extend(more),
            (Self::Attachments(items), Self::Attachments(more)) => items.extend(more),
            (this, other) => exn::bail!(ErrorKind::MismatchedCollection {
                expected: this.kind(),
                found: other.kind(),
            }),
        }
        Ok(())
    }
}

/// One page of a cursor-paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Collection,
    /// Absolute URL of the following page; `None` on the last page.
    pub next_page: Option<String>,
    pub page_count: Option<u64>,
    pub count: Option<u64>,
}

impl Page {
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut document: Map<String, Value> = serde_json::from_slice(body).or_raise(|| ErrorKind::Decode("page"))?;
        let Some((kind, items)) = CollectionKind::ALL
            .iter()
            .find_map(|kind| document.remove(kind.key()).map(|items| (*kind, items)))
        else {
            exn::bail!(ErrorKind::UnknownCollection);
        };
        let next_page = document
            .get("next_page")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|next| !next.is_empty())
            .map(str::to_string);
        Ok(Self {
            items: kind.decode(items)?,
            next_page,
            page_count: document.get("page_count").and_then(Value::as_u64),
            count: document.get("count").and_then(Value::as_u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn category(id: u64) -> Value {
        json!({"id": id, "name": "Billing", "description": "", "locale": "en-us"})
    }

    #[test]
    fn test_decode_categories_with_next_page() {
        let body = json!({
            "categories": [category(1), category(2)],
            "next_page": "https://acme.example.com/api/v2/help_center/en-us/categories?page=2&per_page=100",
            "page_count": 2,
            "count": 3,
        });
        let page = Page::decode(body.to_string().as_bytes()).unwrap();
        assert_eq!(page.items.kind(), CollectionKind::Categories);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page_count, Some(2));
        assert_eq!(page.count, Some(3));
        assert_eq!(
            page.next_page.as_deref(),
            Some("https://acme.example.com/api/v2/help_center/en-us/categories?page=2&per_page=100")
        );
    }

    #[rstest]
    #[case(json!({"sections": [], "next_page": null}))]
    #[case(json!({"sections": []}))]
    #[case(json!({"sections": [], "next_page": ""}))]
    fn test_last_page(#[case] body: Value) {
        let page = Page::decode(body.to_string().as_bytes()).unwrap();
        assert_eq!(page.items, Collection::Sections(vec![]));
        assert!(page.next_page.is_none());
    }

    #[test]
    fn test_fixed_key_order() {
        // Both keys present: articles wins because it is checked first.
        let body = json!({"sections": [], "articles": []});
        let page = Page::decode(body.to_string().as_bytes()).unwrap();
        assert_eq!(page.items.kind(), CollectionKind::Articles);
    }

    #[test]
    fn test_attachments_key() {
        let body = json!({"article_attachments": [{
            "id": 555, "article_id": 1001, "display_file_name": "foo.png",
            "content_url": "https://acme.example.com/hc/article_attachments/555/foo.png",
        }]});
        let page = Page::decode(body.to_string().as_bytes()).unwrap();
        assert_eq!(page.items.kind(), CollectionKind::Attachments);
    }

    #[rstest]
    #[case(json!({"users": []}))]
    #[case(json!({}))]
    #[case(json!({"next_page": "https://acme.example.com/x"}))]
    fn test_unknown_collection(#[case] body: Value) {
        let err = Page::decode(body.to_string().as_bytes()).unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownCollection);
    }

    #[rstest]
    #[case(b"not json".as_slice())]
    #[case(b"[1, 2, 3]".as_slice())]
    fn test_not_an_object(#[case] body: &[u8]) {
        let err = Page::decode(body).unwrap_err();
        assert_eq!(*err, ErrorKind::Decode("page"));
    }

    #[test]
    fn test_malformed_items() {
        let body = json!({"categories": [{"id": "not a number"}]});
        let err = Page::decode(body.to_string().as_bytes()).unwrap_err();
        assert_eq!(*err, ErrorKind::Decode("categories"));
    }

    #[test]
    fn test_extend_mismatch() {
        let mut collection = Collection::Articles(vec![]);
        let err = collection.extend(Collection::Sections(vec![])).unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::MismatchedCollection {
                expected: CollectionKind::Articles,
                found: CollectionKind::Sections,
            }
        );
    }
}
