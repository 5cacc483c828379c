//! Locale-partitioned store of the fetched Help Center.
//!
//! Each locale's articles, categories and sections are fetched independently
//! and stored as-is, in the order the platform returned them. Id spaces of
//! different locales are never merged.

use crate::error::{ErrorKind, Result};
use futures::future::try_join_all;
use futures::try_join;
use helpvault_client::models::{Article, Category, Locale, Section};
use helpvault_client::{HelpCenter, Transport};
use exn::ResultExt;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{info, instrument};

/// Identifies one locale's version of an article.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArticleKey {
    pub locale: Locale,
    pub id: u64,
}
impl ArticleKey {
    pub fn new(locale: impl Into<Locale>, id: u64) -> Self {
        Self {
            locale: locale.into(),
            id,
        }
    }
}
impl fmt::Display for ArticleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.locale, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Article,
    Category,
    Section,
}

/// A borrowed resource returned by [`ResourceGraph::lookup`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resource<'a> {
    Article(&'a Article),
    Category(&'a Category),
    Section(&'a Section),
}

/// Everything fetched for one locale, with id indexes for lookup.
#[derive(Debug, Clone, Default)]
pub struct LocaleResources {
    articles: Vec<Article>,
    categories: Vec<Category>,
    sections: Vec<Section>,
    article_index: HashMap<u64, usize>,
    category_index: HashMap<u64, usize>,
    section_index: HashMap<u64, usize>,
}

impl LocaleResources {
    pub fn new(articles: Vec<Article>, categories: Vec<Category>, sections: Vec<Section>) -> Self {
        fn index<T>(items: &[T], id: impl Fn(&T) -> u64) -> HashMap<u64, usize> {
            items.iter().enumerate().map(|(position, item)| (id(item), position)).collect()
        }
        Self {
            article_index: index(&articles, |a| a.id),
            category_index: index(&categories, |c| c.id),
            section_index: index(&sections, |s| s.id),
            articles,
            categories,
            sections,
        }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn article(&self, id: u64) -> Option<&Article> {
        self.article_index.get(&id).map(|position| &self.articles[*position])
    }

    pub fn category(&self, id: u64) -> Option<&Category> {
        self.category_index.get(&id).map(|position| &self.categories[*position])
    }

    pub fn section(&self, id: u64) -> Option<&Section> {
        self.section_index.get(&id).map(|position| &self.sections[*position])
    }
}

/// The fetched Help Center, keyed by locale.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    locales: BTreeMap<Locale, LocaleResources>,
}

impl ResourceGraph {
    /// Fetches articles, categories and sections for every locale.
    ///
    /// Locales are fetched concurrently, as are the three collections of each
    /// locale. Any failed request aborts the whole build.
    #[instrument(skip_all, fields(locales = locales.len()))]
    pub async fn build<T: Transport>(client: &HelpCenter<T>, locales: &[Locale]) -> Result<Self> {
        let fetched = try_join_all(locales.iter().map(|locale| async move {
            let (articles, categories, sections) =
                try_join!(client.articles(locale), client.categories(locale), client.sections(locale))
                    .or_raise(|| ErrorKind::Protocol)?;
            info!(
                %locale,
                articles = articles.len(),
                categories = categories.len(),
                sections = sections.len(),
                "locale fetched"
            );
            Ok::<_, crate::error::Error>((locale.clone(), LocaleResources::new(articles, categories, sections)))
        }))
        .await?;
        let graph: Self = fetched.into_iter().collect();
        info!(
            articles = graph.count(ResourceKind::Article),
            categories = graph.count(ResourceKind::Category),
            sections = graph.count(ResourceKind::Section),
            "resource graph built"
        );
        Ok(graph)
    }

    /// Adds or replaces one locale's resources.
    pub fn insert(&mut self, locale: Locale, resources: LocaleResources) {
        self.locales.insert(locale, resources);
    }

    pub fn locales(&self) -> impl Iterator<Item = &Locale> {
        self.locales.keys()
    }

    pub fn get(&self, locale: &Locale) -> Option<&LocaleResources> {
        self.locales.get(locale)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Locale, &LocaleResources)> {
        self.locales.iter()
    }

    /// Every article of every locale, in locale order then fetch order.
    pub fn articles(&self) -> impl Iterator<Item = (ArticleKey, &Article)> {
        self.locales.iter().flat_map(|(locale, resources)| {
            resources.articles.iter().map(|article| (ArticleKey::new(locale.clone(), article.id), article))
        })
    }

    pub fn article(&self, key: &ArticleKey) -> Option<&Article> {
        self.get(&key.locale).and_then(|resources| resources.article(key.id))
    }

    pub fn lookup(&self, locale: &Locale, kind: ResourceKind, id: u64) -> Option<Resource<'_>> {
        let resources = self.get(locale)?;
        match kind {
            ResourceKind::Article => resources.article(id).map(Resource::Article),
            ResourceKind::Category => resources.category(id).map(Resource::Category),
            ResourceKind::Section => resources.section(id).map(Resource::Section),
        }
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.locales
            .values()
            .map(|resources| match kind {
                ResourceKind::Article => resources.articles.len(),
                ResourceKind::Category => resources.categories.len(),
                ResourceKind::Section => resources.sections.len(),
            })
            .sum()
    }
}

impl FromIterator<(Locale, LocaleResources)> for ResourceGraph {
    fn from_iter<I: IntoIterator<Item = (Locale, LocaleResources)>>(iter: I) -> Self {
        Self {
            locales: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use helpvault_client::transport::MockTransport;
    use serde_json::json;

    pub(crate) fn category(locale: &str, id: u64, name: &str) -> Category {
        serde_json::from_value(json!({"id": id, "name": name, "description": "", "locale": locale})).unwrap()
    }

    pub(crate) fn section(locale: &str, id: u64, category_id: u64, name: &str) -> Section {
        serde_json::from_value(json!({"id": id, "category_id": category_id, "name": name, "locale": locale})).unwrap()
    }

    pub(crate) fn article(locale: &str, id: u64, section_id: u64, title: &str, body: &str) -> Article {
        serde_json::from_value(json!({
            "id": id, "section_id": section_id, "locale": locale, "title": title, "body": body,
        }))
        .unwrap()
    }

    #[test]
    fn test_lookup_is_per_locale() {
        let graph: ResourceGraph = [
            (
                Locale::from("en-us"),
                LocaleResources::new(vec![], vec![category("en-us", 10, "Billing")], vec![]),
            ),
            (
                Locale::from("fr"),
                LocaleResources::new(vec![], vec![category("fr", 11, "Facturation")], vec![]),
            ),
        ]
        .into_iter()
        .collect();

        let found = graph.lookup(&Locale::from("en-us"), ResourceKind::Category, 10);
        assert!(matches!(found, Some(Resource::Category(c)) if c.name == "Billing"));
        assert!(graph.lookup(&Locale::from("en-us"), ResourceKind::Category, 11).is_none());
        assert!(graph.lookup(&Locale::from("fr"), ResourceKind::Section, 11).is_none());
        assert!(graph.lookup(&Locale::from("de"), ResourceKind::Category, 10).is_none());
    }

    #[test]
    fn test_articles_in_locale_order() {
        let graph: ResourceGraph = [
            (
                Locale::from("fr"),
                LocaleResources::new(vec![article("fr", 2, 20, "Deux", "")], vec![], vec![]),
            ),
            (
                Locale::from("en-us"),
                LocaleResources::new(
                    vec![article("en-us", 3, 20, "Three", ""), article("en-us", 1, 20, "One", "")],
                    vec![],
                    vec![],
                ),
            ),
        ]
        .into_iter()
        .collect();
        let keys: Vec<_> = graph.articles().map(|(key, _)| key.to_string()).collect();
        assert_eq!(keys, vec!["en-us:3", "en-us:1", "fr:2"]);
        assert_eq!(graph.count(ResourceKind::Article), 3);
    }

    #[tokio::test]
    async fn test_build_fetches_every_locale() {
        let domain = "https://acme.example.com";
        let mut transport = MockTransport::default();
        for locale in ["en-us", "fr"] {
            let endpoint = |kind: &str| format!("{domain}/api/v2/help_center/{locale}/{kind}?per_page=100");
            transport = transport
                .with_json(endpoint("articles"), json!({"articles": [{
                    "id": 1001, "section_id": 20, "locale": locale, "title": "Refunds", "body": "",
                }]}))
                .with_json(endpoint("categories"), json!({"categories": [{
                    "id": 10, "name": "Billing", "description": "", "locale": locale,
                }]}))
                .with_json(endpoint("sections"), json!({"sections": [{
                    "id": 20, "category_id": 10, "name": "Invoices", "locale": locale,
                }]}));
        }
        let client = HelpCenter::new(domain, transport).unwrap();
        let graph = ResourceGraph::build(&client, &[Locale::from("en-us"), Locale::from("fr")]).await.unwrap();
        assert_eq!(graph.locales().count(), 2);
        assert_eq!(graph.count(ResourceKind::Section), 2);
        assert!(graph.article(&ArticleKey::new("fr", 1001)).is_some());
    }

    #[tokio::test]
    async fn test_build_fails_on_protocol_error() {
        let client = HelpCenter::new("https://acme.example.com", MockTransport::default()).unwrap();
        let err = ResourceGraph::build(&client, &[Locale::from("en-us")]).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Protocol);
    }
}
