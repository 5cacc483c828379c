//! Output path planning.
//!
//! Every article's output location is decided before anything is written, so
//! collisions between articles are known up front and handled according to
//! the configured [`CollisionPolicy`] instead of silently overwriting.

use crate::error::{Dangling, ErrorKind, Result};
use crate::graph::{ArticleKey, Resource, ResourceGraph, ResourceKind};
use crate::template::PathGenerator;
use exn::OptionExt;
use helpvault_client::models::{Article, Category, Section};
use helpvault_extract::sanitize_filename;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// What to do when two articles are planned onto the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Log the collision; the later article's files replace the earlier one's.
    #[default]
    Warn,
    /// Append `-{article id}` to the stem of every colliding article after the first.
    Suffix,
    /// Abort before anything is written.
    Error,
}

impl FromStr for CollisionPolicy {
    type Err = ErrorKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "suffix" => Ok(Self::Suffix),
            "error" => Ok(Self::Error),
            _ => Err(ErrorKind::UnknownSetting {
                setting: "collision policy",
                value: s.to_string(),
            }),
        }
    }
}

/// Where one article's files go, relative to the backup root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPath {
    pub directory: PathBuf,
    /// File name without extension, derived from the sanitized title.
    pub stem: String,
}

impl PlannedPath {
    pub fn markdown(&self) -> PathBuf {
        self.directory.join(format!("{}.md", self.stem))
    }

    pub fn html(&self) -> PathBuf {
        self.directory.join(format!("{}.html", self.stem))
    }

    pub fn attachments(&self) -> PathBuf {
        self.directory.join("attachments")
    }

    /// `attachments/{id}/{name}`, where `name` is already sanitized.
    pub fn attachment(&self, id: u64, name: &str) -> PathBuf {
        self.attachments().join(id.to_string()).join(name)
    }

    fn file(&self) -> PathBuf {
        self.directory.join(&self.stem)
    }
}

/// An article together with its planned output location.
#[derive(Debug, Clone)]
pub struct PlanEntry<'a> {
    pub key: ArticleKey,
    pub article: &'a Article,
    pub path: PlannedPath,
    /// A later article took over this path under [`CollisionPolicy::Warn`].
    /// Its attachments are still written, its documents are not.
    pub superseded: bool,
}

/// Planned locations of every article in a [`ResourceGraph`], in graph order.
#[derive(Debug, Clone, Default)]
pub struct PathPlan<'a> {
    entries: Vec<PlanEntry<'a>>,
    collisions: usize,
}

impl<'a> PathPlan<'a> {
    pub fn entries(&self) -> &[PlanEntry<'a>] {
        &self.entries
    }

    pub fn get(&self, key: &ArticleKey) -> Option<&PlanEntry<'a>> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of collisions detected while planning.
    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

/// Resolves the section and category an article is filed under, within the
/// locale the article was fetched under (`key.locale`, not the record's own
/// `locale` field).
pub fn hierarchy<'g>(
    key: &ArticleKey,
    article: &Article,
    graph: &'g ResourceGraph,
) -> Result<(&'g Category, &'g Section)> {
    let locale = &key.locale;
    let section = match graph.lookup(locale, ResourceKind::Section, article.section_id) {
        Some(Resource::Section(section)) => Some(section),
        _ => None,
    }
    .ok_or_raise(|| {
        ErrorKind::Resolution(Dangling::Section {
            locale: locale.clone(),
            article_id: article.id,
            section_id: article.section_id,
        })
    })?;
    let category = match graph.lookup(locale, ResourceKind::Category, section.category_id) {
        Some(Resource::Category(category)) => Some(category),
        _ => None,
    }
    .ok_or_raise(|| {
        ErrorKind::Resolution(Dangling::Category {
            locale: locale.clone(),
            section_id: section.id,
            category_id: section.category_id,
        })
    })?;
    Ok((category, section))
}

/// The directory an article's files are written to.
///
/// Fails with [`ErrorKind::Resolution`] when the article's section, or that
/// section's category, is missing from the locale the article was fetched under.
pub fn plan_path(
    key: &ArticleKey,
    article: &Article,
    graph: &ResourceGraph,
    generator: &PathGenerator,
) -> Result<PathBuf> {
    let (category, section) = hierarchy(key, article, graph)?;
    generator.generate(category, section).map(PathBuf::from)
}

/// Plans every article of `graph`, applying `policy` to collisions.
#[instrument(skip_all, fields(policy = ?policy))]
pub fn plan<'a>(graph: &'a ResourceGraph, generator: &PathGenerator, policy: CollisionPolicy) -> Result<PathPlan<'a>> {
    let mut plan = PathPlan::default();
    let mut taken: HashMap<PathBuf, usize> = HashMap::new();
    for (key, article) in graph.articles() {
        let mut path = PlannedPath {
            directory: plan_path(&key, article, graph, generator)?,
            stem: sanitize_filename(&article.title),
        };
        if let Some(&previous) = taken.get(&path.file()) {
            plan.collisions += 1;
            let existing = &plan.entries[previous].key;
            match policy {
                CollisionPolicy::Warn => {
                    warn!(path = %path.file().display(), %existing, article = %key, "output path collision, later article overwrites");
                    plan.entries[previous].superseded = true;
                },
                CollisionPolicy::Error => {
                    exn::bail!(ErrorKind::Collision(path.file().display().to_string()));
                },
                CollisionPolicy::Suffix => {
                    let stem = path.stem.clone();
                    path.stem = format!("{stem}-{}", key.id);
                    if taken.contains_key(&path.file()) {
                        // Same id in several locales under the same title.
                        path.stem = format!("{stem}-{}-{}", key.id, key.locale);
                    }
                    if taken.contains_key(&path.file()) {
                        exn::bail!(ErrorKind::Collision(path.file().display().to_string()));
                    }
                    info!(%existing, article = %key, stem = %path.stem, "output path collision, suffixed");
                },
            }
        }
        debug!(article = %key, directory = %path.directory.display(), stem = %path.stem, "article planned");
        taken.insert(path.file(), plan.entries.len());
        plan.entries.push(PlanEntry {
            key,
            article,
            path,
            superseded: false,
        });
    }
    info!(articles = plan.len(), collisions = plan.collisions, "output paths planned");
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LocaleResources;
    use crate::graph::tests::{article, category, section};
    use helpvault_client::models::Locale;
    use rstest::rstest;

    fn graph(articles: Vec<Article>) -> ResourceGraph {
        [(
            Locale::from("en-us"),
            LocaleResources::new(
                articles,
                vec![category("en-us", 10, "Billing"), category("en-us", 11, "Billing!")],
                vec![section("en-us", 20, 10, "Invoices"), section("en-us", 21, 11, "Invoices")],
            ),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_hierarchy_directory() {
        let graph = graph(vec![]);
        let refunds = article("en-us", 1001, 20, "Refunds", "");
        let path = plan_path(&ArticleKey::new("en-us", 1001), &refunds, &graph, &PathGenerator::default()).unwrap();
        assert_eq!(path, PathBuf::from("Billing/Invoices"));
    }

    #[test]
    fn test_missing_section_is_resolution_error() {
        let graph = graph(vec![]);
        let orphan = article("en-us", 1001, 99, "Orphan", "");
        let err = plan_path(&ArticleKey::new("en-us", 1001), &orphan, &graph, &PathGenerator::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Resolution(Dangling::Section { section_id: 99, .. })));
    }

    #[test]
    fn test_missing_category_is_resolution_error() {
        let graph: ResourceGraph = [(
            Locale::from("en-us"),
            LocaleResources::new(vec![], vec![], vec![section("en-us", 20, 10, "Invoices")]),
        )]
        .into_iter()
        .collect();
        let refunds = article("en-us", 1001, 20, "Refunds", "");
        let err = plan_path(&ArticleKey::new("en-us", 1001), &refunds, &graph, &PathGenerator::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Resolution(Dangling::Category { category_id: 10, .. })));
    }

    #[test]
    fn test_hierarchy_never_crosses_locales() {
        let graph: ResourceGraph = [
            (Locale::from("en-us"), LocaleResources::new(vec![], vec![category("en-us", 10, "Billing")], vec![])),
            (Locale::from("fr"), LocaleResources::new(vec![], vec![], vec![section("fr", 20, 10, "Factures")])),
        ]
        .into_iter()
        .collect();
        let article = article("fr", 1001, 20, "Remboursements", "");
        assert!(hierarchy(&ArticleKey::new("fr", 1001), &article, &graph).is_err());
    }

    #[test]
    fn test_hierarchy_uses_fetch_locale_not_record_locale() {
        // A record fetched under `fr` that reports its locale as `en-us`.
        let graph: ResourceGraph = [
            (Locale::from("en-us"), LocaleResources::new(vec![], vec![], vec![])),
            (
                Locale::from("fr"),
                LocaleResources::new(vec![], vec![category("fr", 10, "Facturation")], vec![section("fr", 20, 10, "Factures")]),
            ),
        ]
        .into_iter()
        .collect();
        let mislabeled = article("en-us", 1001, 20, "Remboursements", "");
        let (category, section) = hierarchy(&ArticleKey::new("fr", 1001), &mislabeled, &graph).unwrap();
        assert_eq!(category.name, "Facturation");
        assert_eq!(section.name, "Factures");
    }

    #[rstest]
    #[case(CollisionPolicy::Warn, vec!["Refunds", "Refunds"], vec![true, false])]
    #[case(CollisionPolicy::Suffix, vec!["Refunds", "Refunds-1002"], vec![false, false])]
    fn test_collision_policy(
        #[case] policy: CollisionPolicy,
        #[case] stems: Vec<&str>,
        #[case] superseded: Vec<bool>,
    ) {
        // "Billing" and "Billing!" sanitize to the same directory.
        let graph = graph(vec![article("en-us", 1001, 20, "Refunds", ""), article("en-us", 1002, 21, "Refunds?", "")]);
        let plan = plan(&graph, &PathGenerator::default(), policy).unwrap();
        assert_eq!(plan.collisions(), 1);
        let planned: Vec<_> = plan.entries().iter().map(|e| e.path.stem.as_str()).collect();
        assert_eq!(planned, stems);
        let flags: Vec<_> = plan.entries().iter().map(|e| e.superseded).collect();
        assert_eq!(flags, superseded);
    }

    #[rstest]
    #[case(vec!["de", "en-us", "fr"], vec!["Refunds", "Refunds-1001", "Refunds-1001-fr"])]
    #[case(vec!["en-us", "fr"], vec!["Refunds", "Refunds-1001"])]
    fn test_suffix_falls_back_to_locale(#[case] locales: Vec<&str>, #[case] stems: Vec<&str>) {
        // An untranslated article shares its id, title, category and section
        // names across locales, so every locale lands in the same directory.
        let graph: ResourceGraph = locales
            .iter()
            .map(|&locale| {
                (
                    Locale::from(locale),
                    LocaleResources::new(
                        vec![article(locale, 1001, 20, "Refunds", "")],
                        vec![category(locale, 10, "Billing")],
                        vec![section(locale, 20, 10, "Invoices")],
                    ),
                )
            })
            .collect();
        let plan = plan(&graph, &PathGenerator::default(), CollisionPolicy::Suffix).unwrap();
        let planned: Vec<_> = plan.entries().iter().map(|e| e.path.stem.as_str()).collect();
        assert_eq!(planned, stems);
        assert_eq!(plan.collisions(), locales.len() - 1);
        assert!(plan.entries().iter().all(|e| !e.superseded));
    }

    #[rstest]
    #[case("warn", Some(CollisionPolicy::Warn))]
    #[case(" Suffix ", Some(CollisionPolicy::Suffix))]
    #[case("error", Some(CollisionPolicy::Error))]
    #[case("ignore", None)]
    fn test_collision_policy_from_str(#[case] input: &str, #[case] expected: Option<CollisionPolicy>) {
        assert_eq!(input.parse::<CollisionPolicy>().ok(), expected);
    }

    #[test]
    fn test_collision_error_policy() {
        let graph = graph(vec![article("en-us", 1001, 20, "Refunds", ""), article("en-us", 1002, 20, "Refunds", "")]);
        let err = plan(&graph, &PathGenerator::default(), CollisionPolicy::Error).unwrap_err();
        assert_eq!(*err, ErrorKind::Collision("Billing/Invoices/Refunds".to_string()));
    }

    #[test]
    fn test_distinct_titles_do_not_collide() {
        let graph = graph(vec![article("en-us", 1001, 20, "Refunds", ""), article("en-us", 1002, 20, "Returns", "")]);
        let plan = plan(&graph, &PathGenerator::default(), CollisionPolicy::Error).unwrap();
        assert_eq!(plan.collisions(), 0);
        let entry = plan.get(&ArticleKey::new("en-us", 1002)).unwrap();
        assert_eq!(entry.path.markdown(), PathBuf::from("Billing/Invoices/Returns.md"));
        assert_eq!(entry.path.attachment(555, "foo.png"), PathBuf::from("Billing/Invoices/attachments/555/foo.png"));
    }
}
