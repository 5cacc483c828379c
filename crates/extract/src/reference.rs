//! Discovery of embedded media in article bodies.
//!
//! The platform's "list attachments for an article" endpoint is known to omit
//! or misreport entries, so the body itself is the authoritative source: every
//! `<img src>` is classified as either a platform attachment (with its numeric
//! id) or foreign media that is left untouched.

use crate::consts;
use scraper::Html;
use std::collections::HashSet;
use tracing::instrument;

/// What an embedded `src` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A platform-hosted attachment, identified by its numeric id.
    Platform(u64),
    /// Anything else (external hosts, data URIs, unparseable ids). Not an
    /// error: these references are skipped and left verbatim.
    Foreign,
}
impl Target {
    /// Classifies a `src` value.
    ///
    /// ```
    /// use helpvault_extract::Target;
    /// assert_eq!(
    ///     Target::parse("https://acme.example.com/hc/article_attachments/555/foo.png"),
    ///     Target::Platform(555)
    /// );
    /// assert_eq!(Target::parse("https://external.example/x.png"), Target::Foreign);
    /// ```
    pub fn parse(src: &str) -> Self {
        consts::ATTACHMENT_PATH_REGEX
            .captures(src)
            .and_then(|captures| captures.get(1))
            .and_then(|id| id.as_str().parse::<u64>().ok())
            .map_or(Self::Foreign, Self::Platform)
    }

    pub fn attachment_id(&self) -> Option<u64> {
        match self {
            Self::Platform(id) => Some(*id),
            Self::Foreign => None,
        }
    }
}

/// A single embedded image found in a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The `src` attribute as written in the body (entities decoded).
    pub src: String,
    pub target: Target,
}

/// Enumerates every `<img src>` in document order.
#[instrument(level = "trace", skip(html), fields(html_size = html.len()))]
pub fn scan(html: &str) -> Vec<Reference> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&consts::IMAGE_SELECTOR)
        .filter_map(|element| element.value().attr("src"))
        .map(|src| Reference {
            src: src.to_string(),
            target: Target::parse(src),
        })
        .collect()
}

/// Images written inside `<noscript>`.
///
/// Bodies are parsed with scripting enabled, so `<noscript>` content is raw
/// text: [`scan`] never reports these images and
/// [`rewrite_sources`](crate::rewrite_sources) leaves their `src` untouched.
/// They are not backed up; this only lets callers report them.
pub fn noscript_references(html: &str) -> Vec<Reference> {
    if !html.contains("noscript") {
        return Vec::new();
    }
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&consts::NOSCRIPT_SELECTOR)
        .flat_map(|noscript| scan(&noscript.text().collect::<String>()))
        .collect()
}

/// Distinct platform attachment ids referenced by a body, in first-seen order.
pub fn platform_ids(html: &str) -> Vec<u64> {
    let mut seen = HashSet::new();
    scan(html)
        .into_iter()
        .filter_map(|reference| reference.target.attachment_id())
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://acme.zendesk.com/hc/article_attachments/555/foo.png", Target::Platform(555))]
    #[case("/hc/article_attachments/360012345678/image.jpeg", Target::Platform(360_012_345_678))]
    #[case("https://acme.example.com/hc/article_attachments/42", Target::Platform(42))]
    #[case("https://acme.example.com/hc/article_attachments/42?size=large", Target::Platform(42))]
    #[case("https://external.example/x.png", Target::Foreign)]
    #[case("https://acme.example.com/hc/article_attachments/abc/foo.png", Target::Foreign)]
    #[case("https://acme.example.com/hc/article_attachments/42abc/foo.png", Target::Foreign)]
    #[case("https://acme.example.com/hc/article_attachments/", Target::Foreign)]
    #[case("data:image/png;base64,iVBORw0KGgo=", Target::Foreign)]
    #[case("", Target::Foreign)]
    fn test_target_parse(#[case] src: &str, #[case] expected: Target) {
        assert_eq!(Target::parse(src), expected);
    }

    #[test]
    fn test_id_overflow_is_foreign() {
        assert_eq!(Target::parse("/article_attachments/99999999999999999999999/x.png"), Target::Foreign);
    }

    #[test]
    fn test_scan_document_order() {
        let body = r#"<p>Intro</p>
            <img src="https://acme.example.com/hc/article_attachments/555/foo.png" alt="foo">
            <p><img src="https://external.example/x.png"></p>
            <img alt="no source">"#;
        let references = scan(body);
        assert_eq!(
            references,
            vec![
                Reference {
                    src: "https://acme.example.com/hc/article_attachments/555/foo.png".to_string(),
                    target: Target::Platform(555),
                },
                Reference {
                    src: "https://external.example/x.png".to_string(),
                    target: Target::Foreign,
                },
            ]
        );
    }

    #[test]
    fn test_scan_empty_body() {
        assert!(scan("").is_empty());
        assert!(scan("<p>No images here</p>").is_empty());
    }

    #[test]
    fn test_platform_ids_deduplicates() {
        let body = r#"
            <img src="/hc/article_attachments/7/a.png">
            <img src="/hc/article_attachments/5/b.png">
            <img src="/hc/article_attachments/7/a.png">
            <img src="https://external.example/x.png">"#;
        assert_eq!(platform_ids(body), vec![7, 5]);
    }

    #[test]
    fn test_noscript_images_are_reported_separately() {
        let body = concat!(
            r#"<img src="/hc/article_attachments/7/a.png">"#,
            r#"<noscript><img src="/hc/article_attachments/42/lazy.png"></noscript>"#,
        );
        assert_eq!(platform_ids(body), vec![7]);
        let hidden: Vec<_> = noscript_references(body).into_iter().map(|r| r.target).collect();
        assert_eq!(hidden, vec![Target::Platform(42)]);
    }

    #[test]
    fn test_no_noscript_no_references() {
        assert!(noscript_references(r#"<img src="/hc/article_attachments/7/a.png">"#).is_empty());
    }
}
