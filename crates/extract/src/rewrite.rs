//! Rewriting of platform attachment links to local relative paths.

use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::reference::Target;
use exn::ResultExt;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use tracing::instrument;

/// Streams `html` through a rewriter that replaces the `src` of every
/// platform attachment image with whatever `local_path` returns for its id.
///
/// Foreign images, and platform images for which `local_path` returns `None`,
/// are left byte-for-byte as they were; everything outside the rewritten
/// attributes is preserved verbatim. Deciding whether an unresolved id is an
/// error is the caller's business.
///
/// ```
/// use helpvault_extract::rewrite_sources;
/// let body = r#"<img src="https://acme.example.com/hc/article_attachments/555/foo.png">"#;
/// let rewritten = rewrite_sources(body, |id| Some(format!("./attachments/{id}/foo.png"))).unwrap();
/// assert_eq!(rewritten, r#"<img src="./attachments/555/foo.png">"#);
/// ```
#[instrument(level = "trace", skip_all, fields(html_size = html.len()))]
pub fn rewrite_sources<F>(html: &str, mut local_path: F) -> Result<String>
where
    F: FnMut(u64) -> Option<String>,
{
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(consts::IMAGE_CSS, |el| {
                let Some(src) = el.get_attribute("src") else {
                    return Ok(());
                };
                if let Target::Platform(id) = Target::parse(&src)
                    && let Some(path) = local_path(id)
                {
                    el.set_attribute("src", &path)?;
                }
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )
    .or_raise(|| ErrorKind::MalformedHtml("could not rewrite attachment sources".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_rewrites_only_platform_sources() {
        let body = concat!(
            r#"<p>Before</p><img src="https://acme.example.com/hc/article_attachments/555/foo.png" alt="Foo">"#,
            r#"<img src="https://external.example/x.png"><p>After</p>"#,
        );
        let rewritten = rewrite_sources(body, |id| Some(format!("./attachments/{id}/foo.png"))).unwrap();
        assert_eq!(
            rewritten,
            concat!(
                r#"<p>Before</p><img src="./attachments/555/foo.png" alt="Foo">"#,
                r#"<img src="https://external.example/x.png"><p>After</p>"#,
            )
        );
    }

    #[test]
    fn test_unresolved_ids_are_left_alone() {
        let body = r#"<img src="/hc/article_attachments/1/a.png"><img src="/hc/article_attachments/2/b.png">"#;
        let resolved = HashMap::from([(2_u64, "./attachments/2/b.png".to_string())]);
        let rewritten = rewrite_sources(body, |id| resolved.get(&id).cloned()).unwrap();
        assert_eq!(rewritten, r#"<img src="/hc/article_attachments/1/a.png"><img src="./attachments/2/b.png">"#);
    }

    #[test]
    fn test_repeated_references_all_rewritten() {
        let body = r#"<img src="/hc/article_attachments/9/a.png"><div><img src="/hc/article_attachments/9/a.png"></div>"#;
        let rewritten = rewrite_sources(body, |id| Some(format!("./attachments/{id}/a.png"))).unwrap();
        assert_eq!(rewritten.matches("./attachments/9/a.png").count(), 2);
        assert!(!rewritten.contains("article_attachments"));
    }

    #[test]
    fn test_body_without_images_is_unchanged() {
        let body = "<h1>Title</h1><p>Some <strong>text</strong> &amp; more.</p>";
        let rewritten = rewrite_sources(body, |_| panic!("no images to resolve")).unwrap();
        assert_eq!(rewritten, body);
    }

    #[test]
    fn test_noscript_content_is_not_rewritten() {
        let body = r#"<noscript><img src="/hc/article_attachments/42/lazy.png"></noscript>"#;
        let rewritten = rewrite_sources(body, |id| Some(format!("./attachments/{id}/lazy.png"))).unwrap();
        assert_eq!(rewritten, body);
    }
}
