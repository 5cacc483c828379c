use html2md::rewrite_html as html_to_markdown;
use tracing::instrument;

/// Converts a (rewritten) article body to CommonMark.
#[instrument(level = "trace", skip(html), fields(html_size = html.len()))]
pub fn to_markdown(html: &str) -> String {
    html_to_markdown(html, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_local_image_paths() {
        let markdown = to_markdown(r#"<p>See <img src="./attachments/555/foo.png" alt="foo"></p>"#);
        assert!(markdown.contains("./attachments/555/foo.png"), "{markdown}");
    }

    #[test]
    fn test_converts_headings_and_emphasis() {
        let markdown = to_markdown("<h2>Refunds</h2><p>Ask <strong>billing</strong>.</p>");
        assert!(markdown.contains("Refunds"), "{markdown}");
        assert!(markdown.contains("**billing**"), "{markdown}");
    }
}
