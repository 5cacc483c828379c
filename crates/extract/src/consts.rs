use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// CSS selector handed to the streaming rewriter; must match [`IMAGE_SELECTOR`].
pub(crate) const IMAGE_CSS: &str = "img[src]";

selector!(IMAGE_SELECTOR, IMAGE_CSS);
selector!(NOSCRIPT_SELECTOR, "noscript");
// The numeric segment right after `article_attachments/`, e.g.
// `https://acme.example.com/hc/article_attachments/555/foo.png`.
regex!(ATTACHMENT_PATH_REGEX, r"article_attachments/(\d+)(?:$|[/?#])");
