use crate::error::{ErrorKind, Result};
use crate::models::{Article, Attachment, Category, Collection, CollectionKind, Locale, Locales, Section};
use crate::paginate::fetch_all;
use crate::transport::Transport;
use exn::{OptionExt, ResultExt};
use serde_json::Value;
use tracing::{info, instrument, warn};
use url::Url;

/// Page size requested from collection endpoints; the platform maximum.
pub const PER_PAGE: u32 = 100;

/// Typed access to the Help Center endpoints of one platform instance.
#[derive(Debug)]
pub struct HelpCenter<T> {
    domain: Url,
    transport: T,
}

impl<T: Transport> HelpCenter<T> {
    /// `domain` is the instance's base URL, e.g. `https://acme.zendesk.com`.
    pub fn new(domain: impl AsRef<str>, transport: T) -> Result<Self> {
        let raw = domain.as_ref().trim();
        let domain = Url::parse(raw).or_raise(|| ErrorKind::InvalidUrl(raw.to_string()))?;
        if domain.cannot_be_a_base() || !matches!(domain.scheme(), "http" | "https") {
            exn::bail!(ErrorKind::InvalidUrl(raw.to_string()));
        }
        Ok(Self { domain, transport })
    }

    pub fn domain(&self) -> &Url {
        &self.domain
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let url = format!("{}/api/v2/help_center/{path}", self.domain.as_str().trim_end_matches('/'));
        Url::parse(&url).or_raise(|| ErrorKind::InvalidUrl(url))
    }

    fn collection_endpoint(&self, locale: &Locale, kind: CollectionKind) -> Result<Url> {
        self.endpoint(&format!("{locale}/{}?per_page={PER_PAGE}", kind.key()))
    }

    /// Locales enabled on the instance.
    pub async fn locales(&self) -> Result<Locales> {
        let url = self.endpoint("locales")?;
        let body = self.transport.get(&url).await?;
        serde_json::from_slice(&body).or_raise(|| ErrorKind::Decode("locales"))
    }

    /// Like [`locales`](Self::locales), but falls back to `configured` when the
    /// platform refuses to list them (missing permission, disabled feature).
    ///
    /// Only a non-success status falls back; an unreadable success response is
    /// still an error.
    #[instrument(level = "debug", skip_all)]
    pub async fn locales_or(&self, configured: Locales) -> Result<Locales> {
        match self.locales().await {
            Ok(locales) => {
                info!(locales = ?locales.locales, default = %locales.default_locale, "supported locales retrieved");
                Ok(locales)
            },
            Err(err) if matches!(&*err, ErrorKind::Status { .. }) => {
                let reason: &ErrorKind = &err;
                warn!(error = %reason, fallback = ?configured.locales, "failed to retrieve supported locales, using configured");
                Ok(configured)
            },
            Err(err) => Err(err),
        }
    }

    #[instrument(level = "debug", skip(self), fields(locale = %locale))]
    pub async fn articles(&self, locale: &Locale) -> Result<Vec<Article>> {
        match self.collection(locale, CollectionKind::Articles).await? {
            Collection::Articles(articles) => Ok(articles),
            other => Err(mismatch(CollectionKind::Articles, &other)),
        }
    }

    #[instrument(level = "debug", skip(self), fields(locale = %locale))]
    pub async fn categories(&self, locale: &Locale) -> Result<Vec<Category>> {
        match self.collection(locale, CollectionKind::Categories).await? {
            Collection::Categories(categories) => Ok(categories),
            other => Err(mismatch(CollectionKind::Categories, &other)),
        }
    }

    #[instrument(level = "debug", skip(self), fields(locale = %locale))]
    pub async fn sections(&self, locale: &Locale) -> Result<Vec<Section>> {
        match self.collection(locale, CollectionKind::Sections).await? {
            Collection::Sections(sections) => Ok(sections),
            other => Err(mismatch(CollectionKind::Sections, &other)),
        }
    }

    async fn collection(&self, locale: &Locale, kind: CollectionKind) -> Result<Collection> {
        fetch_all(&self.transport, self.collection_endpoint(locale, kind)?).await
    }

    /// Metadata of a single attachment, addressed through its owning article.
    #[instrument(level = "debug", skip(self))]
    pub async fn attachment(&self, article_id: u64, attachment_id: u64) -> Result<Attachment> {
        let url = self.endpoint(&format!("articles/{article_id}/attachments/{attachment_id}"))?;
        let body = self.transport.get(&url).await?;
        let mut document: serde_json::Map<String, Value> =
            serde_json::from_slice(&body).or_raise(|| ErrorKind::Decode("article_attachment"))?;
        let attachment = document
            .remove("article_attachment")
            .filter(|value| !value.is_null())
            .ok_or_raise(|| ErrorKind::MissingField("article_attachment"))?;
        serde_json::from_value(attachment).or_raise(|| ErrorKind::Decode("article_attachment"))
    }

    /// Raw bytes behind an attachment's `content_url`.
    #[instrument(level = "debug", skip(self))]
    pub async fn download(&self, content_url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(content_url).or_raise(|| ErrorKind::InvalidUrl(content_url.to_string()))?;
        self.transport.get(&url).await
    }
}

fn mismatch(expected: CollectionKind, found: &Collection) -> crate::error::Error {
    ErrorKind::MismatchedCollection {
        expected,
        found: found.kind(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::json;

    const DOMAIN: &str = "https://acme.example.com";

    fn client(transport: MockTransport) -> HelpCenter<MockTransport> {
        HelpCenter::new(DOMAIN, transport).unwrap()
    }

    #[test]
    fn test_rejects_invalid_domain() {
        assert!(HelpCenter::new("not a url", MockTransport::default()).is_err());
        assert!(HelpCenter::new("mailto:agent@acme.example", MockTransport::default()).is_err());
    }

    #[test]
    fn test_collection_endpoint() {
        let client = HelpCenter::new("https://acme.example.com/", MockTransport::default()).unwrap();
        let url = client.collection_endpoint(&Locale::from("fr"), CollectionKind::Articles).unwrap();
        assert_eq!(url.as_str(), "https://acme.example.com/api/v2/help_center/fr/articles?per_page=100");
    }

    #[tokio::test]
    async fn test_locales() {
        let client = client(MockTransport::default().with_json(
            format!("{DOMAIN}/api/v2/help_center/locales"),
            json!({"locales": ["en-us", "fr"], "default_locale": "en-us"}),
        ));
        let locales = client.locales().await.unwrap();
        assert_eq!(locales.locales.len(), 2);
    }

    #[tokio::test]
    async fn test_locales_fallback_on_status() {
        let client = client(MockTransport::default().with_status(format!("{DOMAIN}/api/v2/help_center/locales"), 403));
        let configured = Locales {
            locales: vec![Locale::from("de")],
            default_locale: Locale::from("de"),
        };
        assert_eq!(client.locales_or(configured.clone()).await.unwrap(), configured);
    }

    #[tokio::test]
    async fn test_locales_no_fallback_on_garbage() {
        let client = client(
            MockTransport::default().with_bytes(format!("{DOMAIN}/api/v2/help_center/locales"), b"<html>".to_vec()),
        );
        let configured = Locales {
            locales: vec![Locale::from("de")],
            default_locale: Locale::from("de"),
        };
        let err = client.locales_or(configured).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Decode("locales"));
    }

    #[tokio::test]
    async fn test_articles_wrong_kind() {
        let client = client(MockTransport::default().with_json(
            format!("{DOMAIN}/api/v2/help_center/en-us/articles?per_page=100"),
            json!({"sections": []}),
        ));
        let err = client.articles(&Locale::from("en-us")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MismatchedCollection { .. }));
    }

    #[tokio::test]
    async fn test_attachment_metadata() {
        let client = client(MockTransport::default().with_json(
            format!("{DOMAIN}/api/v2/help_center/articles/1001/attachments/555"),
            json!({"article_attachment": {
                "id": 555,
                "article_id": 1001,
                "display_file_name": "foo.png",
                "content_type": "image/png",
                "size": 4,
                "content_url": format!("{DOMAIN}/hc/article_attachments/555/foo.png"),
            }}),
        ));
        let attachment = client.attachment(1001, 555).await.unwrap();
        assert_eq!(attachment.id, 555);
        assert_eq!(attachment.display_file_name, "foo.png");
        assert_eq!(attachment.content, None);
    }

    #[tokio::test]
    async fn test_attachment_missing_field() {
        let client = client(MockTransport::default().with_json(
            format!("{DOMAIN}/api/v2/help_center/articles/1001/attachments/555"),
            json!({"article_attachment": null}),
        ));
        let err = client.attachment(1001, 555).await.unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField("article_attachment"));
    }

    #[tokio::test]
    async fn test_download() {
        let client = client(
            MockTransport::default().with_bytes(format!("{DOMAIN}/hc/article_attachments/555/foo.png"), b"PNG!".to_vec()),
        );
        let bytes = client.download(&format!("{DOMAIN}/hc/article_attachments/555/foo.png")).await.unwrap();
        assert_eq!(bytes, b"PNG!");
    }
}
