//! Canned-response transport for testing.

use super::Transport;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

#[derive(Debug, Clone)]
struct Response {
    status: u16,
    body: Vec<u8>,
}

/// [`Transport`] that answers from a fixed table of URLs and records every
/// request it receives.
///
/// URLs are matched on their full string form, query included. Requests for
/// an unregistered URL answer with HTTP 404.
///
/// ```
/// use helpvault_client::transport::{MockTransport, Transport};
/// use url::Url;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = MockTransport::default().with_json(
///     "https://acme.example.com/api/v2/help_center/locales",
///     serde_json::json!({"locales": ["en-us"], "default_locale": "en-us"}),
/// );
/// let url = Url::parse("https://acme.example.com/api/v2/help_center/locales").unwrap();
/// assert!(transport.get(&url).await.is_ok());
/// assert_eq!(transport.request_count(url.as_str()), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: HashMap<String, Response>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn with_json(self, url: impl AsRef<str>, value: serde_json::Value) -> Self {
        self.with_response(url, 200, value.to_string().into_bytes())
    }

    pub fn with_bytes(self, url: impl AsRef<str>, body: impl Into<Vec<u8>>) -> Self {
        self.with_response(url, 200, body)
    }

    pub fn with_status(self, url: impl AsRef<str>, status: u16) -> Self {
        self.with_response(url, status, Vec::new())
    }

    pub fn with_response(mut self, url: impl AsRef<str>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        // Normalize through `Url` so registrations match what the client sends.
        let key = Url::parse(url.as_ref()).map_or_else(|_| url.as_ref().to_string(), String::from);
        self.responses.insert(
            key,
            Response {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Every requested URL, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }

    /// How many times `url` was requested.
    pub fn request_count(&self, url: impl AsRef<str>) -> usize {
        let key = Url::parse(url.as_ref()).map_or_else(|_| url.as_ref().to_string(), String::from);
        self.requests().iter().filter(|requested| **requested == key).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        let response = self.responses.get(url.as_str()).cloned().unwrap_or(Response {
            status: 404,
            body: Vec::new(),
        });
        if !(200..300).contains(&response.status) {
            exn::bail!(ErrorKind::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body)
    }
}
