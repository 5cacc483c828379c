//! Transport seam between the client and the network.
//!
//! The client only ever needs authenticated `GET`s that return a body, so the
//! trait is that single operation. [`HttpTransport`] talks to the platform;
//! [`MockTransport`] (feature `mock`) serves canned responses in tests.

mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

use crate::error::Result;
use async_trait::async_trait;
use url::Url;

pub use http::{Credentials, HttpTransport};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a `GET` and returns the body of a successful response.
    ///
    /// A non-success status must fail with
    /// [`ErrorKind::Status`](crate::error::ErrorKind::Status); no retries.
    async fn get(&self, url: &Url) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        (**self).get(url).await
    }
}
