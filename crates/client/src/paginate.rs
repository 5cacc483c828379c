//! Cursor pagination.

use crate::error::{ErrorKind, Result};
use crate::models::{Collection, Page};
use crate::transport::Transport;
use async_stream::stream;
use exn::{OptionExt, ResultExt};
use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::pin::pin;
use tracing::{debug, instrument};
use url::Url;

/// Walks a paginated endpoint, yielding each decoded page in order.
///
/// The walk follows `next_page` until a page omits it. The first error ends
/// the stream. A `next_page` that points back at an already visited URL is
/// reported as [`ErrorKind::PaginationLoop`] instead of being followed forever.
pub fn pages<T>(transport: &T, start: Url) -> impl Stream<Item = Result<Page>> + Send + '_
where
    T: Transport + ?Sized,
{
    stream! {
        let mut visited = HashSet::new();
        let mut next = Some(start);
        while let Some(url) = next.take() {
            if !visited.insert(url.to_string()) {
                yield Err(ErrorKind::PaginationLoop(url.to_string()).into());
                return;
            }
            let page = match fetch_page(transport, &url).await {
                Ok(page) => page,
                Err(err) => {
                    yield Err(err);
                    return;
                },
            };
            if let Some(link) = page.next_page.as_deref() {
                match Url::parse(link).or_raise(|| ErrorKind::InvalidUrl(link.to_string())) {
                    Ok(link) => next = Some(link),
                    Err(err) => {
                        yield Err(err);
                        return;
                    },
                }
            }
            yield Ok(page);
        }
    }
}

async fn fetch_page<T: Transport + ?Sized>(transport: &T, url: &Url) -> Result<Page> {
    let body = transport.get(url).await?;
    let page = Page::decode(&body)?;
    debug!(%url, kind = %page.items.kind(), items = page.items.len(), "page fetched");
    Ok(page)
}

/// Collects every item of a paginated endpoint into one [`Collection`].
///
/// Items are appended in page order without deduplication. Every page must
/// carry the same kind of collection as the first one.
#[instrument(level = "debug", skip(transport), fields(start = %start))]
pub async fn fetch_all<T>(transport: &T, start: Url) -> Result<Collection>
where
    T: Transport + ?Sized,
{
    let mut pages = pin!(pages(transport, start));
    let mut collected: Option<Collection> = None;
    let mut count = 0_usize;
    while let Some(page) = pages.next().await {
        let page = page?;
        count += 1;
        match collected.as_mut() {
            Some(collection) => collection.extend(page.items)?,
            None => collected = Some(page.items),
        }
    }
    let collected = collected.ok_or_raise(|| ErrorKind::UnknownCollection)?;
    debug!(pages = count, items = collected.len(), kind = %collected.kind(), "collection complete");
    Ok(collected)
}
