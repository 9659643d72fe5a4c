//! Merging every page of a paginated collection.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rise_client::{FetchError, FetchResult, Page, PageFetcher, RawItem, ResourceId};
use tracing::{debug, info, instrument, warn};

use crate::error::{QueryError, Result};
use crate::fanout::{fetch_ordered, with_timeout};

/// Fetches all pages of a collection and merges them in server order.
///
/// Either every page arrives and the merged list is returned, or the
/// first failing page is reported as an incomplete merge.
pub struct CollectionMerger<F> {
    fetcher: Arc<F>,
    concurrency: usize,
    fetch_timeout: Duration,
}

impl<F: PageFetcher> CollectionMerger<F> {
    pub fn new(fetcher: Arc<F>, concurrency: usize, fetch_timeout: Duration) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            fetch_timeout,
        }
    }

    async fn fetch_page(&self, collection: &str, index: usize, page_size: usize) -> FetchResult<Page> {
        with_timeout(
            ResourceId::page(collection, index),
            self.fetch_timeout,
            self.fetcher.fetch_page(collection, index, page_size),
        )
        .await
    }

    /// Fetch and merge every page of `collection`.
    ///
    /// Page 0 is fetched first to learn `totalItems` and the page size the
    /// upstream actually served; the remaining pages are then fetched
    /// concurrently at that size. Fewer items than `totalItems` fails the
    /// merge. Without `totalItems` the pages are followed one by one through
    /// `links.next`. Items whose id was already seen on an earlier page are
    /// dropped.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, collection: &str, page_size: usize) -> Result<Vec<RawItem>> {
        let first = self
            .fetch_page(collection, 0, page_size)
            .await
            .map_err(QueryError::merge)?;

        let pages = if !first.is_paginated() {
            vec![first]
        } else if let Some(count) = first.page_count(page_size) {
            let served = first.served_page_size(page_size);
            debug!(pages = count, page_size = served, "Fetching remaining pages");
            let rest = fetch_ordered(
                (1..count).map(|index| self.fetch_page(collection, index, served)),
                self.concurrency,
            )
            .await
            .map_err(QueryError::merge)?;

            let pages: Vec<Page> = std::iter::once(first).chain(rest).collect();
            check_declared_total(collection, &pages)?;
            pages
        } else {
            self.follow_next_links(collection, page_size, first).await?
        };

        let page_count = pages.len();
        let items = merge_pages(pages);

        info!(collection = %collection, pages = page_count, items = items.len(), "Merged collection");
        Ok(items)
    }

    async fn follow_next_links(
        &self,
        collection: &str,
        page_size: usize,
        first: Page,
    ) -> Result<Vec<Page>> {
        let mut pages = vec![first];

        while let Some(last) = pages.last() {
            if !last.has_next || last.items.is_empty() {
                break;
            }
            let index = last.index + 1;
            let page = self
                .fetch_page(collection, index, page_size)
                .await
                .map_err(QueryError::merge)?;
            pages.push(page);
        }

        Ok(pages)
    }
}

/// Fail when the pages hold fewer items than page 0 declared.
fn check_declared_total(collection: &str, pages: &[Page]) -> Result<()> {
    let Some(declared) = pages.first().and_then(Page::total_items) else {
        return Ok(());
    };
    let received: usize = pages.iter().map(|page| page.items.len()).sum();
    if received >= declared {
        return Ok(());
    }

    warn!(collection = %collection, received, declared, "Merged fewer items than declared");
    let last = pages.len().saturating_sub(1);
    Err(QueryError::merge(FetchError::malformed(
        ResourceId::page(collection, last),
        format!("merged {} of {} declared items", received, declared),
    )))
}

/// Concatenate pages in order, keeping the first item seen for each id.
pub fn merge_pages(pages: Vec<Page>) -> Vec<RawItem> {
    let mut seen = HashSet::new();
    pages
        .into_iter()
        .flat_map(|page| page.items)
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}
