//! Leaf fetchers for the RISE JSON:API.
//!
//! Each call is exactly one outbound GET. Nothing here retries; failures
//! are classified and returned with the identity of the resource.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, instrument, warn};

use crate::config::RiseClientConfig;
use crate::error::{FetchError, FetchResult, ResourceId};
use crate::types::{error_detail, local_id, parse_item, parse_page, Page, RawItem, MAX_PAGE_SIZE};

const JSON_API: &str = "application/vnd.api+json";

/// Fetches one page of a paginated collection.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch page `page_index` (zero-based) holding up to `page_size` items.
    async fn fetch_page(
        &self,
        collection: &str,
        page_index: usize,
        page_size: usize,
    ) -> FetchResult<Page>;
}

/// Fetches one item of a collection by id.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch_item(&self, collection: &str, id: &str) -> FetchResult<RawItem>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch_page(
        &self,
        collection: &str,
        page_index: usize,
        page_size: usize,
    ) -> FetchResult<Page> {
        (**self).fetch_page(collection, page_index, page_size).await
    }
}

#[async_trait]
impl<T: ItemFetcher + ?Sized> ItemFetcher for Arc<T> {
    async fn fetch_item(&self, collection: &str, id: &str) -> FetchResult<RawItem> {
        (**self).fetch_item(collection, id).await
    }
}

/// HTTP fetcher against a live RISE deployment.
#[derive(Clone)]
pub struct RiseClient {
    client: Client,
    config: RiseClientConfig,
}

impl RiseClient {
    /// Create a client with the given configuration.
    pub fn new(config: RiseClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RiseClientConfig {
        &self.config
    }

    async fn get(
        &self,
        resource: &ResourceId,
        url: &str,
        query: &[(&str, String)],
    ) -> FetchResult<Vec<u8>> {
        debug!(url = %url, "Fetching");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, JSON_API)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::transient(resource.clone(), e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transient(resource.clone(), e.to_string()))?;

        if !status.is_success() {
            let detail = error_detail(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_default();
            warn!(resource = %resource, status = status.as_u16(), detail = %detail, "Upstream request failed");
            return Err(FetchError::upstream(resource.clone(), status.as_u16(), detail));
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl PageFetcher for RiseClient {
    #[instrument(skip(self), fields(base = %self.config.base_url))]
    async fn fetch_page(
        &self,
        collection: &str,
        page_index: usize,
        page_size: usize,
    ) -> FetchResult<Page> {
        let resource = ResourceId::page(collection, page_index);
        let url = self.config.collection_url(collection);
        let query = [
            ("page", (page_index + 1).to_string()),
            ("itemsPerPage", page_size.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];

        let body = self.get(&resource, &url, &query).await?;
        let page = parse_page(collection, page_index, &body)?;

        debug!(items = page.items.len(), has_next = page.has_next, "Fetched page");
        Ok(page)
    }
}

#[async_trait]
impl ItemFetcher for RiseClient {
    #[instrument(skip(self), fields(base = %self.config.base_url))]
    async fn fetch_item(&self, collection: &str, id: &str) -> FetchResult<RawItem> {
        let resource = ResourceId::item(collection, id);
        let url = format!(
            "{}/{}",
            self.config.collection_url(collection),
            local_id(id)
        );

        let body = self.get(&resource, &url, &[]).await?;
        parse_item(collection, id, &body)
    }
}
