//! In-memory RISE upstream.
//!
//! `FakeRise` implements both fetcher traits over canned resource objects.
//! Responses go through the real envelope decoders, so tests exercise the
//! same parsing as the HTTP client. Individual pages and items can be made
//! to fail or to answer late, and every call is counted.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rise_client::types::{parse_item, parse_page};
use rise_client::{local_id, FetchError, FetchResult, ItemFetcher, Page, PageFetcher, RawItem, ResourceId};
use serde_json::Value;

use crate::fixtures::{item_body, page_body};

#[derive(Default)]
struct CallLog {
    pages: HashMap<(String, usize), usize>,
    items: HashMap<(String, String), usize>,
}

/// Fake upstream with failure injection and call counting.
#[derive(Default)]
pub struct FakeRise {
    collections: HashMap<String, Vec<Value>>,
    declare_total: bool,
    page_failures: HashSet<(String, usize)>,
    item_failures: HashSet<(String, String)>,
    page_delays: HashMap<(String, usize), Duration>,
    item_delays: HashMap<(String, String), Duration>,
    calls: Mutex<CallLog>,
}

impl FakeRise {
    /// An empty upstream that declares `totalItems` on every page.
    pub fn new() -> Self {
        Self {
            declare_total: true,
            ..Default::default()
        }
    }

    /// Add resource objects to a collection.
    pub fn with_collection(mut self, collection: &str, items: Vec<Value>) -> Self {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(items);
        self
    }

    /// Omit `totalItems`, so pages must be discovered via `links.next`.
    pub fn without_total(mut self) -> Self {
        self.declare_total = false;
        self
    }

    /// Make page `index` (zero-based) of `collection` answer with a 500.
    pub fn fail_page(mut self, collection: &str, index: usize) -> Self {
        self.page_failures.insert((collection.to_string(), index));
        self
    }

    /// Make item `id` of `collection` answer with a 500.
    pub fn fail_item(mut self, collection: &str, id: &str) -> Self {
        self.item_failures.insert((collection.to_string(), id.to_string()));
        self
    }

    pub fn delay_page(mut self, collection: &str, index: usize, delay: Duration) -> Self {
        self.page_delays.insert((collection.to_string(), index), delay);
        self
    }

    pub fn delay_item(mut self, collection: &str, id: &str, delay: Duration) -> Self {
        self.item_delays.insert((collection.to_string(), id.to_string()), delay);
        self
    }

    /// Calls made for one page.
    pub fn page_calls(&self, collection: &str, index: usize) -> usize {
        self.log()
            .pages
            .get(&(collection.to_string(), index))
            .copied()
            .unwrap_or(0)
    }

    /// Calls made for any page of a collection.
    pub fn total_page_calls(&self, collection: &str) -> usize {
        self.log()
            .pages
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, n)| n)
            .sum()
    }

    /// Calls made for one item.
    pub fn item_calls(&self, collection: &str, id: &str) -> usize {
        self.log()
            .items
            .get(&(collection.to_string(), id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Calls made for any item of a collection.
    pub fn total_item_calls(&self, collection: &str) -> usize {
        self.log()
            .items
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, n)| n)
            .sum()
    }

    /// Distinct items of a collection that were requested.
    pub fn distinct_item_calls(&self, collection: &str) -> usize {
        self.log()
            .items
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }

    fn log(&self) -> std::sync::MutexGuard<'_, CallLog> {
        // A panicking test thread must not hide the counts from others.
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn find_item(&self, collection: &str, id: &str) -> Option<&Value> {
        let wanted = local_id(id);
        self.collections.get(collection)?.iter().find(|item| {
            item.get("id")
                .and_then(Value::as_str)
                .map_or(false, |item_id| local_id(item_id) == wanted)
        })
    }
}

#[async_trait]
impl PageFetcher for FakeRise {
    async fn fetch_page(
        &self,
        collection: &str,
        page_index: usize,
        page_size: usize,
    ) -> FetchResult<Page> {
        *self
            .log()
            .pages
            .entry((collection.to_string(), page_index))
            .or_default() += 1;

        let key = (collection.to_string(), page_index);
        if let Some(delay) = self.page_delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        if self.page_failures.contains(&key) {
            return Err(FetchError::upstream(
                ResourceId::page(collection, page_index),
                500,
                "Internal Server Error",
            ));
        }

        let all = self.collections.get(collection).map(Vec::as_slice).unwrap_or(&[]);
        let page_size = page_size.max(1);
        let start = (page_index * page_size).min(all.len());
        let end = (start + page_size).min(all.len());
        let has_next = end < all.len();

        let body = page_body(
            collection,
            all[start..end].to_vec(),
            page_index,
            page_size,
            self.declare_total.then_some(all.len()),
            has_next,
        );
        let bytes = serde_json::to_vec(&body)
            .map_err(|e| FetchError::malformed(ResourceId::page(collection, page_index), e.to_string()))?;
        parse_page(collection, page_index, &bytes)
    }
}

#[async_trait]
impl ItemFetcher for FakeRise {
    async fn fetch_item(&self, collection: &str, id: &str) -> FetchResult<RawItem> {
        *self
            .log()
            .items
            .entry((collection.to_string(), id.to_string()))
            .or_default() += 1;

        let key = (collection.to_string(), id.to_string());
        if let Some(delay) = self.item_delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        if self.item_failures.contains(&key) {
            return Err(FetchError::upstream(
                ResourceId::item(collection, id),
                500,
                "Internal Server Error",
            ));
        }

        let item = self
            .find_item(collection, id)
            .cloned()
            .ok_or_else(|| FetchError::upstream(ResourceId::item(collection, id), 404, "Not Found"))?;

        let bytes = serde_json::to_vec(&item_body(item))
            .map_err(|e| FetchError::malformed(ResourceId::item(collection, id), e.to_string()))?;
        parse_item(collection, id, &bytes)
    }
}
