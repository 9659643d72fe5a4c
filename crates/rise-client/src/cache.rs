//! Look-aside TTL cache for upstream pages and items.
//!
//! ## Key structure
//! Entries are keyed by `(kind, id)`: the collection name plus the item id,
//! or plus `page:{index}:{size}` for collection pages.
//!
//! ## Invalidation
//! - TTL per entry, checked lazily on read
//! - Explicit `invalidate` / `clear`
//!
//! Only successful fetches are stored. Concurrent misses on the same key may
//! both reach the upstream; the last write wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::error::FetchResult;
use crate::fetcher::{ItemFetcher, PageFetcher};
use crate::types::{Page, RawItem};

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Statistics for a result cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Total cache hits.
    pub hits: AtomicU64,
    /// Total cache misses (including expired entries).
    pub misses: AtomicU64,
    /// Entries dropped because their TTL elapsed.
    pub expired: AtomicU64,
    /// Total entries written.
    pub inserts: AtomicU64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Concurrent `(kind, id) -> value` map with per-entry TTL.
pub struct ResultCache<V> {
    entries: DashMap<(String, String), CacheEntry<V>>,
    stats: CacheStats,
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> ResultCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Get a live entry. Expired entries are removed and count as a miss.
    pub fn get(&self, kind: &str, id: &str) -> Option<V> {
        let key = (kind.to_string(), id.to_string());

        let expired = match self.entries.get(&key) {
            Some(entry) if !entry.is_expired() => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired && self.entries.remove_if(&key, |_, e| e.is_expired()).is_some() {
            self.stats.expired.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a value, replacing any previous entry for the key.
    pub fn put(&self, kind: &str, id: &str, value: V, ttl: Duration) {
        self.entries.insert(
            (kind.to_string(), id.to_string()),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, kind: &str, id: &str) -> bool {
        self.entries
            .remove(&(kind.to_string(), id.to_string()))
            .is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until next read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

fn page_key(page_index: usize, page_size: usize) -> String {
    format!("page:{}:{}", page_index, page_size)
}

/// Fetcher decorator that consults shared result caches first.
pub struct CachingFetcher<F> {
    inner: F,
    pages: Arc<ResultCache<Page>>,
    items: Arc<ResultCache<RawItem>>,
    ttl: Duration,
    force_fetch: bool,
}

impl<F> CachingFetcher<F> {
    /// Wrap a fetcher with fresh caches.
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self::with_caches(
            inner,
            Arc::new(ResultCache::new()),
            Arc::new(ResultCache::new()),
            ttl,
        )
    }

    /// Wrap a fetcher with caches shared across fetchers.
    pub fn with_caches(
        inner: F,
        pages: Arc<ResultCache<Page>>,
        items: Arc<ResultCache<RawItem>>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner,
            pages,
            items,
            ttl,
            force_fetch: false,
        }
    }

    /// Skip cache reads. Successful fetches still refresh the entry.
    pub fn force_fetch(mut self, force: bool) -> Self {
        self.force_fetch = force;
        self
    }

    pub fn page_cache(&self) -> &Arc<ResultCache<Page>> {
        &self.pages
    }

    pub fn item_cache(&self) -> &Arc<ResultCache<RawItem>> {
        &self.items
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for CachingFetcher<F> {
    async fn fetch_page(
        &self,
        collection: &str,
        page_index: usize,
        page_size: usize,
    ) -> FetchResult<Page> {
        let key = page_key(page_index, page_size);

        if !self.force_fetch {
            if let Some(page) = self.pages.get(collection, &key) {
                debug!(collection = %collection, page = page_index, "Page cache hit");
                return Ok(page);
            }
        }

        debug!(collection = %collection, page = page_index, "Page cache miss");
        let page = self
            .inner
            .fetch_page(collection, page_index, page_size)
            .await?;
        self.pages.put(collection, &key, page.clone(), self.ttl);
        Ok(page)
    }
}

#[async_trait]
impl<F: ItemFetcher> ItemFetcher for CachingFetcher<F> {
    async fn fetch_item(&self, collection: &str, id: &str) -> FetchResult<RawItem> {
        if !self.force_fetch {
            if let Some(item) = self.items.get(collection, id) {
                debug!(collection = %collection, id = %id, "Item cache hit");
                return Ok(item);
            }
        }

        debug!(collection = %collection, id = %id, "Item cache miss");
        let item = self.inner.fetch_item(collection, id).await?;
        self.items.put(collection, id, item.clone(), self.ttl);
        Ok(item)
    }
}
