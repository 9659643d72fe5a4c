//! Client for the RISE (Reclamation Information Sharing Environment) API.
//!
//! Provides the two leaf operations resolvers are built on, a page fetch
//! and an item fetch, as traits with an HTTP implementation, plus a shared
//! TTL cache that decorates either.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use rise_client::{CachingFetcher, ItemFetcher, RiseClient, RiseClientConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RiseClient::new(RiseClientConfig::default())?;
//! let fetcher = CachingFetcher::new(client, Duration::from_secs(300));
//! let item = fetcher.fetch_item("catalog-item", "128562").await?;
//! println!("{}", item.id);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod types;

pub use cache::{CacheStats, CachingFetcher, ResultCache};
pub use config::RiseClientConfig;
pub use error::{FetchError, FetchErrorKind, FetchResult, ResourceId};
pub use fetcher::{ItemFetcher, PageFetcher, RiseClient};
pub use types::{local_id, Page, PageMeta, RawItem, MAX_PAGE_SIZE};
