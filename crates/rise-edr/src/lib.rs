//! EDR location queries over the RISE API.
//!
//! RISE cannot filter locations by the parameters they measure: that
//! attribute lives on catalog items. This crate answers such queries by
//! merging the paginated `location` collection, joining the locations to
//! their catalog items and filtering the result.
//!
//! Both fan-out stages (page merge and item join) are all-or-nothing: one
//! failed fetch yields [`QueryError::IncompleteJoin`], never a partial list.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rise_client::{CachingFetcher, RiseClient, RiseClientConfig};
//! use rise_edr::{to_feature_collection, LocationQuery, LocationResolver, ResolverConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RiseClient::new(RiseClientConfig::default())?;
//! let fetcher = Arc::new(CachingFetcher::new(client, Duration::from_secs(300)));
//! let resolver = LocationResolver::new(fetcher, ResolverConfig::default());
//!
//! let query = LocationQuery::by_parameter(["Lake/Reservoir Storage"]);
//! let locations = resolver.resolve_locations_by_parameter(&query).await?;
//! println!("{}", serde_json::to_string(&to_feature_collection(&locations))?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod fanout;
pub mod filter;
pub mod join;
pub mod location;
pub mod merger;
pub mod query;
pub mod resolver;

pub use config::ResolverConfig;
pub use error::{JoinStage, QueryError, Result};
pub use filter::{apply, LocationPredicate};
pub use join::{distinct_catalog_items, JoinResolver, CATALOG_ITEM_COLLECTION};
pub use location::{parameter_from_raw, CatalogItem, Location};
pub use merger::{merge_pages, CollectionMerger};
pub use query::{LocationQuery, LocationQueryParams};
pub use resolver::{
    to_feature_collection, LocationResolver, LOCATION_COLLECTION, PARAMETER_COLLECTION,
};
