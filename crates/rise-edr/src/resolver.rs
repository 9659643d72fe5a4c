//! Location query orchestration.

use std::sync::Arc;

use edr_protocol::{LocationFeatureCollection, Parameter};
use rise_client::{FetchError, ItemFetcher, PageFetcher, ResourceId};
use tracing::{info, instrument, warn};

use crate::config::ResolverConfig;
use crate::error::{QueryError, Result};
use crate::fanout::with_timeout;
use crate::filter::apply;
use crate::join::JoinResolver;
use crate::location::{parameter_from_raw, Location};
use crate::merger::CollectionMerger;
use crate::query::LocationQuery;

/// Collection holding monitored locations.
pub const LOCATION_COLLECTION: &str = "location";

/// Collection holding parameter metadata.
pub const PARAMETER_COLLECTION: &str = "parameter";

/// Answers EDR location queries against RISE.
///
/// Flow: merge all `location` pages, apply the cheap predicates (bbox,
/// datetime, z), join the survivors to their catalog items when a
/// parameter-name constraint is present, filter on parameters, then
/// apply offset and limit.
pub struct LocationResolver<F> {
    fetcher: Arc<F>,
    config: ResolverConfig,
}

impl<F: PageFetcher + ItemFetcher> LocationResolver<F> {
    pub fn new(fetcher: Arc<F>, config: ResolverConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn merger(&self) -> CollectionMerger<F> {
        CollectionMerger::new(
            Arc::clone(&self.fetcher),
            self.config.effective_concurrency(),
            self.config.fetch_timeout(),
        )
    }

    fn joiner(&self) -> JoinResolver<F> {
        JoinResolver::new(
            Arc::clone(&self.fetcher),
            self.config.effective_concurrency(),
            self.config.fetch_timeout(),
        )
    }

    /// Resolve every location matching `query`.
    ///
    /// Returns an error rather than a partial result if any page or
    /// catalog item could not be fetched.
    #[instrument(skip(self, query), fields(parameters = ?query.predicate.parameter_names))]
    pub async fn resolve_locations_by_parameter(&self, query: &LocationQuery) -> Result<Vec<Location>> {
        let raw = self
            .merger()
            .fetch_all(LOCATION_COLLECTION, self.config.effective_page_size())
            .await?;
        let total = raw.len();

        let locations: Vec<Location> = raw.iter().map(Location::from_raw).collect();
        let candidates = apply(locations, &query.predicate.without_parameters());
        let prefiltered = candidates.len();

        let matched = if query.predicate.needs_join() {
            let joined = self.joiner().annotate_with_parameters(candidates).await?;
            apply(joined, &query.predicate)
        } else {
            candidates
        };

        info!(
            total = total,
            prefiltered = prefiltered,
            matched = matched.len(),
            "Resolved locations"
        );
        Ok(query.paginate(matched))
    }

    /// Resolve one location by id, joined and checked against `query`.
    ///
    /// Returns an empty list when the location exists but does not match.
    #[instrument(skip(self, query))]
    pub async fn resolve_location(&self, id: &str, query: &LocationQuery) -> Result<Vec<Location>> {
        let raw = with_timeout(
            ResourceId::item(LOCATION_COLLECTION, id),
            self.config.fetch_timeout(),
            self.fetcher.fetch_item(LOCATION_COLLECTION, id),
        )
        .await
        .map_err(|e| match e {
            FetchError::UpstreamServer { status: 404, .. } => QueryError::NotFound(id.to_string()),
            other => QueryError::merge(other),
        })?;

        let location = Location::from_raw(&raw);
        if location.catalog_items.is_empty() {
            warn!(location_id = %location.id, "Location references no catalog items");
        }

        let joined = self.joiner().annotate_with_parameters(vec![location]).await?;
        Ok(apply(joined, &query.predicate))
    }

    /// List the parameters the upstream knows about.
    #[instrument(skip(self))]
    pub async fn list_parameters(&self) -> Result<Vec<Parameter>> {
        let raw = self
            .merger()
            .fetch_all(PARAMETER_COLLECTION, self.config.effective_page_size())
            .await?;

        Ok(raw.iter().map(parameter_from_raw).collect())
    }
}

/// Render locations as an EDR GeoJSON feature collection.
pub fn to_feature_collection(locations: &[Location]) -> LocationFeatureCollection {
    LocationFeatureCollection::from_features(locations.iter().map(Location::to_feature).collect())
}
