//! Annotating locations with the parameters of their catalog items.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rise_client::{ItemFetcher, ResourceId};
use tracing::{info, instrument};

use crate::error::{QueryError, Result};
use crate::fanout::{fetch_ordered, with_timeout};
use crate::location::{dedupe, CatalogItem, Location};

/// Collection holding the items locations reference.
pub const CATALOG_ITEM_COLLECTION: &str = "catalog-item";

/// Joins locations to their catalog items, one level deep.
pub struct JoinResolver<F> {
    fetcher: Arc<F>,
    concurrency: usize,
    fetch_timeout: Duration,
}

impl<F: ItemFetcher> JoinResolver<F> {
    pub fn new(fetcher: Arc<F>, concurrency: usize, fetch_timeout: Duration) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            fetch_timeout,
        }
    }

    /// Fill in `parameter_names`/`parameter_ids` of every location.
    ///
    /// Each distinct catalog item is fetched once. If any fetch fails the
    /// whole join fails. Locations without items, or whose items carry no
    /// parameter, are kept with empty sets.
    #[instrument(skip(self, locations), fields(locations = locations.len()))]
    pub async fn annotate_with_parameters(
        &self,
        mut locations: Vec<Location>,
    ) -> Result<Vec<Location>> {
        let ids = distinct_catalog_items(&locations);

        let fetched = fetch_ordered(
            ids.iter().map(|id| {
                with_timeout(
                    ResourceId::item(CATALOG_ITEM_COLLECTION, id.as_str()),
                    self.fetch_timeout,
                    self.fetcher.fetch_item(CATALOG_ITEM_COLLECTION, id),
                )
            }),
            self.concurrency,
        )
        .await
        .map_err(QueryError::join)?;

        // Keyed by the requested id so lookups match the location's refs.
        let items: HashMap<&str, CatalogItem> = ids
            .iter()
            .map(String::as_str)
            .zip(fetched.iter().map(CatalogItem::from_raw))
            .collect();

        for location in &mut locations {
            for item in location.catalog_items.iter().filter_map(|id| items.get(id.as_str())) {
                if let Some(name) = &item.parameter_name {
                    location.parameter_names.insert(name.clone());
                }
                if let Some(id) = &item.parameter_id {
                    location.parameter_ids.insert(id.clone());
                }
            }
        }

        info!(catalog_items = ids.len(), "Joined catalog items");
        Ok(locations)
    }
}

/// Distinct catalog-item ids over all locations, first-seen order.
pub fn distinct_catalog_items(locations: &[Location]) -> Vec<String> {
    dedupe(
        locations
            .iter()
            .flat_map(|location| location.catalog_items.iter().cloned()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn location(id: &str, items: &[&str]) -> Location {
        Location {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            geometry: None,
            elevation: None,
            updated: None,
            catalog_items: items.iter().map(|s| s.to_string()).collect(),
            parameter_names: BTreeSet::new(),
            parameter_ids: BTreeSet::new(),
        }
    }

    #[test]
    fn test_distinct_catalog_items() {
        let locations = vec![
            location("L1", &["C1", "C2"]),
            location("L2", &["C2"]),
            location("L3", &[]),
            location("L4", &["C3", "C1"]),
        ];

        assert_eq!(distinct_catalog_items(&locations), vec!["C1", "C2", "C3"]);
    }
}
