//! Query execution for the driver.
//!
//! Maps a parsed command onto the resolver and renders the outcome as the
//! JSON document an EDR route would return: a GeoJSON feature collection,
//! a parameter map, or an OGC exception.

use edr_protocol::EdrError;
use rise_client::{ItemFetcher, PageFetcher};
use rise_edr::{to_feature_collection, LocationQuery, LocationQueryParams, LocationResolver};
use serde_json::{Map, Value};
use tracing::info;

/// What the driver was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// All locations matching the query.
    Locations(LocationQueryParams),
    /// One location by id, checked against the query.
    Location {
        id: String,
        params: LocationQueryParams,
    },
    /// The parameters the upstream knows about.
    Parameters,
}

/// Run a command and render its result.
pub async fn execute<F>(resolver: &LocationResolver<F>, command: &Command) -> Result<Value, EdrError>
where
    F: PageFetcher + ItemFetcher,
{
    match command {
        Command::Locations(params) => {
            let query = LocationQuery::from_params(params)?;
            let locations = resolver.resolve_locations_by_parameter(&query).await?;
            info!(count = locations.len(), "Locations query complete");
            to_json(&to_feature_collection(&locations))
        }
        Command::Location { id, params } => {
            let query = LocationQuery::from_params(params)?;
            let locations = resolver.resolve_location(id, &query).await?;
            to_json(&to_feature_collection(&locations))
        }
        Command::Parameters => {
            let parameters = resolver.list_parameters().await?;
            let mut by_id = Map::new();
            for parameter in parameters {
                let key = parameter.id.clone().unwrap_or_default();
                by_id.insert(key, to_json(&parameter)?);
            }
            Ok(Value::Object(by_id))
        }
    }
}

/// Render an error as an OGC exception document.
pub fn render_error(err: &EdrError) -> Value {
    serde_json::to_value(err.to_exception()).unwrap_or_else(|_| {
        serde_json::json!({"status": err.status_code(), "detail": err.to_string()})
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, EdrError> {
    serde_json::to_value(value).map_err(|e| EdrError::InternalError(e.to_string()))
}
