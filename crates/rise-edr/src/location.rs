//! Domain records decoded from RISE resource objects.
//!
//! Decoding is lenient: RISE omits relationships and coordinates on some
//! locations, and elevations arrive as strings. Missing pieces become
//! `None`/empty and are logged rather than failing the query.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use edr_protocol::{parse_timestamp, Geometry, LocationFeature, Parameter};
use rise_client::{local_id, RawItem};
use serde_json::Value;
use tracing::{debug, warn};

/// A monitored point or area.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Local RISE id (`6902`).
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub geometry: Option<Geometry>,
    pub elevation: Option<f64>,
    /// Last update of the location record, in the offset RISE reported.
    pub updated: Option<DateTime<FixedOffset>>,
    /// Referenced catalog items, in upstream order without duplicates.
    pub catalog_items: Vec<String>,
    /// Parameter names of the referenced catalog items. Empty until joined.
    pub parameter_names: BTreeSet<String>,
    /// Parameter ids of the referenced catalog items. Empty until joined.
    pub parameter_ids: BTreeSet<String>,
}

impl Location {
    /// Decode a `location` resource object.
    pub fn from_raw(item: &RawItem) -> Self {
        let empty = Value::Null;
        let attributes = item.attributes().unwrap_or(&empty);

        let id = attributes
            .get("_id")
            .and_then(value_to_string)
            .unwrap_or_else(|| item.local_id().to_string());

        let name = attributes
            .get("locationName")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());

        let geometry = match attributes.get("locationCoordinates") {
            None | Some(Value::Null) => None,
            Some(coords) => match serde_json::from_value::<Geometry>(coords.clone()) {
                Ok(geometry) => Some(geometry),
                Err(e) => {
                    warn!(location_id = %id, error = %e, "Unsupported location geometry");
                    None
                }
            },
        };

        let updated = attributes
            .get("updateDate")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);

        let catalog_items = match item
            .relationships()
            .and_then(|r| r.get("catalogItems"))
            .and_then(|c| c.get("data"))
            .and_then(Value::as_array)
        {
            Some(refs) => dedupe(
                refs.iter()
                    .filter_map(|r| r.get("id").and_then(value_to_string))
                    .map(|id| local_id(&id).to_string()),
            ),
            None => {
                warn!(location_id = %id, "Location has no catalogItems relationship");
                Vec::new()
            }
        };

        Self {
            name,
            description: attributes
                .get("locationDescription")
                .and_then(Value::as_str)
                .map(str::to_string),
            geometry,
            elevation: attributes.get("elevation").and_then(value_to_f64),
            updated,
            catalog_items,
            parameter_names: BTreeSet::new(),
            parameter_ids: BTreeSet::new(),
            id,
        }
    }

    /// Convert to an EDR GeoJSON feature.
    pub fn to_feature(&self) -> LocationFeature {
        let mut feature = LocationFeature::new(&self.id, &self.name, self.geometry.clone())
            .with_parameter_names(self.parameter_names.iter().cloned());

        if let Some(description) = &self.description {
            feature = feature.with_description(description);
        }
        if let Some(elevation) = self.elevation {
            feature = feature.with_elevation(elevation);
        }
        if let Some(updated) = self.updated {
            feature = feature.with_datetime(
                updated
                    .with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            );
        }
        feature
    }
}

/// A catalog item: one monitored dataset, optionally tied to a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub parameter_name: Option<String>,
    pub parameter_id: Option<String>,
    /// Back-reference to the owning catalog record.
    pub catalog_record: Option<String>,
}

impl CatalogItem {
    /// Decode a `catalog-item` resource object.
    pub fn from_raw(item: &RawItem) -> Self {
        let attributes = item.attributes();
        let attr = |key: &str| attributes.and_then(|a| a.get(key)).and_then(value_to_string);

        let catalog_record = item
            .relationships()
            .and_then(|r| r.pointer("/catalogRecord/data/id"))
            .and_then(value_to_string)
            .map(|id| local_id(&id).to_string());

        let parsed = Self {
            id: item.local_id().to_string(),
            parameter_name: attr("parameterName"),
            parameter_id: attr("parameterId"),
            catalog_record,
        };

        if parsed.parameter_name.is_none() && parsed.parameter_id.is_none() {
            debug!(catalog_item = %parsed.id, "Catalog item has no parameter");
        }
        parsed
    }
}

/// Decode a `parameter` resource object into EDR parameter metadata.
pub fn parameter_from_raw(item: &RawItem) -> Parameter {
    let attributes = item.attributes();
    let attr = |key: &str| attributes.and_then(|a| a.get(key)).and_then(value_to_string);

    let id = attr("_id").unwrap_or_else(|| item.local_id().to_string());
    let label = attr("parameterName").unwrap_or_else(|| id.clone());

    let mut parameter = Parameter::new(id, label);
    if let Some(description) = attr("parameterDescription") {
        parameter = parameter.with_description(description);
    }
    if let Some(unit) = attr("parameterUnit") {
        parameter = parameter.with_unit_symbol(unit);
    }
    parameter
}

/// Remove duplicates, keeping first occurrences in order.
pub(crate) fn dedupe<I: IntoIterator<Item = String>>(ids: I) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(body: Value) -> RawItem {
        RawItem {
            id: body["id"].as_str().unwrap().to_string(),
            body,
        }
    }

    #[test]
    fn test_location_from_raw() {
        let item = raw(json!({
            "id": "/rise/api/location/6902",
            "type": "Location",
            "attributes": {
                "_id": 6902,
                "locationName": "Lake Mead",
                "locationCoordinates": {"type": "Point", "coordinates": [-114.737, 36.016]},
                "elevation": "372.5",
                "updateDate": "2024-03-29T15:49:57+00:00"
            },
            "relationships": {
                "catalogItems": {"data": [
                    {"id": "/rise/api/catalog-item/128562", "type": "CatalogItem"},
                    {"id": "/rise/api/catalog-item/128563", "type": "CatalogItem"},
                    {"id": "/rise/api/catalog-item/128562", "type": "CatalogItem"}
                ]}
            }
        }));

        let location = Location::from_raw(&item);
        assert_eq!(location.id, "6902");
        assert_eq!(location.name, "Lake Mead");
        assert_eq!(location.elevation, Some(372.5));
        assert_eq!(location.catalog_items, vec!["128562", "128563"]);
        assert!(location.updated.is_some());
        assert!(location.parameter_names.is_empty());
    }

    #[test]
    fn test_location_without_relationships() {
        let item = raw(json!({
            "id": "/rise/api/location/5315",
            "attributes": {"_id": 5315, "locationName": "No items", "elevation": null}
        }));

        let location = Location::from_raw(&item);
        assert!(location.catalog_items.is_empty());
        assert!(location.elevation.is_none());
        assert!(location.geometry.is_none());
    }

    #[test]
    fn test_location_bad_geometry_is_dropped() {
        let item = raw(json!({
            "id": "/rise/api/location/1",
            "attributes": {"locationCoordinates": {"type": "GeometryCollection", "geometries": []}},
            "relationships": {"catalogItems": {"data": []}}
        }));

        let location = Location::from_raw(&item);
        assert_eq!(location.id, "1");
        assert_eq!(location.name, "1");
        assert!(location.geometry.is_none());
    }

    #[test]
    fn test_location_to_feature() {
        let item = raw(json!({
            "id": "/rise/api/location/6902",
            "attributes": {
                "_id": 6902,
                "locationName": "Lake Mead",
                "locationCoordinates": {"type": "Point", "coordinates": [-114.737, 36.016]},
                "updateDate": "2024-03-29T15:49:57+00:00"
            },
            "relationships": {"catalogItems": {"data": []}}
        }));
        let mut location = Location::from_raw(&item);
        location.parameter_names.insert("Lake/Reservoir Storage".to_string());

        let json = serde_json::to_value(location.to_feature()).unwrap();
        assert_eq!(json["id"], "6902");
        assert_eq!(json["properties"]["datetime"], "2024-03-29T15:49:57Z");
        assert_eq!(json["properties"]["parameter-name"][0], "Lake/Reservoir Storage");
    }

    #[test]
    fn test_catalog_item_from_raw() {
        let item = raw(json!({
            "id": "/rise/api/catalog-item/128562",
            "attributes": {"parameterName": "Lake/Reservoir Storage", "parameterId": 3},
            "relationships": {"catalogRecord": {"data": {"id": "/rise/api/catalog-record/9"}}}
        }));

        let catalog_item = CatalogItem::from_raw(&item);
        assert_eq!(catalog_item.id, "128562");
        assert_eq!(catalog_item.parameter_name.as_deref(), Some("Lake/Reservoir Storage"));
        assert_eq!(catalog_item.parameter_id.as_deref(), Some("3"));
        assert_eq!(catalog_item.catalog_record.as_deref(), Some("9"));
    }

    #[test]
    fn test_catalog_item_without_parameter() {
        let item = raw(json!({"id": "/rise/api/catalog-item/1", "attributes": {"parameterName": null}}));
        let catalog_item = CatalogItem::from_raw(&item);

        assert!(catalog_item.parameter_name.is_none());
        assert!(catalog_item.parameter_id.is_none());
    }

    #[test]
    fn test_parameter_from_raw() {
        let item = raw(json!({
            "id": "/rise/api/parameter/3",
            "attributes": {
                "_id": 3,
                "parameterName": "Lake/Reservoir Storage",
                "parameterDescription": "Storage volume",
                "parameterUnit": "af"
            }
        }));

        let parameter = parameter_from_raw(&item);
        assert_eq!(parameter.id.as_deref(), Some("3"));
        assert_eq!(parameter.label.as_deref(), Some("Lake/Reservoir Storage"));
        assert_eq!(parameter.unit.and_then(|u| u.symbol).as_deref(), Some("af"));
    }

    #[test]
    fn test_dedupe_keeps_first_order() {
        let ids = dedupe(["b", "a", "b", "c", "a"].map(String::from));
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
