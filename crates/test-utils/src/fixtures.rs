//! Common test fixtures for RISE EDR tests.
//!
//! Builders for RISE JSON:API resource objects and response envelopes,
//! shaped like what `data.usbr.gov/rise/api` returns.

use serde_json::{json, Value};

/// Common bounding box definitions for testing, as (west, south, east, north).
pub mod bbox {
    /// Continental United States bounding box
    pub const CONUS: (f64, f64, f64, f64) = (-130.0, 20.0, -60.0, 55.0);

    /// Lower Colorado basin (Lake Mead, Lake Mohave, Lake Havasu)
    pub const LOWER_COLORADO: (f64, f64, f64, f64) = (-116.0, 32.0, -113.0, 37.0);

    /// Crosses antimeridian (Pacific-centric)
    pub const PACIFIC: (f64, f64, f64, f64) = (160.0, -50.0, -140.0, 50.0);
}

/// Common time values for testing.
pub mod time {
    /// A fixed reference time for tests.
    pub const REFERENCE_TIME: &str = "2024-03-29T15:49:57+00:00";

    /// An update date years before the reference time.
    pub const OLD_UPDATE: &str = "2019-10-17T08:00:00+00:00";
}

/// Common parameter names for testing.
pub mod parameters {
    pub const STORAGE: &str = "Lake/Reservoir Storage";
    pub const ELEVATION: &str = "Lake/Reservoir Elevation";
    pub const STREAMFLOW: &str = "Streamflow";
}

/// Builder for a `location` resource object.
#[derive(Debug, Clone)]
pub struct LocationFixture {
    id: u64,
    name: String,
    coordinates: Option<Value>,
    elevation: Option<String>,
    update_date: Option<String>,
    catalog_items: Option<Vec<String>>,
}

impl LocationFixture {
    /// A point location with no catalog items.
    pub fn new(id: u64, name: &str, lon: f64, lat: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            coordinates: Some(json!({"type": "Point", "coordinates": [lon, lat]})),
            elevation: None,
            update_date: Some(time::REFERENCE_TIME.to_string()),
            catalog_items: Some(Vec::new()),
        }
    }

    /// Reference catalog items by local id.
    pub fn catalog_items(mut self, ids: &[&str]) -> Self {
        self.catalog_items = Some(ids.iter().map(|id| id.to_string()).collect());
        self
    }

    /// Drop the `catalogItems` relationship entirely.
    pub fn without_relationships(mut self) -> Self {
        self.catalog_items = None;
        self
    }

    /// Elevation, sent as a string the way RISE does.
    pub fn elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation.to_string());
        self
    }

    pub fn updated(mut self, update_date: &str) -> Self {
        self.update_date = Some(update_date.to_string());
        self
    }

    pub fn polygon(mut self, ring: &[(f64, f64)]) -> Self {
        let ring: Vec<[f64; 2]> = ring.iter().map(|(lon, lat)| [*lon, *lat]).collect();
        self.coordinates = Some(json!({"type": "Polygon", "coordinates": [ring]}));
        self
    }

    pub fn without_geometry(mut self) -> Self {
        self.coordinates = None;
        self
    }

    pub fn to_json(&self) -> Value {
        let mut resource = json!({
            "id": format!("/rise/api/location/{}", self.id),
            "type": "Location",
            "attributes": {
                "_id": self.id,
                "locationName": self.name,
                "locationCoordinates": self.coordinates,
                "elevation": self.elevation,
                "updateDate": self.update_date,
            }
        });

        if let Some(items) = &self.catalog_items {
            let data: Vec<Value> = items
                .iter()
                .map(|id| json!({"id": format!("/rise/api/catalog-item/{}", id), "type": "CatalogItem"}))
                .collect();
            resource["relationships"] = json!({"catalogItems": {"data": data}});
        }

        resource
    }
}

/// A `catalog-item` resource object, optionally tied to a parameter.
pub fn catalog_item(id: &str, parameter: Option<(&str, &str)>) -> Value {
    let (parameter_id, parameter_name) = match parameter {
        Some((pid, name)) => (json!(pid), json!(name)),
        None => (Value::Null, Value::Null),
    };

    json!({
        "id": format!("/rise/api/catalog-item/{}", id),
        "type": "CatalogItem",
        "attributes": {
            "_id": id,
            "parameterId": parameter_id,
            "parameterName": parameter_name,
        },
        "relationships": {
            "catalogRecord": {"data": {"id": "/rise/api/catalog-record/1", "type": "CatalogRecord"}}
        }
    })
}

/// A `parameter` resource object.
pub fn parameter(id: u64, name: &str, unit: &str) -> Value {
    json!({
        "id": format!("/rise/api/parameter/{}", id),
        "type": "Parameter",
        "attributes": {
            "_id": id,
            "parameterName": name,
            "parameterDescription": format!("{} measured at the site", name),
            "parameterUnit": unit,
        }
    })
}

/// A collection page envelope.
///
/// `total_items` of `None` omits `totalItems`, leaving `links.next` as the
/// only way to find further pages.
pub fn page_body(
    collection: &str,
    items: Vec<Value>,
    page_index: usize,
    page_size: usize,
    total_items: Option<usize>,
    has_next: bool,
) -> Value {
    let mut links = json!({
        "self": format!("/rise/api/{}?page={}&itemsPerPage={}", collection, page_index + 1, page_size)
    });
    if has_next {
        links["next"] = json!(format!(
            "/rise/api/{}?page={}&itemsPerPage={}",
            collection,
            page_index + 2,
            page_size
        ));
    }

    let mut meta = json!({"itemsPerPage": page_size, "currentPage": page_index + 1});
    if let Some(total) = total_items {
        meta["totalItems"] = json!(total);
    }

    json!({"links": links, "meta": meta, "data": items})
}

/// A single-item envelope.
pub fn item_body(item: Value) -> Value {
    json!({"data": item})
}

/// The error document RISE sends for internal failures.
pub fn error_body() -> Value {
    json!({
        "type": "https://tools.ietf.org/html/rfc2616#section-10",
        "title": "An error occurred",
        "detail": "Internal Server Error"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_fixture_shape() {
        let json = LocationFixture::new(6902, "Lake Mead", -114.737, 36.016)
            .catalog_items(&["128562"])
            .elevation(372.5)
            .to_json();

        assert_eq!(json["id"], "/rise/api/location/6902");
        assert_eq!(json["attributes"]["elevation"], "372.5");
        assert_eq!(
            json["relationships"]["catalogItems"]["data"][0]["id"],
            "/rise/api/catalog-item/128562"
        );
    }

    #[test]
    fn test_location_without_relationships() {
        let json = LocationFixture::new(5315, "Orphan", 0.0, 0.0)
            .without_relationships()
            .to_json();
        assert!(json.get("relationships").is_none());
    }

    #[test]
    fn test_page_body_links() {
        let body = page_body("location", vec![], 0, 100, Some(592), true);
        assert_eq!(body["meta"]["totalItems"], 592);
        assert_eq!(body["links"]["next"], "/rise/api/location?page=2&itemsPerPage=100");

        let body = page_body("location", vec![], 5, 100, None, false);
        assert!(body["meta"].get("totalItems").is_none());
        assert!(body["links"].get("next").is_none());
    }
}
