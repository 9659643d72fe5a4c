//! EDR Locations types.
//!
//! Locations are monitored points or areas (reservoirs, gauges, dams)
//! returned by the locations endpoint as a GeoJSON FeatureCollection.
//! Each feature lists the parameters measured there under `parameter-name`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::queries::BboxQuery;

/// GeoJSON geometry of a location.
///
/// Positions are `[longitude, latitude]` with an optional third elevation
/// value, which is ignored for containment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Vec<f64>),
    LineString(Vec<Vec<f64>>),
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

impl Geometry {
    /// Create a point geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point(vec![lon, lat])
    }

    /// All positions of the geometry as (lon, lat) pairs.
    ///
    /// Positions with fewer than two ordinates are skipped.
    pub fn positions(&self) -> Vec<(f64, f64)> {
        fn pair(p: &[f64]) -> Option<(f64, f64)> {
            match p {
                [lon, lat, ..] => Some((*lon, *lat)),
                _ => None,
            }
        }

        match self {
            Geometry::Point(p) => pair(p).into_iter().collect(),
            Geometry::LineString(line) => line.iter().filter_map(|p| pair(p)).collect(),
            Geometry::Polygon(rings) => rings.iter().flatten().filter_map(|p| pair(p)).collect(),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .flatten()
                .filter_map(|p| pair(p))
                .collect(),
        }
    }

    /// Check if the whole geometry lies inside a bbox.
    pub fn within(&self, bbox: &BboxQuery) -> bool {
        bbox.contains_ring(&self.positions())
    }
}

/// GeoJSON Feature representation of a location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationFeature {
    /// Always "Feature".
    #[serde(rename = "type")]
    pub feature_type: String,

    /// The location ID.
    pub id: String,

    /// Location geometry; `null` when the upstream has none.
    pub geometry: Option<Geometry>,

    /// Feature properties.
    pub properties: LocationProperties,
}

impl LocationFeature {
    /// Create a feature with the given id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>, geometry: Option<Geometry>) -> Self {
        Self {
            feature_type: "Feature".to_string(),
            id: id.into(),
            geometry,
            properties: LocationProperties {
                name: name.into(),
                description: None,
                elevation: None,
                datetime: None,
                parameter_names: Vec::new(),
                extra: BTreeMap::new(),
            },
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.properties.description = Some(description.into());
        self
    }

    /// Set the elevation.
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.properties.elevation = Some(elevation);
        self
    }

    /// Set the datetime property.
    pub fn with_datetime(mut self, datetime: impl Into<String>) -> Self {
        self.properties.datetime = Some(datetime.into());
        self
    }

    /// Set the parameter names measured at this location.
    pub fn with_parameter_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties.parameter_names = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Properties for a location feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationProperties {
    /// Human-readable name.
    pub name: String,

    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Elevation of the location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,

    /// Last update time of the location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Parameters measured at this location.
    #[serde(rename = "parameter-name", default)]
    pub parameter_names: Vec<String>,

    /// Additional properties.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// GeoJSON FeatureCollection of locations.
///
/// Returned by GET /collections/{collectionId}/locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationFeatureCollection {
    /// Always "FeatureCollection".
    #[serde(rename = "type")]
    pub collection_type: String,

    /// The location features.
    pub features: Vec<LocationFeature>,

    /// Number of features.
    #[serde(rename = "numberReturned", skip_serializing_if = "Option::is_none")]
    pub number_returned: Option<usize>,
}

impl LocationFeatureCollection {
    /// Create a new feature collection from features.
    pub fn from_features(features: Vec<LocationFeature>) -> Self {
        let count = features.len();

        Self {
            collection_type: "FeatureCollection".to_string(),
            features,
            number_returned: Some(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_deserialize_point() {
        let json = r#"{"type":"Point","coordinates":[-114.737,36.016,372.5]}"#;
        let geom: Geometry = serde_json::from_str(json).unwrap();

        assert_eq!(geom.positions(), vec![(-114.737, 36.016)]);
    }

    #[test]
    fn test_geometry_deserialize_polygon() {
        let json = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#;
        let geom: Geometry = serde_json::from_str(json).unwrap();

        assert_eq!(geom.positions().len(), 4);
        assert!(geom.within(&BboxQuery::new(-1.0, -1.0, 2.0, 2.0)));
        assert!(!geom.within(&BboxQuery::new(0.5, -1.0, 2.0, 2.0)));
    }

    #[test]
    fn test_geometry_unknown_type_rejected() {
        let json = r#"{"type":"Circle","coordinates":[0,0]}"#;
        assert!(serde_json::from_str::<Geometry>(json).is_err());
    }

    #[test]
    fn test_point_within_bbox() {
        let geom = Geometry::point(-114.7, 36.0);
        assert!(geom.within(&BboxQuery::new(-120.0, 30.0, -110.0, 40.0)));
        assert!(!geom.within(&BboxQuery::new(-110.0, 30.0, -100.0, 40.0)));
    }

    #[test]
    fn test_feature_serialization() {
        let feature = LocationFeature::new("6902", "Lake Mead", Some(Geometry::point(-114.7, 36.0)))
            .with_elevation(372.5)
            .with_parameter_names(["Lake/Reservoir Storage", "Lake/Reservoir Elevation"]);

        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["properties"]["name"], "Lake Mead");
        assert_eq!(json["properties"]["parameter-name"][1], "Lake/Reservoir Elevation");
        assert!(json["properties"].get("description").is_none());
    }

    #[test]
    fn test_feature_collection() {
        let features = vec![
            LocationFeature::new("1", "A", Some(Geometry::point(0.0, 0.0))),
            LocationFeature::new("2", "B", None),
        ];

        let fc = LocationFeatureCollection::from_features(features);

        assert_eq!(fc.collection_type, "FeatureCollection");
        assert_eq!(fc.features.len(), 2);
        assert_eq!(fc.number_returned, Some(2));

        let json = serde_json::to_value(&fc).unwrap();
        assert!(json["features"][1]["geometry"].is_null());
    }
}
