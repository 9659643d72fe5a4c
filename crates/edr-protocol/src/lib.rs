//! OGC API - Environmental Data Retrieval (EDR) Protocol
//!
//! Types and utilities for serving EDR location queries: parsing of the
//! `bbox`, `datetime`, `z` and `parameter-name` query parameters, GeoJSON
//! location features, parameter metadata and OGC exception documents.
//!
//! # Example
//!
//! ```rust
//! use edr_protocol::{parse_timestamp, BboxQuery, DateTimeQuery};
//!
//! let bbox = BboxQuery::parse("-120,30,-100,45").unwrap();
//! assert!(bbox.contains_point(-110.0, 40.0));
//!
//! let datetime = DateTimeQuery::parse("2024-01-01T00:00:00Z/..").unwrap();
//! let updated = parse_timestamp("2024-03-29T15:49:57+00:00").unwrap();
//! assert!(datetime.matches(&updated));
//! ```

pub mod errors;
pub mod locations;
pub mod parameters;
pub mod queries;
pub mod responses;

// Re-export commonly used types
pub use errors::EdrError;
pub use locations::{Geometry, LocationFeature, LocationFeatureCollection, LocationProperties};
pub use parameters::{I18nString, ObservedProperty, Parameter, Unit};
pub use queries::{
    parse_parameter_names, parse_timestamp, BboxQuery, CoordinateParseError, DateTimeQuery,
    ZQuery,
};
pub use responses::ExceptionResponse;
