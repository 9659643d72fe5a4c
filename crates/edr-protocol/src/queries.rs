//! Query parameter parsing for EDR endpoints.
//!
//! This module handles parsing and validation of the query parameters
//! accepted by the locations endpoint (`bbox`, `datetime`, `z`,
//! `parameter-name`) and evaluation of the parsed predicates against
//! location attributes.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing query parameters.
#[derive(Debug, Error, PartialEq)]
pub enum CoordinateParseError {
    /// Malformed parameter value.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Invalid coordinate value.
    #[error("Invalid coordinate value: {0}")]
    InvalidCoordinate(String),

    /// Coordinate out of valid range.
    #[error("Coordinate out of range: {0}")]
    OutOfRange(String),
}

fn validate_coordinates(lon: f64, lat: f64) -> Result<(), CoordinateParseError> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(CoordinateParseError::OutOfRange(format!(
            "Longitude {} is out of range [-180, 180]",
            lon
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(CoordinateParseError::OutOfRange(format!(
            "Latitude {} is out of range [-90, 90]",
            lat
        )));
    }

    Ok(())
}

fn parse_number(s: &str) -> Result<f64, CoordinateParseError> {
    s.trim()
        .parse()
        .map_err(|_| CoordinateParseError::InvalidCoordinate(s.to_string()))
}

/// Parse the `parameter-name` query parameter.
///
/// EDR allows a comma-separated list; empty entries are dropped.
pub fn parse_parameter_names(param: &str) -> Vec<String> {
    param
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Datetime query specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DateTimeQuery {
    /// A specific instant, or a partial date (`2019-10`) matched by prefix.
    Instant(String),

    /// Multiple specific instants (comma-separated list).
    List(Vec<String>),

    /// An interval with start and end. `None` is an open bound.
    Interval {
        start: Option<String>,
        end: Option<String>,
    },
}

impl DateTimeQuery {
    /// Validate that a datetime string is a valid ISO 8601 format.
    fn validate_datetime(dt: &str) -> Result<(), CoordinateParseError> {
        // Allow ".." for open intervals
        if dt == ".." {
            return Ok(());
        }

        if parse_timestamp(dt).is_some() || is_partial_date(dt) {
            return Ok(());
        }

        Err(CoordinateParseError::InvalidFormat(format!(
            "Invalid datetime format '{}'. Expected ISO 8601 format (e.g., 2024-12-29T12:00:00Z)",
            dt
        )))
    }

    /// Parse a datetime parameter.
    ///
    /// Accepts formats:
    /// - Instant: `2024-12-29T12:00:00Z`
    /// - Partial date: `2024-12-29`, `2024-12`, `2024`
    /// - List: `2024-12-29T12:00:00Z,2024-12-29T13:00:00Z`
    /// - Interval: `2024-12-29T00:00:00Z/2024-12-29T23:59:59Z`
    /// - Open start: `../2024-12-29T23:59:59Z`
    /// - Open end: `2024-12-29T00:00:00Z/..`
    pub fn parse(datetime: &str) -> Result<Self, CoordinateParseError> {
        let datetime = datetime.trim();

        // Check for interval format first (contains / but not as part of a comma list)
        if datetime.contains('/') && !datetime.contains(',') {
            let parts: Vec<&str> = datetime.split('/').collect();
            if parts.len() != 2 {
                return Err(CoordinateParseError::InvalidFormat(
                    "Invalid datetime interval format".to_string(),
                ));
            }

            let start = Self::parse_bound(parts[0])?;
            let end = Self::parse_bound(parts[1])?;

            if let (Some(s), Some(e)) = (&start, &end) {
                let (s_ts, e_ts) = (interval_bound(s), interval_bound(e));
                if let (Some(s_ts), Some(e_ts)) = (s_ts, e_ts) {
                    if s_ts > e_ts {
                        return Err(CoordinateParseError::OutOfRange(format!(
                            "Start date must be before end date but got {} and {}",
                            s, e
                        )));
                    }
                }
            }

            return Ok(DateTimeQuery::Interval { start, end });
        }

        // Check for comma-separated list
        if datetime.contains(',') {
            let mut times: Vec<String> = datetime
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            for t in &times {
                Self::validate_datetime(t)?;
            }

            return match times.len() {
                0 => Err(CoordinateParseError::InvalidFormat(
                    "Empty datetime list".to_string(),
                )),
                1 => Ok(DateTimeQuery::Instant(times.remove(0))),
                _ => Ok(DateTimeQuery::List(times)),
            };
        }

        if datetime.is_empty() || datetime == ".." {
            return Err(CoordinateParseError::InvalidFormat(
                "Expected a datetime instant or interval".to_string(),
            ));
        }

        Self::validate_datetime(datetime)?;
        Ok(DateTimeQuery::Instant(datetime.to_string()))
    }

    fn parse_bound(part: &str) -> Result<Option<String>, CoordinateParseError> {
        let part = part.trim();
        if part == ".." || part.is_empty() {
            return Ok(None);
        }
        if interval_bound(part).is_none() {
            return Err(CoordinateParseError::InvalidFormat(format!(
                "Invalid interval bound '{}'. Expected ISO 8601 datetime or date",
                part
            )));
        }
        Ok(Some(part.to_string()))
    }

    /// Check whether a timestamp satisfies this query.
    ///
    /// Interval bounds are inclusive. Full instants compare for equality;
    /// partial dates match by prefix of the timestamp as written in its own
    /// offset, so `2019-10` matches `2019-10-31T20:00:00-07:00` even though
    /// that instant falls in November UTC.
    pub fn matches(&self, timestamp: &DateTime<FixedOffset>) -> bool {
        match self {
            DateTimeQuery::Instant(s) => instant_matches(s, timestamp),
            DateTimeQuery::List(list) => list.iter().any(|s| instant_matches(s, timestamp)),
            DateTimeQuery::Interval { start, end } => {
                let timestamp = timestamp.with_timezone(&Utc);
                let after_start = start
                    .as_deref()
                    .and_then(interval_bound)
                    .map_or(true, |s| timestamp >= s);
                let before_end = end
                    .as_deref()
                    .and_then(interval_bound)
                    .map_or(true, |e| timestamp <= e);
                after_start && before_end
            }
        }
    }
}

/// Parse a full timestamp, keeping the offset it was written in.
///
/// Seconds may be omitted (`2019-10-31T20:00-07:00`). Naive datetimes are
/// taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive).into())
}

fn interval_bound(s: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(s).map(|dt| dt.with_timezone(&Utc)).or_else(|| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

fn is_partial_date(s: &str) -> bool {
    match s.len() {
        4 => s.chars().all(|c| c.is_ascii_digit()),
        7 => NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").is_ok(),
        10 => NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        _ => false,
    }
}

fn instant_matches(instant: &str, timestamp: &DateTime<FixedOffset>) -> bool {
    match parse_timestamp(instant) {
        Some(expected) => expected == *timestamp,
        None => timestamp
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
            .starts_with(instant),
    }
}

/// Bounding box query parameters.
///
/// A 6-value bbox (`minx,miny,minz,maxx,maxy,maxz`) also carries a
/// vertical range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BboxQuery {
    /// Western longitude.
    pub west: f64,

    /// Southern latitude.
    pub south: f64,

    /// Eastern longitude.
    pub east: f64,

    /// Northern latitude.
    pub north: f64,

    /// Vertical range from a 6-value bbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_range: Option<(f64, f64)>,
}

impl BboxQuery {
    /// Create a 2D bbox.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
            z_range: None,
        }
    }

    /// Parse a bbox parameter.
    ///
    /// Format: `west,south,east,north` or `west,south,minz,east,north,maxz`
    pub fn parse(bbox: &str) -> Result<Self, CoordinateParseError> {
        let parts: Vec<&str> = bbox.split(',').collect();

        let (west, south, east, north, z_range) = match parts.len() {
            4 => (
                parse_number(parts[0])?,
                parse_number(parts[1])?,
                parse_number(parts[2])?,
                parse_number(parts[3])?,
                None,
            ),
            6 => {
                let min_z = parse_number(parts[2])?;
                let max_z = parse_number(parts[5])?;
                if min_z > max_z {
                    return Err(CoordinateParseError::OutOfRange(
                        "Minimum z must be less than or equal to maximum z".to_string(),
                    ));
                }
                (
                    parse_number(parts[0])?,
                    parse_number(parts[1])?,
                    parse_number(parts[3])?,
                    parse_number(parts[4])?,
                    Some((min_z, max_z)),
                )
            }
            n => {
                return Err(CoordinateParseError::InvalidFormat(format!(
                    "Expected 4 or 6 values for bbox, got {}",
                    n
                )))
            }
        };

        validate_coordinates(west, south)?;
        validate_coordinates(east, north)?;

        if south > north {
            return Err(CoordinateParseError::OutOfRange(
                "South must be less than or equal to north".to_string(),
            ));
        }

        Ok(BboxQuery {
            west,
            south,
            east,
            north,
            z_range,
        })
    }

    /// Check if a point lies inside the bbox (edges inclusive).
    ///
    /// A bbox with west > east crosses the antimeridian.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.west <= self.east {
            lon >= self.west && lon <= self.east
        } else {
            lon >= self.west || lon <= self.east
        }
    }

    /// Check if every vertex of a ring lies inside the bbox.
    pub fn contains_ring(&self, ring: &[(f64, f64)]) -> bool {
        !ring.is_empty() && ring.iter().all(|(lon, lat)| self.contains_point(*lon, *lat))
    }
}

/// Parsed `z` (vertical level) parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ZQuery {
    /// A single level.
    Single(f64),
    /// Every level between two values (inclusive).
    Range(f64, f64),
    /// An enumerated list of levels.
    List(Vec<f64>),
}

impl ZQuery {
    /// Parse vertical level parameter.
    ///
    /// Accepts formats:
    /// - Single value: `850`
    /// - Multiple values: `850,700,500`
    /// - Range: `250/1000` (from/to)
    /// - Recurring intervals: `R5/100/50` (R{count}/{start}/{increment})
    pub fn parse(z_param: &str) -> Result<Self, CoordinateParseError> {
        let z_param = z_param.trim();

        if z_param.starts_with('R') || z_param.starts_with('r') {
            return Self::parse_recurring(&z_param[1..]);
        }

        if z_param.contains('/') {
            let parts: Vec<&str> = z_param.split('/').collect();
            if parts.len() != 2 {
                return Err(CoordinateParseError::InvalidFormat(
                    "Invalid z range format, expected from/to".to_string(),
                ));
            }

            let from = parse_number(parts[0])?;
            let to = parse_number(parts[1])?;
            return Ok(ZQuery::Range(from.min(to), from.max(to)));
        }

        if z_param.contains(',') {
            let values: Result<Vec<f64>, _> = z_param.split(',').map(parse_number).collect();
            return Ok(ZQuery::List(values?));
        }

        Ok(ZQuery::Single(parse_number(z_param)?))
    }

    /// Parse recurring z interval format: {count}/{start}/{increment}
    /// Example: "5/100/50" -> [100, 150, 200, 250, 300]
    fn parse_recurring(s: &str) -> Result<Self, CoordinateParseError> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 3 {
            return Err(CoordinateParseError::InvalidFormat(
                "Invalid recurring z format, expected R{count}/{start}/{increment}".to_string(),
            ));
        }

        let count: usize = parts[0]
            .trim()
            .parse()
            .map_err(|_| CoordinateParseError::InvalidCoordinate(parts[0].to_string()))?;
        let start = parse_number(parts[1])?;
        let increment = parse_number(parts[2])?;

        if count == 0 || count > 100 {
            return Err(CoordinateParseError::OutOfRange(
                "Recurring count must be between 1 and 100".to_string(),
            ));
        }

        let levels = (0..count).map(|i| start + i as f64 * increment).collect();
        Ok(ZQuery::List(levels))
    }

    /// Check whether an elevation satisfies this query.
    ///
    /// The elevation is truncated to whole units first, so `372.5` is at
    /// level `372`.
    pub fn matches(&self, elevation: f64) -> bool {
        let elevation = elevation.trunc();
        match self {
            ZQuery::Single(z) => elevation == *z,
            ZQuery::Range(lo, hi) => elevation >= *lo && elevation <= *hi,
            ZQuery::List(levels) => levels.iter().any(|z| elevation == *z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_parse_parameter_names() {
        let names = parse_parameter_names("Streamflow, Lake/Reservoir Storage,,");
        assert_eq!(names, vec!["Streamflow", "Lake/Reservoir Storage"]);
    }

    #[test]
    fn test_parse_parameter_names_empty() {
        assert!(parse_parameter_names(" , ").is_empty());
    }

    #[test]
    fn test_parse_bbox() {
        let bbox = BboxQuery::parse("-125.0,24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.west, -125.0);
        assert_eq!(bbox.south, 24.0);
        assert_eq!(bbox.east, -66.0);
        assert_eq!(bbox.north, 50.0);
        assert!(bbox.z_range.is_none());
    }

    #[test]
    fn test_parse_bbox_with_z() {
        let bbox = BboxQuery::parse("-125,24,100,-66,50,2000").unwrap();
        assert_eq!(bbox.east, -66.0);
        assert_eq!(bbox.z_range, Some((100.0, 2000.0)));
    }

    #[test]
    fn test_parse_bbox_wrong_count() {
        let result = BboxQuery::parse("1,2,3");
        assert!(matches!(result, Err(CoordinateParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_bbox_invalid_number() {
        let result = BboxQuery::parse("a,2,3,4");
        assert!(matches!(
            result,
            Err(CoordinateParseError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn test_parse_bbox_south_above_north() {
        let result = BboxQuery::parse("-100,50,-90,40");
        assert!(matches!(result, Err(CoordinateParseError::OutOfRange(_))));
    }

    #[test]
    fn test_parse_bbox_out_of_range() {
        let result = BboxQuery::parse("-200,0,10,10");
        assert!(matches!(result, Err(CoordinateParseError::OutOfRange(_))));
    }

    #[test]
    fn test_bbox_contains_point() {
        let bbox = BboxQuery::new(-120.0, 30.0, -100.0, 45.0);
        assert!(bbox.contains_point(-110.0, 40.0));
        assert!(bbox.contains_point(-120.0, 30.0));
        assert!(!bbox.contains_point(-90.0, 40.0));
        assert!(!bbox.contains_point(-110.0, 50.0));
    }

    #[test]
    fn test_bbox_contains_point_antimeridian() {
        let bbox = BboxQuery::new(170.0, -10.0, -170.0, 10.0);
        assert!(bbox.contains_point(175.0, 0.0));
        assert!(bbox.contains_point(-175.0, 0.0));
        assert!(!bbox.contains_point(0.0, 0.0));
    }

    #[test]
    fn test_bbox_contains_ring() {
        let bbox = BboxQuery::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.contains_ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)]));
        assert!(!bbox.contains_ring(&[(1.0, 1.0), (20.0, 1.0), (2.0, 2.0)]));
        assert!(!bbox.contains_ring(&[]));
    }

    #[test]
    fn test_parse_z_single() {
        assert_eq!(ZQuery::parse("850").unwrap(), ZQuery::Single(850.0));
    }

    #[test]
    fn test_parse_z_multiple() {
        assert_eq!(
            ZQuery::parse("850,700,500").unwrap(),
            ZQuery::List(vec![850.0, 700.0, 500.0])
        );
    }

    #[test]
    fn test_parse_z_range_normalizes_order() {
        assert_eq!(ZQuery::parse("1000/250").unwrap(), ZQuery::Range(250.0, 1000.0));
    }

    #[test]
    fn test_parse_z_recurring() {
        assert_eq!(
            ZQuery::parse("R3/100/50").unwrap(),
            ZQuery::List(vec![100.0, 150.0, 200.0])
        );
    }

    #[test]
    fn test_parse_z_recurring_bad_count() {
        let result = ZQuery::parse("R0/100/50");
        assert!(matches!(result, Err(CoordinateParseError::OutOfRange(_))));
    }

    #[test]
    fn test_parse_z_invalid() {
        let result = ZQuery::parse("abc");
        assert!(matches!(
            result,
            Err(CoordinateParseError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn test_z_matches() {
        assert!(ZQuery::Single(1200.0).matches(1200.0));
        assert!(!ZQuery::Single(1200.0).matches(1201.0));
        assert!(ZQuery::Range(100.0, 200.0).matches(150.0));
        assert!(!ZQuery::Range(100.0, 200.0).matches(250.0));
        assert!(ZQuery::List(vec![1.0, 2.0]).matches(2.0));
    }

    #[test]
    fn test_z_matches_truncated_elevation() {
        assert!(ZQuery::Single(372.0).matches(372.5));
        assert!(!ZQuery::Single(373.0).matches(372.9));
        assert!(ZQuery::Range(100.0, 200.0).matches(200.9));
        assert!(ZQuery::List(vec![137.0]).matches(137.2));
    }

    #[test]
    fn test_parse_datetime_instant() {
        let dt = DateTimeQuery::parse("2024-03-29T15:49:57+00:00").unwrap();
        assert_eq!(dt, DateTimeQuery::Instant("2024-03-29T15:49:57+00:00".to_string()));
    }

    #[test]
    fn test_parse_datetime_partial_dates() {
        assert!(DateTimeQuery::parse("2019-10").is_ok());
        assert!(DateTimeQuery::parse("2019-10-01").is_ok());
        assert!(DateTimeQuery::parse("2019").is_ok());
        assert!(DateTimeQuery::parse("2019-13").is_err());
    }

    #[test]
    fn test_parse_datetime_interval() {
        let dt = DateTimeQuery::parse("2024-01-01T00:00:00Z/2024-12-31T23:59:59Z").unwrap();
        assert_eq!(
            dt,
            DateTimeQuery::Interval {
                start: Some("2024-01-01T00:00:00Z".to_string()),
                end: Some("2024-12-31T23:59:59Z".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_datetime_open_interval() {
        let dt = DateTimeQuery::parse("2024-01-01T00:00:00Z/..").unwrap();
        assert!(matches!(dt, DateTimeQuery::Interval { start: Some(_), end: None }));

        let dt = DateTimeQuery::parse("../2024-01-01").unwrap();
        assert!(matches!(dt, DateTimeQuery::Interval { start: None, end: Some(_) }));
    }

    #[test]
    fn test_parse_datetime_reversed_interval() {
        let result = DateTimeQuery::parse("2024-12-31T00:00:00Z/2024-01-01T00:00:00Z");
        assert!(matches!(result, Err(CoordinateParseError::OutOfRange(_))));
    }

    #[test]
    fn test_parse_datetime_list() {
        let dt = DateTimeQuery::parse("2024-01-01T00:00:00Z,2024-01-02T00:00:00Z").unwrap();
        assert!(matches!(dt, DateTimeQuery::List(ref v) if v.len() == 2));
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(DateTimeQuery::parse("yesterday").is_err());
        assert!(DateTimeQuery::parse("").is_err());
        assert!(DateTimeQuery::parse("2024-01-01/tomorrow").is_err());
    }

    #[test]
    fn test_datetime_matches_interval() {
        let dt = DateTimeQuery::parse("2024-01-01T00:00:00Z/2024-06-30T00:00:00Z").unwrap();
        assert!(dt.matches(&ts("2024-03-29T15:49:57+00:00")));
        assert!(dt.matches(&ts("2024-01-01T00:00:00Z")));
        assert!(!dt.matches(&ts("2024-07-01T00:00:00Z")));
    }

    #[test]
    fn test_datetime_matches_open_interval() {
        let dt = DateTimeQuery::parse("../2020-01-01").unwrap();
        assert!(dt.matches(&ts("2019-05-01T00:00:00Z")));
        assert!(!dt.matches(&ts("2021-05-01T00:00:00Z")));
    }

    #[test]
    fn test_datetime_matches_instant() {
        let dt = DateTimeQuery::parse("2024-03-29T15:49:57Z").unwrap();
        assert!(dt.matches(&ts("2024-03-29T15:49:57+00:00")));
        assert!(!dt.matches(&ts("2024-03-29T15:49:58+00:00")));
    }

    #[test]
    fn test_datetime_matches_partial_prefix() {
        let dt = DateTimeQuery::parse("2019-10").unwrap();
        assert!(dt.matches(&ts("2019-10-17T08:00:00Z")));
        assert!(!dt.matches(&ts("2019-11-01T00:00:00Z")));
    }

    #[test]
    fn test_datetime_partial_prefix_uses_source_offset() {
        // 03:00 on 1 November in UTC.
        let updated = ts("2019-10-31T20:00-07:00");

        assert!(DateTimeQuery::parse("2019-10").unwrap().matches(&updated));
        assert!(DateTimeQuery::parse("2019-10-31").unwrap().matches(&updated));
        assert!(!DateTimeQuery::parse("2019-11").unwrap().matches(&updated));
        assert!(DateTimeQuery::parse("2019-10-31T20:00:00-07:00").unwrap().matches(&updated));
    }

    #[test]
    fn test_parse_datetime_error_message() {
        let err = DateTimeQuery::parse("a/b/c").unwrap_err();
        assert_eq!(err.to_string(), "Invalid format: Invalid datetime interval format");
    }

    #[test]
    fn test_datetime_matches_list() {
        let dt = DateTimeQuery::parse("2019-10,2020-02").unwrap();
        assert!(dt.matches(&ts("2020-02-03T00:00:00Z")));
        assert!(!dt.matches(&ts("2020-03-03T00:00:00Z")));
    }
}
