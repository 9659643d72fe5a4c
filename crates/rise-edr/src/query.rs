//! Building location queries from raw EDR query parameters.

use edr_protocol::{parse_parameter_names, BboxQuery, DateTimeQuery, ZQuery};
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::filter::LocationPredicate;

/// Query parameters accepted by the locations endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LocationQueryParams {
    /// Parameter name(s) or id(s), comma-separated.
    #[serde(rename = "parameter-name")]
    pub parameter_name: Option<String>,

    /// `minx,miny,maxx,maxy` or `minx,miny,minz,maxx,maxy,maxz`.
    pub bbox: Option<String>,

    /// Datetime instant, list or interval.
    pub datetime: Option<String>,

    /// Vertical level(s).
    pub z: Option<String>,

    /// Maximum number of locations returned.
    pub limit: Option<String>,

    /// Number of matching locations skipped.
    pub offset: Option<String>,
}

/// A validated location query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQuery {
    pub predicate: LocationPredicate,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl LocationQuery {
    /// Query for locations measuring any of `names`.
    pub fn by_parameter<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            predicate: LocationPredicate {
                parameter_names: names.into_iter().map(Into::into).collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse and validate raw parameters. Empty values count as absent.
    pub fn from_params(params: &LocationQueryParams) -> Result<Self> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let predicate = LocationPredicate {
            bbox: present(&params.bbox)
                .map(|b| BboxQuery::parse(&b))
                .transpose()?,
            datetime: present(&params.datetime)
                .map(|d| DateTimeQuery::parse(&d))
                .transpose()?,
            z: present(&params.z).map(|z| ZQuery::parse(&z)).transpose()?,
            parameter_names: present(&params.parameter_name)
                .map(|p| parse_parameter_names(&p))
                .unwrap_or_default(),
        };

        let limit = present(&params.limit)
            .map(|l| parse_count("limit", &l))
            .transpose()?;
        let offset = present(&params.offset)
            .map(|o| parse_count("offset", &o))
            .transpose()?
            .unwrap_or(0);

        Ok(Self {
            predicate,
            limit,
            offset,
        })
    }

    /// Apply offset, then limit.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let page = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        }
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| QueryError::invalid(format!("{} must be a non-negative integer, got '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_params() {
        let params = LocationQueryParams {
            parameter_name: Some("Streamflow,Lake/Reservoir Storage".to_string()),
            bbox: Some("-120,30,-100,45".to_string()),
            datetime: Some("2024-01-01/..".to_string()),
            z: Some("R3/1000/100".to_string()),
            limit: Some("10".to_string()),
            offset: Some("5".to_string()),
        };

        let query = LocationQuery::from_params(&params).unwrap();
        assert_eq!(query.predicate.parameter_names.len(), 2);
        assert!(query.predicate.bbox.is_some());
        assert!(query.predicate.datetime.as_ref().unwrap().has_open_end());
        assert_eq!(query.predicate.z, Some(ZQuery::List(vec![1000.0, 1100.0, 1200.0])));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, 5);
    }

    #[test]
    fn test_empty_params_are_absent() {
        let params = LocationQueryParams {
            parameter_name: Some("".to_string()),
            bbox: Some("  ".to_string()),
            ..Default::default()
        };

        let query = LocationQuery::from_params(&params).unwrap();
        assert_eq!(query, LocationQuery::default());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad_bbox = LocationQueryParams {
            bbox: Some("1,2,3".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            LocationQuery::from_params(&bad_bbox),
            Err(QueryError::InvalidQuery(_))
        ));

        let reversed = LocationQueryParams {
            datetime: Some("2024-12-31/2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(LocationQuery::from_params(&reversed).is_err());

        let negative = LocationQueryParams {
            limit: Some("-1".to_string()),
            ..Default::default()
        };
        assert!(LocationQuery::from_params(&negative).is_err());
    }

    #[test]
    fn test_params_deserialize_from_query_names() {
        let params: LocationQueryParams =
            serde_json::from_str(r#"{"parameter-name": "flow", "limit": "2"}"#).unwrap();
        assert_eq!(params.parameter_name.as_deref(), Some("flow"));
        assert_eq!(params.limit.as_deref(), Some("2"));
    }

    #[test]
    fn test_paginate() {
        let query = LocationQuery {
            limit: Some(2),
            offset: 1,
            ..Default::default()
        };
        assert_eq!(query.paginate(vec![1, 2, 3, 4]), vec![2, 3]);

        let unlimited = LocationQuery {
            offset: 10,
            ..Default::default()
        };
        assert!(unlimited.paginate(vec![1, 2]).is_empty());
    }

    #[test]
    fn test_by_parameter() {
        let query = LocationQuery::by_parameter(["flow"]);
        assert!(query.predicate.needs_join());
        assert_eq!(query.offset, 0);
    }
}
