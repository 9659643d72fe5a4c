//! Location predicates.
//!
//! Pure evaluation of bbox, datetime, z and parameter-name constraints.
//! The checks are independent, so evaluation order never changes which
//! locations pass.

use edr_protocol::{BboxQuery, DateTimeQuery, ZQuery};

use crate::location::Location;

/// Constraints a location must satisfy to be returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationPredicate {
    pub bbox: Option<BboxQuery>,
    pub datetime: Option<DateTimeQuery>,
    pub z: Option<ZQuery>,
    /// Accepted parameter names or ids. Empty means no constraint.
    pub parameter_names: Vec<String>,
}

impl LocationPredicate {
    /// Whether the parameter constraint needs joined locations.
    pub fn needs_join(&self) -> bool {
        !self.parameter_names.is_empty()
    }

    /// The same predicate minus the parameter constraint.
    pub fn without_parameters(&self) -> Self {
        Self {
            parameter_names: Vec::new(),
            ..self.clone()
        }
    }

    pub fn matches(&self, location: &Location) -> bool {
        self.matches_bbox(location)
            && self.matches_datetime(location)
            && self.matches_z(location)
            && self.matches_parameters(location)
    }

    fn matches_bbox(&self, location: &Location) -> bool {
        let Some(bbox) = &self.bbox else {
            return true;
        };

        let inside = location
            .geometry
            .as_ref()
            .map_or(false, |geometry| geometry.within(bbox));

        let in_z_range = match bbox.z_range {
            Some((min_z, max_z)) => location
                .elevation
                .map_or(false, |z| z >= min_z && z <= max_z),
            None => true,
        };

        inside && in_z_range
    }

    fn matches_datetime(&self, location: &Location) -> bool {
        match &self.datetime {
            Some(datetime) => location
                .updated
                .as_ref()
                .map_or(false, |updated| datetime.matches(updated)),
            None => true,
        }
    }

    fn matches_z(&self, location: &Location) -> bool {
        match &self.z {
            Some(z) => location.elevation.map_or(false, |elevation| z.matches(elevation)),
            None => true,
        }
    }

    fn matches_parameters(&self, location: &Location) -> bool {
        if self.parameter_names.is_empty() {
            return true;
        }
        self.parameter_names.iter().any(|wanted| {
            location.parameter_names.contains(wanted) || location.parameter_ids.contains(wanted)
        })
    }
}

/// Keep the locations that satisfy `predicate`, preserving order.
pub fn apply(locations: Vec<Location>, predicate: &LocationPredicate) -> Vec<Location> {
    locations
        .into_iter()
        .filter(|location| predicate.matches(location))
        .collect()
}
