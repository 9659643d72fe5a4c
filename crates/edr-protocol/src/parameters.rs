//! Parameter metadata for EDR collections.
//!
//! A parameter is one measured quantity (storage, streamflow, reservoir
//! elevation) with its unit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Language tag used for all text the upstream provides.
const ENGLISH: &str = "en";

/// Text keyed by language tag, serialized as `{"en": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct I18nString(BTreeMap<String, String>);

impl I18nString {
    pub fn english(text: impl Into<String>) -> Self {
        Self(BTreeMap::from([(ENGLISH.to_string(), text.into())]))
    }
}

/// The quantity a parameter observes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedProperty {
    pub label: I18nString,
}

/// Unit of measurement, as the symbol RISE reports (`af`, `cfs`, `ft`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Unit {
    pub fn from_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
        }
    }
}

/// A parameter available at the collection's locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    /// Always `"Parameter"`.
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<I18nString>,

    #[serde(rename = "observedProperty")]
    pub observed_property: ObservedProperty,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

impl Parameter {
    /// A parameter whose observed property carries the same label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            type_: "Parameter".to_string(),
            id: Some(id.into()),
            observed_property: ObservedProperty {
                label: I18nString::english(label.clone()),
            },
            label: Some(label),
            description: None,
            unit: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(I18nString::english(description));
        self
    }

    pub fn with_unit_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.unit = Some(Unit::from_symbol(symbol));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parameter_labels_observed_property() {
        let param = Parameter::new("3", "Lake/Reservoir Storage");

        assert_eq!(param.type_, "Parameter");
        assert_eq!(param.label.as_deref(), Some("Lake/Reservoir Storage"));
        assert_eq!(
            param.observed_property.label,
            I18nString::english("Lake/Reservoir Storage")
        );
        assert!(param.unit.is_none());
    }

    #[test]
    fn test_parameter_json() {
        let param = Parameter::new("1830", "Streamflow")
            .with_unit_symbol("cfs")
            .with_description("Discharge below the dam");

        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "Parameter",
                "id": "1830",
                "label": "Streamflow",
                "description": {"en": "Discharge below the dam"},
                "observedProperty": {"label": {"en": "Streamflow"}},
                "unit": {"symbol": "cfs"}
            })
        );
    }

    #[test]
    fn test_i18n_round_trips_other_languages() {
        let text: I18nString =
            serde_json::from_value(json!({"en": "Storage", "es": "Almacenamiento"})).unwrap();
        assert_eq!(
            serde_json::to_value(&text).unwrap(),
            json!({"en": "Storage", "es": "Almacenamiento"})
        );
    }
}
