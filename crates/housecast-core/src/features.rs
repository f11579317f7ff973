//! Feature records: the fixed ten-column input schema of the price model.
//!
//! Requests arrive as loosely typed key/value payloads (a JSON object or
//! URL-encoded form fields). [`FeatureBuilder`] turns them into a
//! [`FeatureRecord`] under an explicit [`ValidationPolicy`], so the strict API
//! path and the lenient form path share one implementation.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::FeatureError;
use crate::coords;

/// Canonical feature names, in the positional order the model consumes.
pub const FEATURE_NAMES: [&str; 10] = [
    "latitude",
    "longitude",
    "floorAreaSqM",
    "bedrooms",
    "bathrooms",
    "livingRooms",
    "propertyType",
    "tenure",
    "currentEnergyRating",
    "postcodeArea",
];

/// Number of leading numeric features in [`FEATURE_NAMES`].
const NUMERIC_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

impl FeatureKind {
    /// Kind of the feature at canonical position `index`.
    pub fn of_index(index: usize) -> Self {
        if index < NUMERIC_COUNT {
            Self::Numeric
        } else {
            Self::Categorical
        }
    }
}

/// One model input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRecord {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "floorAreaSqM")]
    pub floor_area_sqm: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub living_rooms: f64,
    pub property_type: String,
    pub tenure: String,
    pub current_energy_rating: String,
    pub postcode_area: String,
}

/// A single cell of a feature row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Number(f64),
    Category(&'a str),
}

impl FeatureRecord {
    /// Values in canonical order, paired with their feature names.
    pub fn values(&self) -> [(&'static str, FeatureValue<'_>); 10] {
        use FeatureValue::{Category, Number};
        [
            (FEATURE_NAMES[0], Number(self.latitude)),
            (FEATURE_NAMES[1], Number(self.longitude)),
            (FEATURE_NAMES[2], Number(self.floor_area_sqm)),
            (FEATURE_NAMES[3], Number(self.bedrooms)),
            (FEATURE_NAMES[4], Number(self.bathrooms)),
            (FEATURE_NAMES[5], Number(self.living_rooms)),
            (FEATURE_NAMES[6], Category(&self.property_type)),
            (FEATURE_NAMES[7], Category(&self.tenure)),
            (FEATURE_NAMES[8], Category(&self.current_energy_rating)),
            (FEATURE_NAMES[9], Category(&self.postcode_area)),
        ]
    }
}

/// How the builder treats absent or malformed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Every field must be present; numeric fields must parse.
    Strict,
    /// Absent, blank, or unparseable numeric fields become `0.0`; absent
    /// categorical fields become `""`.
    Lenient,
}

/// Where latitude and longitude come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSource {
    /// Read `latitude`/`longitude` from the payload like any other field.
    Payload,
    /// Derive them from `postcodeArea` via [`coords::resolve`].
    PostcodeArea,
}

/// Builds a [`FeatureRecord`] from an untyped payload.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder {
    policy: ValidationPolicy,
    coordinates: CoordinateSource,
}

impl FeatureBuilder {
    pub fn new(policy: ValidationPolicy, coordinates: CoordinateSource) -> Self {
        Self {
            policy,
            coordinates,
        }
    }

    /// The JSON API: all ten fields required, coercion failures rejected.
    pub fn json() -> Self {
        Self::new(ValidationPolicy::Strict, CoordinateSource::Payload)
    }

    /// The HTML form: coordinates derived from the postcode area, blanks default.
    pub fn form() -> Self {
        Self::new(ValidationPolicy::Lenient, CoordinateSource::PostcodeArea)
    }

    /// Field names the caller must supply under this configuration.
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        FEATURE_NAMES.into_iter().filter(move |name| {
            self.coordinates == CoordinateSource::Payload || !is_coordinate(name)
        })
    }

    /// Build a record from `source`.
    ///
    /// Under [`ValidationPolicy::Strict`] every required field that is absent is
    /// reported at once in [`FeatureError::Missing`], in canonical order, before
    /// any coercion is attempted.
    pub fn build(&self, source: &Map<String, Value>) -> Result<FeatureRecord, FeatureError> {
        if self.policy == ValidationPolicy::Strict {
            let missing: Vec<&'static str> = self
                .required_fields()
                .filter(|name| !source.contains_key(*name))
                .collect();
            if !missing.is_empty() {
                debug!(?missing, "feature payload incomplete");
                return Err(FeatureError::Missing(missing));
            }
        }

        let postcode_area = self.categorical(source, "postcodeArea")?;
        let (latitude, longitude) = match self.coordinates {
            CoordinateSource::Payload => (
                self.numeric(source, "latitude")?,
                self.numeric(source, "longitude")?,
            ),
            CoordinateSource::PostcodeArea => {
                let resolved = coords::resolve(&postcode_area);
                (resolved.latitude, resolved.longitude)
            }
        };

        Ok(FeatureRecord {
            latitude,
            longitude,
            floor_area_sqm: self.numeric(source, "floorAreaSqM")?,
            bedrooms: self.numeric(source, "bedrooms")?,
            bathrooms: self.numeric(source, "bathrooms")?,
            living_rooms: self.numeric(source, "livingRooms")?,
            property_type: self.categorical(source, "propertyType")?,
            tenure: self.categorical(source, "tenure")?,
            current_energy_rating: self.categorical(source, "currentEnergyRating")?,
            postcode_area,
        })
    }

    fn numeric(&self, source: &Map<String, Value>, field: &'static str) -> Result<f64, FeatureError> {
        let parsed = match source.get(field) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
            Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
        .filter(|v| v.is_finite());

        match (parsed, self.policy) {
            (Some(v), _) => Ok(v),
            (None, ValidationPolicy::Lenient) => Ok(0.0),
            (None, ValidationPolicy::Strict) => Err(FeatureError::Invalid {
                field,
                value: source.get(field).map(Value::to_string).unwrap_or_default(),
            }),
        }
    }

    fn categorical(
        &self,
        source: &Map<String, Value>,
        field: &'static str,
    ) -> Result<String, FeatureError> {
        match source.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
            other => match self.policy {
                ValidationPolicy::Lenient => Ok(String::new()),
                ValidationPolicy::Strict => Err(FeatureError::Invalid {
                    field,
                    value: other.map(Value::to_string).unwrap_or_default(),
                }),
            },
        }
    }
}

fn is_coordinate(name: &str) -> bool {
    name == "latitude" || name == "longitude"
}

/// Adapt URL-encoded form fields to the payload shape [`FeatureBuilder`] reads.
///
/// Only feature fields are kept; anything else the form posts is dropped.
pub fn form_payload(fields: HashMap<String, String>) -> Map<String, Value> {
    fields
        .into_iter()
        .filter(|(k, _)| FEATURE_NAMES.contains(&k.as_str()))
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_payload() -> Map<String, Value> {
        let value = json!({
            "latitude": 51.5018,
            "longitude": -0.1416,
            "floorAreaSqM": 72.5,
            "bedrooms": 2,
            "bathrooms": 1,
            "livingRooms": 1,
            "propertyType": "Flat",
            "tenure": "Leasehold",
            "currentEnergyRating": "C",
            "postcodeArea": "SW1"
        });
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn feature_names_match_record_order() {
        let record = FeatureBuilder::json().build(&full_payload()).unwrap();
        let names: Vec<&str> = record.values().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, FEATURE_NAMES);
    }

    #[test]
    fn json_builds_complete_record() {
        let record = FeatureBuilder::json().build(&full_payload()).unwrap();
        assert_eq!(record.latitude, 51.5018);
        assert_eq!(record.floor_area_sqm, 72.5);
        assert_eq!(record.bedrooms, 2.0);
        assert_eq!(record.property_type, "Flat");
        assert_eq!(record.postcode_area, "SW1");
    }

    #[test]
    fn json_reports_all_missing_fields_in_canonical_order() {
        let mut payload = full_payload();
        payload.remove("tenure");
        payload.remove("latitude");
        payload.remove("bathrooms");

        let err = FeatureBuilder::json().build(&payload).unwrap_err();
        assert_eq!(
            err,
            FeatureError::Missing(vec!["latitude", "bathrooms", "tenure"])
        );
    }

    #[test]
    fn json_empty_payload_misses_everything() {
        let err = FeatureBuilder::json().build(&Map::new()).unwrap_err();
        assert_eq!(err, FeatureError::Missing(FEATURE_NAMES.to_vec()));
    }

    #[test]
    fn json_accepts_numeric_strings() {
        let mut payload = full_payload();
        payload.insert("bedrooms".into(), json!(" 3 "));
        payload.insert("latitude".into(), json!("51.49"));
        let record = FeatureBuilder::json().build(&payload).unwrap();
        assert_eq!(record.bedrooms, 3.0);
        assert_eq!(record.latitude, 51.49);
    }

    #[test]
    fn json_rejects_non_numeric_value() {
        let mut payload = full_payload();
        payload.insert("floorAreaSqM".into(), json!("big"));
        let err = FeatureBuilder::json().build(&payload).unwrap_err();
        assert_eq!(
            err,
            FeatureError::Invalid {
                field: "floorAreaSqM",
                value: "\"big\"".into()
            }
        );
    }

    #[test]
    fn json_rejects_non_finite_numbers() {
        for text in ["NaN", "inf", "-Infinity"] {
            let mut payload = full_payload();
            payload.insert("floorAreaSqM".into(), json!(text));
            let err = FeatureBuilder::json().build(&payload).unwrap_err();
            assert!(
                matches!(err, FeatureError::Invalid { field: "floorAreaSqM", .. }),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn form_defaults_non_finite_numbers() {
        let mut fields = HashMap::new();
        fields.insert("bedrooms".to_string(), "nan".to_string());
        let record = FeatureBuilder::form().build(&form_payload(fields)).unwrap();
        assert_eq!(record.bedrooms, 0.0);
    }

    #[test]
    fn json_rejects_null_numeric() {
        let mut payload = full_payload();
        payload.insert("bathrooms".into(), Value::Null);
        let err = FeatureBuilder::json().build(&payload).unwrap_err();
        assert!(matches!(err, FeatureError::Invalid { field: "bathrooms", .. }));
    }

    #[test]
    fn json_renders_numeric_category_as_text() {
        let mut payload = full_payload();
        payload.insert("currentEnergyRating".into(), json!(4));
        let record = FeatureBuilder::json().build(&payload).unwrap();
        assert_eq!(record.current_energy_rating, "4");
    }

    #[test]
    fn form_derives_coordinates_from_postcode_area() {
        let mut fields = HashMap::new();
        fields.insert("postcodeArea".to_string(), "SW1A".to_string());
        fields.insert("floorAreaSqM".to_string(), "80".to_string());
        // Caller-supplied coordinates are not trusted on the form path.
        fields.insert("latitude".to_string(), "0".to_string());

        let record = FeatureBuilder::form().build(&form_payload(fields)).unwrap();
        let expected = coords::resolve("SW1");
        assert_eq!(record.latitude, expected.latitude);
        assert_eq!(record.longitude, expected.longitude);
        assert_eq!(record.floor_area_sqm, 80.0);
        assert_eq!(record.postcode_area, "SW1A");
    }

    #[test]
    fn form_defaults_blank_and_absent_fields() {
        let mut fields = HashMap::new();
        fields.insert("bedrooms".to_string(), "".to_string());
        fields.insert("bathrooms".to_string(), "two".to_string());

        let record = FeatureBuilder::form().build(&form_payload(fields)).unwrap();
        assert_eq!(record.bedrooms, 0.0);
        assert_eq!(record.bathrooms, 0.0);
        assert_eq!(record.floor_area_sqm, 0.0);
        assert_eq!(record.tenure, "");
        assert_eq!(record.latitude, coords::DEFAULT_COORDS.latitude);
        assert_eq!(record.longitude, coords::DEFAULT_COORDS.longitude);
    }

    #[test]
    fn form_payload_drops_unknown_fields() {
        let mut fields = HashMap::new();
        fields.insert("csrf".to_string(), "x".to_string());
        fields.insert("tenure".to_string(), "Freehold".to_string());
        let payload = form_payload(fields);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload["tenure"], json!("Freehold"));
    }

    #[test]
    fn strict_policy_with_derived_coordinates_skips_lat_lon() {
        let builder = FeatureBuilder::new(ValidationPolicy::Strict, CoordinateSource::PostcodeArea);
        let required: Vec<&str> = builder.required_fields().collect();
        assert_eq!(required.len(), 8);
        assert!(!required.contains(&"latitude"));

        let mut payload = full_payload();
        payload.remove("latitude");
        payload.remove("longitude");
        let record = builder.build(&payload).unwrap();
        assert_eq!(record.latitude, coords::resolve("SW1").latitude);
    }

    #[test]
    fn feature_kinds_split_at_living_rooms() {
        assert_eq!(FeatureKind::of_index(5), FeatureKind::Numeric);
        assert_eq!(FeatureKind::of_index(6), FeatureKind::Categorical);
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let record = FeatureBuilder::json().build(&full_payload()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["floorAreaSqM"], json!(72.5));
        assert_eq!(value["currentEnergyRating"], json!("C"));
        assert_eq!(value["livingRooms"], json!(1.0));
    }
}
