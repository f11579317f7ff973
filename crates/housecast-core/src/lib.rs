pub mod coords;
pub mod features;

mod error;
pub use error::FeatureError;

pub use coords::{LatLon, resolve};
pub use features::{
    CoordinateSource, FEATURE_NAMES, FeatureBuilder, FeatureKind, FeatureRecord, FeatureValue,
    ValidationPolicy, form_payload,
};
