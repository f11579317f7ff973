//! Inference layer: regression forest evaluation and model artifact caching.

mod error;
pub use error::{ModelError, PredictError};

pub mod forest;
pub use forest::ForestModel;

mod predictor;
pub use predictor::{PredictionService, Predictor};

#[cfg(feature = "fetch")]
mod cache;
#[cfg(feature = "fetch")]
pub use cache::{DOWNLOAD_TIMEOUT, ModelCache};
