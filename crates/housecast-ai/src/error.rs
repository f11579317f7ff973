use thiserror::Error;

/// Failures while fetching or loading the model artifact. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ModelError {
    #[cfg(feature = "fetch")]
    #[error("model download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model download from {url} returned {status}")]
    Download { status: u16, url: String },

    #[error("model cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Artifact(String),
}

/// Failures inside a single inference call.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("predictor returned no output rows")]
    EmptyOutput,

    #[error("feature row does not match model schema: {0}")]
    Schema(String),
}
