//! HTTP surface: health check, HTML form, and JSON prediction API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use housecast_ai::{ModelCache, PredictError, PredictionService, Predictor};
use housecast_core::{FeatureBuilder, FeatureError, form_payload};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::page;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    predictor: PredictionService,
    model_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(model: Arc<dyn Predictor>, model_path: PathBuf) -> Self {
        Self {
            predictor: PredictionService::new(model),
            model_path: Arc::new(model_path),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
    pub currency: &'static str,
}

/// Request failure, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<FeatureError> for ApiError {
    fn from(e: FeatureError) -> Self {
        if e.is_missing() {
            warn!(error = %e, "rejected prediction request");
            Self::BadRequest(e.to_string())
        } else {
            error!(error = %e, "feature coercion failed");
            Self::Internal(e.to_string())
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        error!(error = %e, "prediction failed");
        Self::Internal(e.to_string())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(index))
        .route("/predict-form", post(predict_form))
        .route("/predict", post(predict))
        .with_state(state)
}

/// Load the model, then serve until Ctrl-C.
///
/// The model is fully loaded before the listener binds; any download or
/// artifact error aborts startup.
pub async fn run(cache: ModelCache, addr: SocketAddr) -> anyhow::Result<()> {
    let model = cache
        .load_predictor()
        .await
        .with_context(|| format!("loading model from {}", cache.url()))?;
    let state = AppState::new(Arc::new(model), cache.path().to_path_buf());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

// ── Handlers ──

/// Reports whether the artifact file exists, not whether a model is loaded.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": tokio::fs::try_exists(state.model_path.as_path())
            .await
            .unwrap_or(false),
    }))
}

async fn index() -> Html<String> {
    Html(page::render(None))
}

/// A body that is not URL-encoded form data is treated as an empty form.
async fn predict_form(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Html<String>, ApiError> {
    let fields = match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable form body, using defaults");
            HashMap::new()
        }
    };
    let record = FeatureBuilder::form().build(&form_payload(fields))?;
    let price = state.predictor.predict(&record)?;
    info!(postcode_area = %record.postcode_area, price, "form prediction");
    Ok(Html(page::render(Some(price))))
}

/// The body is parsed as JSON whatever its declared content type.
async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(ApiError::BadRequest(
                "request body must be a JSON object".into(),
            ));
        }
        Err(e) => return Err(ApiError::BadRequest(format!("invalid JSON body: {e}"))),
    };

    let record = FeatureBuilder::json().build(&payload)?;
    let prediction = state.predictor.predict(&record)?;
    Ok(Json(PredictResponse {
        prediction,
        currency: "GBP",
    }))
}
