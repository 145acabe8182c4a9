//! HTTP routes and handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::state::AppState;
use verinews_classifiers::PredictionResponse;
use verinews_core::{Error, Label};

pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.cors_allow_any_origin {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .route("/model-info", get(model_info))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Prediction request body
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

/// Classify an article; every handled outcome is a 200 with `success` set
async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Json<PredictionResponse> {
    let start = Instant::now();
    let result = state
        .service
        .predict(req.headline.as_deref(), req.content.as_deref());
    let elapsed_us = start.elapsed().as_micros() as f64;

    match &result {
        Ok(prediction) => {
            debug!(
                "Predicted {} ({:.2}%) in {:.0}us",
                prediction.label, prediction.confidence, elapsed_us
            );
            let label = if prediction.label == Label::Real { "real" } else { "fake" };
            metrics::counter!("verinews_predictions_total", "result" => label).increment(1);
            metrics::histogram!("verinews_prediction_latency_us").record(elapsed_us);
        }
        Err(e) => {
            debug!("Prediction failed: {}", e);
            metrics::counter!("verinews_prediction_errors_total", "kind" => e.kind()).increment(1);
        }
    }

    Json(PredictionResponse::from_result(&result))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: state.model_loaded(),
    })
}

/// Stored artifact metadata, or an error object when no model is loaded
async fn model_info(State(state): State<AppState>) -> Response {
    match state.service.artifact() {
        Some(artifact) => Json(artifact.metadata().clone()).into_response(),
        None => {
            Json(PredictionResponse::error(Error::ModelUnavailable.to_string())).into_response()
        }
    }
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics_handle.render(),
    )
}

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(PredictionResponse::error("not found")),
    )
}
