//! Shared application state

use crate::config::ServerConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::{error, info, warn};
use verinews_classifiers::PredictionService;
use verinews_core::Error;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Prediction service over the artifact loaded at startup
    pub service: Arc<PredictionService>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Load the model from `config.model_dir`; the server still starts
    /// without one and reports it as not loaded
    pub fn new(config: ServerConfig, metrics_handle: PrometheusHandle) -> Self {
        info!("Loading model from: {}", config.model_dir.display());
        let preview_chars = config.content_preview_chars;
        let service = match PredictionService::try_from_dir(&config.model_dir) {
            Ok(service) => {
                if let Some(artifact) = service.artifact() {
                    let metadata = artifact.metadata();
                    info!(
                        "Loaded {} model ({} features, test accuracy {:.4})",
                        metadata.algorithm, metadata.feature_count, metadata.test_accuracy
                    );
                }
                service
            }
            Err(e) => {
                if e.is_artifact_failure() {
                    warn!("{}", load_failure_message(&e));
                } else {
                    error!("{}", load_failure_message(&e));
                }
                PredictionService::unavailable()
            }
        };

        Self::with_service(config, service.with_preview_chars(preview_chars), metrics_handle)
    }

    /// Build state around an existing service
    pub fn with_service(
        config: ServerConfig,
        service: PredictionService,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            metrics_handle,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.service.is_loaded()
    }
}

/// Startup log line for a model that could not be loaded
fn load_failure_message(err: &Error) -> String {
    match err {
        Error::ArtifactNotFound(path) => format!(
            "Model file {} not found, please train the model first",
            path.display()
        ),
        Error::ArtifactCorrupt(reason) => format!("Model artifact is corrupt: {reason}"),
        other => format!("Model could not be loaded ({}): {other}", other.kind()),
    }
}
