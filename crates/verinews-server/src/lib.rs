//! Verinews Server
//!
//! HTTP front end for a trained Verinews model. The artifact is loaded once
//! at startup and shared read-only by every request.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::ServerConfig;
pub use routes::create_router;
pub use state::AppState;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and describe the server metrics
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "verinews_predictions_total",
        "Total number of successful predictions by result"
    );
    metrics::describe_counter!(
        "verinews_prediction_errors_total",
        "Total number of failed predictions by error kind"
    );
    metrics::describe_histogram!(
        "verinews_prediction_latency_us",
        metrics::Unit::Microseconds,
        "Prediction latency in microseconds"
    );

    Ok(handle)
}
