//! Logging and metrics setup

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Initialize tracing/logging
pub fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("agrivision=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("agrivision=info,tower_http=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Initialize metrics exporter and return handle for rendering
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    describe_metrics();

    info!("Metrics exporter initialized");
    Ok(handle)
}

/// Handle backed by a recorder that is not installed globally
pub fn detached_metrics_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

fn describe_metrics() {
    metrics::describe_counter!(
        "agrivision_requests_total",
        "Total number of prediction requests received"
    );
    metrics::describe_counter!(
        "agrivision_predictions_total",
        "Successful predictions by recommended fertilizer"
    );
    metrics::describe_counter!("agrivision_errors_total", "Failed prediction requests by kind");
    metrics::describe_counter!(
        "agrivision_auth_failures_total",
        "Requests rejected by bearer-token checks"
    );
    metrics::describe_counter!("agrivision_tokens_issued_total", "Access tokens issued");
    metrics::describe_histogram!(
        "agrivision_inference_latency_us",
        metrics::Unit::Microseconds,
        "Model inference latency in microseconds"
    );
}
