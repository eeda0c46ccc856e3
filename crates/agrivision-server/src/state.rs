//! Shared application state

use agrivision_core::EncoderTable;
use agrivision_model::{FertilizerPredictor, InferenceModel};
use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::info;

use crate::auth::TokenIssuer;
use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Encoding, inference, and decoding pipeline
    pub predictor: FertilizerPredictor,

    /// Access token signer/verifier
    pub tokens: Arc<TokenIssuer>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Initialize application state from configuration, loading the model
    pub async fn new(config: ServerConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        info!("Initializing application state");

        let model_config = config.model.to_model_config();
        let network = tokio::task::spawn_blocking(move || model_config.load())
            .await
            .context("Model loading task panicked")?
            .context("Failed to load model")?;

        Self::with_model(config, Arc::new(network), metrics_handle)
    }

    /// Build state around an already constructed model
    pub fn with_model(
        config: ServerConfig,
        model: Arc<dyn InferenceModel>,
        metrics_handle: PrometheusHandle,
    ) -> Result<Self> {
        let predictor = FertilizerPredictor::new(model, EncoderTable::shared())
            .context("Model does not match the fertilizer feature layout")?;
        info!("Serving model: {}", predictor.model_name());

        let tokens = TokenIssuer::from_config(&config.auth);

        Ok(Self {
            config: Arc::new(config),
            predictor,
            tokens: Arc::new(tokens),
            metrics_handle,
        })
    }
}
