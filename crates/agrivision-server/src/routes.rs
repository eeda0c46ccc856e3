//! HTTP routes and handlers

use agrivision_core::FertilizerInput;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::auth::{AccessClaims, AuthError};
use crate::error::AppError;
use crate::landing::landing_page;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;
    let cors_allow_any = state.config.cors_allow_any;

    let router = Router::new()
        .route("/", get(landing_page))
        .route("/token", post(issue_token))
        .route("/kalkulator-pupuk", post(predict_fertilizer))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .with_state(state);

    let router = if cors_allow_any {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

async fn issue_token(State(state): State<AppState>) -> Result<Json<TokenResponse>, AuthError> {
    let access_token = state.tokens.issue()?;
    metrics::counter!("agrivision_tokens_issued_total").increment(1);
    info!("Issued access token");

    Ok(Json(TokenResponse { access_token }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_fertilizer: String,
}

async fn predict_fertilizer(
    State(state): State<AppState>,
    AccessClaims(claims): AccessClaims,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    metrics::counter!("agrivision_requests_total").increment(1);
    debug!(sub = %claims.sub, "Received prediction request");

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::MissingInput(rejection.body_text())
        }
    })?;
    let input = parse_input(&body)?;
    let prediction = state.predictor.predict(&input).await?;

    metrics::histogram!("agrivision_inference_latency_us").record(prediction.latency_us as f64);
    metrics::counter!(
        "agrivision_predictions_total",
        "fertilizer" => prediction.fertilizer.clone()
    )
    .increment(1);

    info!(
        soil = %input.soil_type,
        crop = %input.crop_type,
        fertilizer = %prediction.fertilizer,
        confidence = prediction.confidence,
        "Prediction served"
    );

    Ok(Json(PredictionResponse {
        predicted_fertilizer: prediction.fertilizer,
    }))
}

fn parse_input(body: &[u8]) -> Result<FertilizerInput, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::MissingInput("request body is empty".to_string()));
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| AppError::MissingInput(e.to_string()))?;

    // Derived Deserialize also reads structs from positional arrays
    if !value.is_object() {
        return Err(AppError::MissingInput(
            "request body must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| AppError::MissingInput(e.to_string()))
}

async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
