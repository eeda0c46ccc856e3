//! Integration tests for the Agrivision HTTP API

use agrivision_core::{Error, FeatureVector, Result};
use agrivision_model::InferenceModel;
use agrivision_server::{create_router, telemetry, AppState, ServerConfig};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Model with the production tensor contract that always favors one class
struct FixedModel {
    class: usize,
    fail: bool,
}

#[async_trait]
impl InferenceModel for FixedModel {
    async fn infer(&self, input: &FeatureVector) -> Result<Vec<f32>> {
        self.check_input(input)?;
        if self.fail {
            return Err(Error::model("tensor allocation failed"));
        }
        let mut probabilities = vec![0.02; 14];
        probabilities[self.class] = 0.74;
        Ok(probabilities)
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn input_len(&self) -> usize {
        27
    }

    fn output_len(&self) -> usize {
        14
    }
}

fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.auth.jwt_secret = Some("test-secret".to_string());
    config.max_body_bytes = 1024;
    config
}

fn test_state(model: FixedModel) -> AppState {
    AppState::with_model(
        test_config(),
        Arc::new(model),
        telemetry::detached_metrics_handle(),
    )
    .unwrap()
}

fn urea_app() -> (Router, AppState) {
    let state = test_state(FixedModel { class: 13, fail: false });
    (create_router(state.clone()), state)
}

fn sample_body() -> Value {
    json!({
        "N": 37,
        "P": 0,
        "K": 0,
        "temperature": 26,
        "humidity": 52,
        "soil_type": "Sandy",
        "crop_type": "Maize"
    })
}

fn predict_request(auth: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/kalkulator-pupuk")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len());
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_landing_page() {
    let (app, _) = urea_app();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8(body.to_vec()).unwrap().contains("AGRIVISION"));
}

#[tokio::test]
async fn test_health_and_fallback() {
    let (app, _) = urea_app();
    let (status, body) = send(
        app.clone(),
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let (status, body) = send_json(
        app,
        Request::builder().uri("/missing").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = urea_app();
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_issue_token_then_predict() {
    let (app, state) = urea_app();

    let request = Request::builder()
        .method("POST")
        .uri("/token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);

    let token = body["access_token"].as_str().unwrap().to_string();
    let claims = state.tokens.verify(&token).unwrap();
    assert_eq!(claims.sub, "system_user");

    let auth = format!("Bearer {}", token);
    let (status, body) = send_json(app, predict_request(Some(&auth), sample_body().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "predicted_fertilizer": "Urea" }));
}

#[tokio::test]
async fn test_token_endpoint_is_post_only() {
    let (app, _) = urea_app();
    let request = Request::builder().uri("/token").body(Body::empty()).unwrap();

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_missing_authorization_header() {
    let (app, _) = urea_app();

    let (status, body) = send_json(app, predict_request(None, sample_body().to_string())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Missing Authorization Header");
}

#[tokio::test]
async fn test_bad_authorization_header() {
    let (app, _) = urea_app();

    let (status, body) =
        send_json(app, predict_request(Some("Token abc"), sample_body().to_string())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["msg"].as_str().unwrap().starts_with("Bad Authorization header"));
}

#[tokio::test]
async fn test_forged_token_rejected() {
    let (app, _) = urea_app();
    let forged = agrivision_server::auth::TokenIssuer::new("wrong-secret", 900, "system_user")
        .issue()
        .unwrap();

    let auth = format!("Bearer {}", forged);
    let (status, body) = send_json(app, predict_request(Some(&auth), sample_body().to_string())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["msg"], "Signature verification failed");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let (app, state) = urea_app();
    let issued = chrono::Utc::now().timestamp() - 3600;
    let token = state.tokens.issue_at(issued).unwrap();

    let auth = format!("Bearer {}", token);
    let (status, body) = send_json(app, predict_request(Some(&auth), sample_body().to_string())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Token has expired");
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let (app, state) = urea_app();
    let auth = format!("Bearer {}", state.tokens.issue().unwrap());

    let mut body = sample_body();
    body.as_object_mut().unwrap().remove("humidity");

    let (status, body) = send_json(app, predict_request(Some(&auth), body.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Missing input data:"));
    assert!(message.contains("humidity"));
}

#[tokio::test]
async fn test_non_json_body_is_bad_request() {
    let (app, state) = urea_app();
    let auth = format!("Bearer {}", state.tokens.issue().unwrap());

    let (status, body) = send_json(app, predict_request(Some(&auth), "N=37".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Missing input data:"));
}

#[tokio::test]
async fn test_unknown_soil_type_is_bad_request() {
    let (app, state) = urea_app();
    let auth = format!("Bearer {}", state.tokens.issue().unwrap());

    let mut body = sample_body();
    body["soil_type"] = json!("Peaty");

    let (status, body) = send_json(app, predict_request(Some(&auth), body.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Invalid input data:"));
    assert!(message.contains("Peaty"));
}

#[tokio::test]
async fn test_model_failure_is_server_error() {
    let state = test_state(FixedModel { class: 0, fail: true });
    let auth = format!("Bearer {}", state.tokens.issue().unwrap());
    let app = create_router(state);

    let (status, body) = send_json(app, predict_request(Some(&auth), sample_body().to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Prediction error:"));
    assert!(message.contains("tensor allocation failed"));
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let (app, state) = urea_app();
    let auth = format!("Bearer {}", state.tokens.issue().unwrap());

    let padding = "x".repeat(4096);
    let mut body = sample_body();
    body["note"] = json!(padding);

    let (status, body) =
        send_json(app, predict_request(Some(&auth), body.to_string())).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Request body too large:"));
}

#[tokio::test]
async fn test_positional_array_body_is_bad_request() {
    let (app, state) = urea_app();
    let auth = format!("Bearer {}", state.tokens.issue().unwrap());

    let positional = json!([37, 0, 0, 26, 52, "Sandy", "Maize"]).to_string();
    let (status, body) = send_json(app, predict_request(Some(&auth), positional)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Missing input data:"));
}

#[tokio::test]
async fn test_scalar_body_is_bad_request() {
    let (app, state) = urea_app();
    let auth = format!("Bearer {}", state.tokens.issue().unwrap());

    let (status, body) = send_json(app, predict_request(Some(&auth), "42".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Missing input data:"));
}

#[tokio::test]
async fn test_f32_overflow_is_bad_request() {
    let (app, state) = urea_app();
    let auth = format!("Bearer {}", state.tokens.issue().unwrap());

    let mut body = sample_body();
    body["N"] = json!(1e39);

    let (status, body) = send_json(app, predict_request(Some(&auth), body.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Invalid input data:"));
    assert!(message.contains("N must be"));
}

#[test]
fn test_model_contract_checked_at_startup() {
    struct WrongShape;

    #[async_trait]
    impl InferenceModel for WrongShape {
        async fn infer(&self, _input: &FeatureVector) -> Result<Vec<f32>> {
            Ok(vec![])
        }
        fn name(&self) -> &str {
            "wrong"
        }
        fn input_len(&self) -> usize {
            30
        }
        fn output_len(&self) -> usize {
            14
        }
    }

    let result = AppState::with_model(
        test_config(),
        Arc::new(WrongShape),
        telemetry::detached_metrics_handle(),
    );
    assert!(result.is_err());
}
