//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Errors returned by the prediction endpoint as `{"error": ...}`
#[derive(Debug)]
pub enum AppError {
    /// Body absent, not JSON, or missing a field
    MissingInput(String),
    /// Well-formed body with values outside the model's domain
    InvalidInput(String),
    /// Body exceeds the configured size limit
    PayloadTooLarge(String),
    /// Encoding or inference failed on the server side
    Prediction(String),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "missing_input",
            Self::InvalidInput(_) => "invalid_input",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Prediction(_) => "prediction",
        }
    }
}

impl From<agrivision_core::Error> for AppError {
    fn from(err: agrivision_core::Error) -> Self {
        if err.is_client_error() {
            AppError::InvalidInput(err.to_string())
        } else {
            AppError::Prediction(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        metrics::counter!("agrivision_errors_total", "kind" => self.kind()).increment(1);

        let (status, message) = match self {
            AppError::MissingInput(msg) => {
                warn!("Rejected request: missing input: {}", msg);
                (StatusCode::BAD_REQUEST, format!("Missing input data: {}", msg))
            }
            AppError::InvalidInput(msg) => {
                warn!("Rejected request: invalid input: {}", msg);
                (StatusCode::BAD_REQUEST, format!("Invalid input data: {}", msg))
            }
            AppError::PayloadTooLarge(msg) => {
                warn!("Rejected request: {}", msg);
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("Request body too large: {}", msg),
                )
            }
            AppError::Prediction(msg) => {
                error!("Prediction failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Prediction error: {}", msg),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let client = agrivision_core::Error::invalid_input("humidity must be finite");
        assert!(matches!(AppError::from(client), AppError::InvalidInput(_)));

        let server = agrivision_core::Error::model("forward pass failed");
        assert!(matches!(AppError::from(server), AppError::Prediction(_)));
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::MissingInput("N".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::PayloadTooLarge("limit".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = AppError::Prediction("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
