//! Access token issuance and bearer-token gating
//!
//! Tokens are HS256 JWTs signed with a single static secret. There is no
//! revocation or refresh; a token is valid until its `exp` claim passes.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

use crate::config::AuthConfig;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

const ACCESS_TOKEN_TYPE: &str = "access";

/// Token validation errors, rendered as `{"msg": ...}`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing Authorization Header")]
    MissingHeader,

    #[error("Bad Authorization header. Expected 'Authorization: Bearer <JWT>'")]
    BadHeader,

    #[error("{0}")]
    Malformed(String),

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("The token is not yet valid (nbf)")]
    NotYetValid,

    #[error("Only non-refresh tokens are allowed")]
    WrongTokenType,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader | Self::Expired => StatusCode::UNAUTHORIZED,
            Self::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        metrics::counter!("agrivision_auth_failures_total").increment(1);
        (self.status(), Json(json!({ "msg": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub fresh: bool,
    pub iat: i64,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub sub: String,
    pub nbf: i64,
    pub exp: i64,
}

/// Signs and verifies access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    ttl_secs: i64,
    identity: String,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl_secs)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: u64, identity: impl Into<String>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
            identity: identity.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.secret(), config.token_ttl_secs, config.identity.clone())
    }

    /// Issue an access token for the configured identity
    pub fn issue(&self) -> Result<String, AuthError> {
        self.issue_at(chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            fresh: false,
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            sub: self.identity.clone(),
            nbf: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let header = serde_json::to_vec(&header).map_err(|e| AuthError::Signing(e.to_string()))?;
        let payload = serde_json::to_vec(claims).map_err(|e| AuthError::Signing(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = self.sign(signing_input.as_bytes())?;

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::Signing(e.to_string()))?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::Malformed("Not enough segments".to_string()));
        };

        let header: Header = decode_segment(header_b64, "header")?;
        if header.alg != "HS256" {
            return Err(AuthError::Malformed(
                "The specified alg value is not allowed".to_string(),
            ));
        }

        let provided = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::Malformed("Invalid crypto padding".to_string()))?;
        let expected = self.sign(format!("{}.{}", header_b64, payload_b64).as_bytes())?;
        if !bool::from(expected.ct_eq(&provided)) {
            return Err(AuthError::InvalidSignature);
        }

        let claims: Claims = decode_segment(payload_b64, "payload")?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }
        if claims.nbf > now {
            return Err(AuthError::NotYetValid);
        }
        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::WrongTokenType);
        }

        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::Malformed(format!("Invalid {} padding", what)))?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed(format!("Invalid {} string", what)))
}

/// Extract the raw token from an `Authorization` header value
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let token = header.strip_prefix("Bearer ").ok_or(AuthError::BadHeader)?.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::BadHeader);
    }
    Ok(token)
}

/// Extractor that admits only requests carrying a valid access token
#[derive(Debug, Clone)]
pub struct AccessClaims(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AccessClaims {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::BadHeader)?;

        let claims = state.tokens.verify(bearer_token(header)?).map_err(|e| {
            debug!("Rejected access token: {}", e);
            e
        })?;

        Ok(AccessClaims(claims))
    }
}
