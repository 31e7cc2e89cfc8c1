use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Invalid client credentials")]
    InvalidClient,

    #[error("Insufficient scope: required {required}, allowed {allowed:?}")]
    InsufficientScope {
        required: String,
        allowed: Vec<String>,
    },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_scopes: Option<Vec<String>>,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let (status, code, message, required_scope, allowed_scopes) = match &self {
            DispatchError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "An internal database error occurred".to_string(),
                None,
                None,
            ),
            DispatchError::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CRYPTO_ERROR",
                "An internal cryptographic error occurred".to_string(),
                None,
                None,
            ),
            DispatchError::InvalidClient => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CLIENT",
                "Invalid client credentials".to_string(),
                None,
                None,
            ),
            DispatchError::InsufficientScope { required, allowed } => (
                StatusCode::FORBIDDEN,
                "INSUFFICIENT_SCOPE",
                format!("Requires scope: {}", required),
                Some(required.clone()),
                Some(allowed.clone()),
            ),
            DispatchError::InvalidToken(reason) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                reason.clone(),
                None,
                None,
            ),
            DispatchError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
                None,
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                required_scope,
                allowed_scopes,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
