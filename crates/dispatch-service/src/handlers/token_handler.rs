use crate::errors::DispatchError;
use crate::jwt::JwtSettings;
use crate::models::{TokenFormat, TokenResponse};
use crate::services::token_service;
use axum::{extract::State, http::HeaderMap, Json};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AccessTokenRequest {
    pub grant_type: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// "bearer" (default) or "jwt".
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: JwtSettings,
}

/// Handle access-token request (OAuth 2.0 Client Credentials)
///
/// POST /oauth2/access_token
///
/// Accepts credentials via:
/// - HTTP Basic Auth (preferred)
/// - Request body (client_id, client_secret)
pub async fn handle_access_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AccessTokenRequest>,
) -> Result<Json<TokenResponse>, DispatchError> {
    let (client_id, client_secret) = extract_client_credentials(&headers, &payload)?;

    let token_format = match payload.token_type.as_deref() {
        Some(value) => TokenFormat::from_str(value)
            .map_err(|_| DispatchError::InvalidToken(format!("Unsupported token type: {}", value)))?,
        None => TokenFormat::Bearer,
    };

    let token = token_service::issue_access_token(
        &state.pool,
        &state.settings,
        &client_id,
        &client_secret,
        &payload.grant_type,
        payload.scope.as_deref(),
        token_format,
    )
    .await?;

    Ok(Json(token))
}

/// Extract client credentials from Basic Auth header or request body
fn extract_client_credentials(
    headers: &HeaderMap,
    payload: &AccessTokenRequest,
) -> Result<(String, String), DispatchError> {
    // Try Basic Auth first
    if let Some(auth_header) = headers.get("authorization") {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| DispatchError::InvalidClient)?;

        if let Some(basic_auth) = auth_str.strip_prefix("Basic ") {
            let decoded = general_purpose::STANDARD
                .decode(basic_auth)
                .map_err(|_| DispatchError::InvalidClient)?;

            let credentials =
                String::from_utf8(decoded).map_err(|_| DispatchError::InvalidClient)?;

            return match credentials.splitn(2, ':').collect::<Vec<_>>().as_slice() {
                [client_id, client_secret] => {
                    Ok((client_id.to_string(), client_secret.to_string()))
                }
                _ => Err(DispatchError::InvalidClient),
            };
        }
    }

    // Fall back to request body
    match (&payload.client_id, &payload.client_secret) {
        (Some(id), Some(secret)) => Ok((id.clone(), secret.clone())),
        _ => Err(DispatchError::InvalidClient),
    }
}
