use crate::errors::DispatchError;
use crate::models::Jwks;
use crate::observability::metrics::record_jwks_request;
use crate::services::key_management_service;
use axum::{
    extract::State,
    http::header::{HeaderMap, HeaderValue, CACHE_CONTROL},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use super::token_handler::AppState;

/// Handle JWKS request
///
/// GET /.well-known/jwks.json
///
/// Returns all active public keys in JWKS format (RFC 7517) with
/// Cache-Control set to one hour; upstream caches do the rest.
#[instrument(name = "dispatch.jwks.get", skip_all)]
pub async fn handle_get_jwks(
    State(state): State<Arc<AppState>>,
) -> Result<(HeaderMap, Json<Jwks>), DispatchError> {
    record_jwks_request();

    let jwks = key_management_service::get_jwks(&state.pool).await?;

    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=3600"));

    Ok((headers, Json(jwks)))
}
