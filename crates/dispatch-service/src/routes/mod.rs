use crate::handlers::jwks_handler;
use crate::handlers::token_handler::{self, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // OAuth 2.0 token endpoint
        .route("/oauth2/access_token", post(token_handler::handle_access_token))
        // JWKS endpoint (RFC 8414 well-known path)
        .route("/.well-known/jwks.json", get(jwks_handler::handle_get_jwks))
        // Health check
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
