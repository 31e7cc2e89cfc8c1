//! Database and settings fixtures for dispatch tests.
//!
//! The master key is deterministic so asymmetric keys encrypted in one
//! test step decrypt in the next without threading key material around.

use dispatch_service::adapters::OAuthAdapter;
use dispatch_service::crypto;
use dispatch_service::jwt::JwtSettings;
use dispatch_service::models::{Application, User};
use dispatch_service::repositories::{applications, signing_keys, users};
use dispatch_service::toggles::Toggle;
use serde_json::{Map, Value};
use sqlx::PgPool;

pub const TEST_ISSUER: &str = "test-issuer";
pub const TEST_AUDIENCE: &str = "test-aud";
pub const TEST_SECRET: &str = "test-secret";

/// Deterministic 32-byte master key for reproducible tests.
pub fn test_master_key() -> Vec<u8> {
    (0u8..32).map(|i| i.wrapping_mul(7).wrapping_add(3)).collect()
}

/// Issuance settings wired with the test constants.
pub fn test_settings(enforce_jwt_scopes: bool) -> JwtSettings {
    JwtSettings {
        issuer: TEST_ISSUER.to_string(),
        audience: TEST_AUDIENCE.to_string(),
        symmetric_secret: TEST_SECRET.to_string(),
        master_key: test_master_key(),
        enforce_jwt_scopes: Toggle::new(enforce_jwt_scopes),
    }
}

/// Create a user with a derived email address.
pub async fn create_test_user(pool: &PgPool, username: &str, is_active: bool) -> User {
    users::create_user(pool, username, &format!("{}@example.com", username), is_active)
        .await
        .expect("user creation should succeed")
}

/// Create a public client through the given adapter, optionally flagging it
/// as a restricted application.
pub async fn create_test_client(
    pool: &PgPool,
    adapter: &dyn OAuthAdapter,
    user: &User,
    client_id: &str,
    restricted: bool,
) -> Application {
    let application = adapter
        .create_public_client(pool, "public app", user.user_id, "", client_id)
        .await
        .expect("client creation should succeed");

    if restricted {
        applications::mark_restricted(pool, application.application_id)
            .await
            .expect("restricted marker should succeed");
    }

    application
}

/// Assert an issued JWT is valid and carries the expected access-token
/// claims; returns the decoded payload for further assertions.
///
/// Signature verification uses the shared test secret for symmetric tokens
/// and the active signing key's public half for asymmetric ones. `secret`
/// and `aud` override the test defaults, mirroring the issuance overrides.
pub async fn assert_valid_jwt_access_token(
    pool: &PgPool,
    jwt_token: &str,
    user: &User,
    scopes: &[&str],
    should_be_asymmetric_key: bool,
    secret: Option<&str>,
    aud: Option<&str>,
) -> Map<String, Value> {
    let audience = aud.unwrap_or(TEST_AUDIENCE);

    let payload: Value = if should_be_asymmetric_key {
        let signing_key = signing_keys::get_active_key(pool)
            .await
            .expect("active key lookup should succeed")
            .expect("an active signing key must exist for asymmetric verification");
        crypto::verify_asymmetric(jwt_token, &signing_key.public_key, audience)
            .expect("asymmetric signature verification should succeed")
    } else {
        crypto::verify_symmetric(jwt_token, secret.unwrap_or(TEST_SECRET), audience)
            .expect("symmetric signature verification should succeed")
    };

    let payload = payload
        .as_object()
        .expect("JWT payload must be a JSON object")
        .clone();

    assert_eq!(payload["iss"], TEST_ISSUER, "unexpected issuer claim");
    assert_eq!(payload["aud"], audience, "unexpected audience claim");
    assert_eq!(
        payload["sub"],
        user.user_id.to_string(),
        "unexpected subject claim"
    );
    assert_eq!(
        payload["preferred_username"], user.username,
        "unexpected username claim"
    );
    assert_eq!(payload["email"], user.email, "unexpected email claim");
    assert_eq!(
        payload["email_verified"], user.is_active,
        "email_verified must mirror the activation flag"
    );

    let actual_scopes: Vec<&str> = payload["scopes"]
        .as_array()
        .expect("scopes claim must be a list")
        .iter()
        .map(|v| v.as_str().expect("scopes must be strings"))
        .collect();
    assert_eq!(actual_scopes, scopes, "unexpected scopes claim");

    payload
}
