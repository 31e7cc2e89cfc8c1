//! Claims assembly and signing-mode selection.
//!
//! This is the dispatch layer proper: it turns an access-token record into
//! a signed JWT. The signing mode is either forced by the caller or
//! auto-selected by policy: asymmetric only when scope enforcement is
//! enabled and the client is a restricted application.

use crate::adapters::OAuthAdapter;
use crate::config::Config;
use crate::crypto::{self, AccessTokenClaims, EncryptedKey};
use crate::errors::DispatchError;
use crate::models::User;
use crate::observability::metrics::record_jwt_issued;
use crate::repositories::{enterprise, signing_keys};
use crate::toggles::Toggle;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

/// Scopes granted when a JWT is issued for a user without an access token.
pub const DEFAULT_SCOPES: &[&str] = &["email", "profile"];

const USER_TOKEN_EXPIRY_SECONDS: i64 = 3600; // 1 hour

/// Runtime settings for JWT issuance.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub issuer: String,
    pub audience: String,
    pub symmetric_secret: String,
    pub master_key: Vec<u8>,
    pub enforce_jwt_scopes: Toggle,
}

impl JwtSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            symmetric_secret: config.symmetric_secret.clone(),
            master_key: config.master_key.clone(),
            enforce_jwt_scopes: Toggle::new(config.enforce_jwt_scopes),
        }
    }
}

/// Access-token fields handed to the dispatch layer by the token endpoint.
#[derive(Debug, Clone)]
pub struct AccessTokenPayload {
    pub access_token: String,
    pub expires_in: i64,
    pub scope: String,
}

/// Build a signed JWT from an access-token record.
///
/// `use_asymmetric_key` is tri-state: `Some(true)` forces asymmetric
/// signing, `Some(false)` forces symmetric, `None` auto-selects per policy.
pub async fn create_jwt_from_token(
    pool: &PgPool,
    settings: &JwtSettings,
    token: &AccessTokenPayload,
    adapter: &dyn OAuthAdapter,
    use_asymmetric_key: Option<bool>,
) -> Result<String, DispatchError> {
    let access_token = adapter
        .get_access_token(pool, &token.access_token)
        .await?
        .ok_or_else(|| DispatchError::InvalidToken("Unknown access token".to_string()))?;

    let user = adapter
        .get_token_user(pool, &access_token)
        .await?
        .ok_or_else(|| DispatchError::InvalidToken("Access token has no user".to_string()))?;

    let use_asymmetric = match use_asymmetric_key {
        Some(forced) => forced,
        None => {
            let restricted = adapter
                .is_client_restricted(pool, access_token.application_id)
                .await?;
            resolve_signing_mode(None, settings.enforce_jwt_scopes.is_enabled(), restricted)
        }
    };

    let scopes = token
        .scope
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let claims = build_claims(pool, settings, &user, scopes, token.expires_in).await?;

    if use_asymmetric {
        sign_with_active_key(pool, settings, &claims).await
    } else {
        let jwt = crypto::sign_symmetric(&claims, &settings.symmetric_secret)?;
        record_jwt_issued("symmetric");
        Ok(jwt)
    }
}

/// Issue a symmetric JWT directly for a user, without an access token.
///
/// Grants the default scopes. `secret` and `aud` override the configured
/// values; `additional_claims` are merged into the payload last.
pub async fn create_jwt_for_user(
    pool: &PgPool,
    settings: &JwtSettings,
    user: &User,
    secret: Option<&str>,
    aud: Option<&str>,
    additional_claims: Option<&Map<String, Value>>,
) -> Result<String, DispatchError> {
    let scopes = DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();

    let mut claims = build_claims(pool, settings, user, scopes, USER_TOKEN_EXPIRY_SECONDS).await?;
    if let Some(aud) = aud {
        claims.aud = aud.to_string();
    }

    let mut payload = serde_json::to_value(&claims)
        .map_err(|e| DispatchError::Crypto(format!("Claim serialization failed: {}", e)))?;

    if let Some(additional) = additional_claims {
        if let Some(object) = payload.as_object_mut() {
            for (key, value) in additional {
                object.insert(key.clone(), value.clone());
            }
        }
    }

    let jwt = crypto::sign_symmetric(&payload, secret.unwrap_or(&settings.symmetric_secret))?;
    record_jwt_issued("symmetric");
    Ok(jwt)
}

/// Enterprise role strings for a user: "{role_name}:{customer_id}" per
/// assignment, empty when the user has no enterprise association.
pub async fn get_enterprise_roles(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<String>, DispatchError> {
    enterprise::get_role_strings(pool, user_id).await
}

/// Signing-mode policy.
///
/// An explicit caller choice always wins; otherwise asymmetric signing is
/// used only for restricted clients while scope enforcement is enabled.
fn resolve_signing_mode(
    use_asymmetric_key: Option<bool>,
    scopes_enforced: bool,
    client_restricted: bool,
) -> bool {
    use_asymmetric_key.unwrap_or(scopes_enforced && client_restricted)
}

async fn build_claims(
    pool: &PgPool,
    settings: &JwtSettings,
    user: &User,
    scopes: Vec<String>,
    expires_in: i64,
) -> Result<AccessTokenClaims, DispatchError> {
    let roles = get_enterprise_roles(pool, user.user_id).await?;
    let iat = Utc::now().timestamp();

    Ok(AccessTokenClaims {
        iss: settings.issuer.clone(),
        aud: settings.audience.clone(),
        sub: user.user_id.to_string(),
        preferred_username: user.username.clone(),
        email: user.email.clone(),
        email_verified: user.is_active,
        scopes,
        roles,
        iat,
        exp: iat + expires_in,
    })
}

async fn sign_with_active_key(
    pool: &PgPool,
    settings: &JwtSettings,
    claims: &AccessTokenClaims,
) -> Result<String, DispatchError> {
    let signing_key = signing_keys::get_active_key(pool)
        .await?
        .ok_or_else(|| DispatchError::Crypto("No active signing key available".to_string()))?;

    let encrypted_key = EncryptedKey {
        encrypted_data: secrecy::SecretBox::new(Box::new(signing_key.private_key_encrypted)),
        nonce: signing_key.encryption_nonce,
        tag: signing_key.encryption_tag,
    };

    let private_key_pkcs8 = crypto::decrypt_private_key(&encrypted_key, &settings.master_key)?;

    let jwt = crypto::sign_asymmetric(claims, &private_key_pkcs8, &signing_key.key_id)?;
    record_jwt_issued("asymmetric");
    Ok(jwt)
}
