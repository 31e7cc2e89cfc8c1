use crate::adapters::StandardAdapter;
use crate::crypto;
use crate::errors::DispatchError;
use crate::jwt::{self, AccessTokenPayload, JwtSettings};
use crate::models::{TokenFormat, TokenResponse};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::record_token_issuance;
use crate::repositories::{access_tokens, applications};
use chrono::{Duration, Utc};
use sqlx::PgPool;

const TOKEN_EXPIRY_SECONDS: i64 = 3600; // 1 hour

/// Issue an access token via OAuth 2.0 Client Credentials.
///
/// Verifies the client secret, persists the token bound to the client's
/// owning user, and returns it either as an opaque bearer token or already
/// dispatched to a JWT (auto-selected signing).
pub async fn issue_access_token(
    pool: &PgPool,
    settings: &JwtSettings,
    client_id: &str,
    client_secret: &str,
    grant_type: &str,
    requested_scope: Option<&str>,
    token_format: TokenFormat,
) -> Result<TokenResponse, DispatchError> {
    // Validate grant_type
    if grant_type != "client_credentials" {
        return Err(DispatchError::InvalidClient);
    }

    let application = applications::get_by_client_id(pool, client_id).await?;

    // Always run bcrypt to prevent timing attacks
    // Use dummy hash if the client is unknown or has no secret
    let hash_to_verify = application
        .as_ref()
        .and_then(|app| app.client_secret_hash.as_deref())
        .unwrap_or("$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a");

    let is_valid = crypto::verify_client_secret(client_secret, hash_to_verify)?;

    let application = application.ok_or(DispatchError::InvalidClient)?;

    if application.client_secret_hash.is_none() || !is_valid {
        tracing::warn!(
            client = %hash_for_correlation(client_id),
            "Client authentication failed"
        );
        record_token_issuance(grant_type, "error");
        return Err(DispatchError::InvalidClient);
    }

    // Requested scopes must be a subset of the application's allowed scopes
    let scopes: Vec<String> = match requested_scope {
        Some(requested) => {
            let requested: Vec<String> = requested
                .split_whitespace()
                .map(str::to_string)
                .collect();
            let all_valid = requested.iter().all(|s| application.scopes.contains(s));

            if !all_valid {
                record_token_issuance(grant_type, "error");
                return Err(DispatchError::InsufficientScope {
                    required: requested.join(" "),
                    allowed: application.scopes.clone(),
                });
            }
            requested
        }
        None => application.scopes.clone(),
    };

    let scope = scopes.join(" ");
    let expires = Utc::now() + Duration::seconds(TOKEN_EXPIRY_SECONDS);
    let token_string = crypto::generate_token_string()?;

    let access_token = access_tokens::create_access_token(
        pool,
        &token_string,
        application.user_id,
        application.application_id,
        &scope,
        expires,
    )
    .await?;

    let response = match token_format {
        TokenFormat::Bearer => TokenResponse {
            access_token: access_token.token,
            token_type: "Bearer".to_string(),
            expires_in: TOKEN_EXPIRY_SECONDS as u64,
            scope,
        },
        TokenFormat::Jwt => {
            let payload = AccessTokenPayload {
                access_token: access_token.token,
                expires_in: TOKEN_EXPIRY_SECONDS,
                scope: scope.clone(),
            };
            let jwt =
                jwt::create_jwt_from_token(pool, settings, &payload, &StandardAdapter, None)
                    .await?;

            TokenResponse {
                access_token: jwt,
                token_type: "JWT".to_string(),
                expires_in: TOKEN_EXPIRY_SECONDS as u64,
                scope,
            }
        }
    };

    record_token_issuance(grant_type, "success");
    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{ClientType, GrantType};
    use crate::repositories::users;
    use crate::services::key_management_service;
    use crate::toggles::Toggle;

    fn test_settings(master_key: Vec<u8>) -> JwtSettings {
        JwtSettings {
            issuer: "test-issuer".to_string(),
            audience: "test-aud".to_string(),
            symmetric_secret: "test-secret".to_string(),
            master_key,
            enforce_jwt_scopes: Toggle::new(false),
        }
    }

    async fn create_confidential_client(
        pool: &PgPool,
        client_id: &str,
        secret: &str,
        scopes: &[String],
    ) -> Result<(), DispatchError> {
        let user = users::create_user(pool, "owner", "owner@example.com", true).await?;
        let hash = crypto::hash_client_secret(secret)?;
        applications::create_application(
            pool,
            client_id,
            "confidential app",
            user.user_id,
            "",
            ClientType::Confidential,
            GrantType::ClientCredentials,
            Some(&hash),
            scopes,
        )
        .await?;
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_successful_bearer_issuance(pool: PgPool) -> Result<(), DispatchError> {
        let master_key = crypto::generate_random_bytes(32)?;
        let settings = test_settings(master_key);

        create_confidential_client(
            &pool,
            "conf-client",
            "valid-secret-12345",
            &["email".to_string(), "profile".to_string()],
        )
        .await?;

        let result = issue_access_token(
            &pool,
            &settings,
            "conf-client",
            "valid-secret-12345",
            "client_credentials",
            None,
            TokenFormat::Bearer,
        )
        .await?;

        assert_eq!(result.token_type, "Bearer");
        assert_eq!(result.expires_in, 3600);
        assert!(result.scope.contains("email"));
        assert!(!result.access_token.is_empty());

        // The opaque token must resolve back to a stored record
        let stored = access_tokens::get_by_token(&pool, &result.access_token).await?;
        assert!(stored.is_some());

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_jwt_issuance_symmetric_by_default(pool: PgPool) -> Result<(), DispatchError> {
        let master_key = crypto::generate_random_bytes(32)?;
        key_management_service::initialize_signing_key(&pool, &master_key, "test").await?;
        let settings = test_settings(master_key);

        create_confidential_client(
            &pool,
            "conf-client",
            "valid-secret-12345",
            &["email".to_string(), "profile".to_string()],
        )
        .await?;

        let result = issue_access_token(
            &pool,
            &settings,
            "conf-client",
            "valid-secret-12345",
            "client_credentials",
            None,
            TokenFormat::Jwt,
        )
        .await?;

        assert_eq!(result.token_type, "JWT");

        let claims: crate::crypto::AccessTokenClaims =
            crypto::verify_symmetric(&result.access_token, "test-secret", "test-aud")?;
        assert_eq!(claims.iss, "test-issuer");
        assert!(claims.scopes.contains(&"email".to_string()));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_invalid_secret_rejected(pool: PgPool) -> Result<(), DispatchError> {
        let master_key = crypto::generate_random_bytes(32)?;
        let settings = test_settings(master_key);

        create_confidential_client(
            &pool,
            "conf-client",
            "valid-secret-12345",
            &["email".to_string()],
        )
        .await?;

        let result = issue_access_token(
            &pool,
            &settings,
            "conf-client",
            "wrong-secret",
            "client_credentials",
            None,
            TokenFormat::Bearer,
        )
        .await;

        assert!(matches!(result, Err(DispatchError::InvalidClient)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_unknown_client_same_error_as_bad_secret(
        pool: PgPool,
    ) -> Result<(), DispatchError> {
        let master_key = crypto::generate_random_bytes(32)?;
        let settings = test_settings(master_key);

        let result = issue_access_token(
            &pool,
            &settings,
            "nonexistent-client",
            "some-password",
            "client_credentials",
            None,
            TokenFormat::Bearer,
        )
        .await;

        assert!(matches!(result, Err(DispatchError::InvalidClient)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_invalid_grant_type_rejected(pool: PgPool) -> Result<(), DispatchError> {
        let master_key = crypto::generate_random_bytes(32)?;
        let settings = test_settings(master_key);

        create_confidential_client(
            &pool,
            "conf-client",
            "valid-secret-12345",
            &["email".to_string()],
        )
        .await?;

        let result = issue_access_token(
            &pool,
            &settings,
            "conf-client",
            "valid-secret-12345",
            "password",
            None,
            TokenFormat::Bearer,
        )
        .await;

        assert!(matches!(result, Err(DispatchError::InvalidClient)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_scope_escalation_rejected(pool: PgPool) -> Result<(), DispatchError> {
        let master_key = crypto::generate_random_bytes(32)?;
        let settings = test_settings(master_key);

        create_confidential_client(
            &pool,
            "conf-client",
            "valid-secret-12345",
            &["email".to_string(), "profile".to_string()],
        )
        .await?;

        let result = issue_access_token(
            &pool,
            &settings,
            "conf-client",
            "valid-secret-12345",
            "client_credentials",
            Some("email admin"),
            TokenFormat::Bearer,
        )
        .await;

        assert!(matches!(
            result,
            Err(DispatchError::InsufficientScope { .. })
        ));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_scope_subset_allowed(pool: PgPool) -> Result<(), DispatchError> {
        let master_key = crypto::generate_random_bytes(32)?;
        let settings = test_settings(master_key);

        create_confidential_client(
            &pool,
            "conf-client",
            "valid-secret-12345",
            &["email".to_string(), "profile".to_string()],
        )
        .await?;

        let result = issue_access_token(
            &pool,
            &settings,
            "conf-client",
            "valid-secret-12345",
            "client_credentials",
            Some("email"),
            TokenFormat::Bearer,
        )
        .await?;

        assert_eq!(result.scope, "email");

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_public_client_cannot_use_token_endpoint(
        pool: PgPool,
    ) -> Result<(), DispatchError> {
        let master_key = crypto::generate_random_bytes(32)?;
        let settings = test_settings(master_key);

        let user = users::create_user(&pool, "owner", "owner@example.com", true).await?;
        applications::create_application(
            &pool,
            "public-client",
            "public app",
            user.user_id,
            "",
            ClientType::Public,
            GrantType::AuthorizationCode,
            None,
            &["email".to_string()],
        )
        .await?;

        let result = issue_access_token(
            &pool,
            &settings,
            "public-client",
            "anything",
            "client_credentials",
            None,
            TokenFormat::Bearer,
        )
        .await;

        assert!(matches!(result, Err(DispatchError::InvalidClient)));

        Ok(())
    }
}
