//! OAuth backend adapters.
//!
//! The dispatch layer serves two OAuth backends through one seam: the
//! standard backend (current registrations, restricted-application aware)
//! and the legacy backend kept alive for integrations that predate
//! restricted registrations. JWT assembly only ever talks to the trait.

use crate::errors::DispatchError;
use crate::models::{AccessToken, Application, ClientType, GrantType, User};
use crate::repositories::{access_tokens, applications, users};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait OAuthAdapter: Send + Sync {
    /// Register a public client owned by the given user.
    async fn create_public_client(
        &self,
        pool: &PgPool,
        name: &str,
        user_id: Uuid,
        redirect_uri: &str,
        client_id: &str,
    ) -> Result<Application, DispatchError>;

    /// Resolve an opaque access-token string to its record.
    async fn get_access_token(
        &self,
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<AccessToken>, DispatchError>;

    /// Resolve the user an access token was issued to.
    async fn get_token_user(
        &self,
        pool: &PgPool,
        access_token: &AccessToken,
    ) -> Result<Option<User>, DispatchError>;

    /// Whether the token's client is registered as restricted.
    async fn is_client_restricted(
        &self,
        pool: &PgPool,
        application_id: Uuid,
    ) -> Result<bool, DispatchError>;

    /// Create an access token directly, bypassing the token endpoint.
    ///
    /// Test-support constructor used by fixtures and the integration suite.
    async fn create_access_token_for_test(
        &self,
        pool: &PgPool,
        token: &str,
        application: &Application,
        user_id: Uuid,
        expires: DateTime<Utc>,
    ) -> Result<AccessToken, DispatchError>;
}

/// Adapter for the standard OAuth backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAdapter;

#[async_trait]
impl OAuthAdapter for StandardAdapter {
    async fn create_public_client(
        &self,
        pool: &PgPool,
        name: &str,
        user_id: Uuid,
        redirect_uri: &str,
        client_id: &str,
    ) -> Result<Application, DispatchError> {
        applications::create_application(
            pool,
            client_id,
            name,
            user_id,
            redirect_uri,
            ClientType::Public,
            GrantType::AuthorizationCode,
            None,
            &["email".to_string(), "profile".to_string()],
        )
        .await
    }

    async fn get_access_token(
        &self,
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<AccessToken>, DispatchError> {
        access_tokens::get_by_token(pool, token).await
    }

    async fn get_token_user(
        &self,
        pool: &PgPool,
        access_token: &AccessToken,
    ) -> Result<Option<User>, DispatchError> {
        users::get_by_id(pool, access_token.user_id).await
    }

    async fn is_client_restricted(
        &self,
        pool: &PgPool,
        application_id: Uuid,
    ) -> Result<bool, DispatchError> {
        applications::is_restricted(pool, application_id).await
    }

    async fn create_access_token_for_test(
        &self,
        pool: &PgPool,
        token: &str,
        application: &Application,
        user_id: Uuid,
        expires: DateTime<Utc>,
    ) -> Result<AccessToken, DispatchError> {
        access_tokens::create_access_token(
            pool,
            token,
            user_id,
            application.application_id,
            "email profile",
            expires,
        )
        .await
    }
}

/// Adapter for the legacy OAuth backend.
///
/// Legacy registrations predate the restricted-application policy, so
/// restricted lookup is always false and legacy tokens are always
/// symmetrically signed under auto-selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyAdapter;

#[async_trait]
impl OAuthAdapter for LegacyAdapter {
    async fn create_public_client(
        &self,
        pool: &PgPool,
        name: &str,
        user_id: Uuid,
        redirect_uri: &str,
        client_id: &str,
    ) -> Result<Application, DispatchError> {
        applications::create_application(
            pool,
            client_id,
            name,
            user_id,
            redirect_uri,
            ClientType::Public,
            GrantType::Password,
            None,
            &["email".to_string(), "profile".to_string()],
        )
        .await
    }

    async fn get_access_token(
        &self,
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<AccessToken>, DispatchError> {
        access_tokens::get_by_token(pool, token).await
    }

    async fn get_token_user(
        &self,
        pool: &PgPool,
        access_token: &AccessToken,
    ) -> Result<Option<User>, DispatchError> {
        users::get_by_id(pool, access_token.user_id).await
    }

    async fn is_client_restricted(
        &self,
        _pool: &PgPool,
        _application_id: Uuid,
    ) -> Result<bool, DispatchError> {
        Ok(false)
    }

    async fn create_access_token_for_test(
        &self,
        pool: &PgPool,
        token: &str,
        application: &Application,
        user_id: Uuid,
        expires: DateTime<Utc>,
    ) -> Result<AccessToken, DispatchError> {
        access_tokens::create_access_token(
            pool,
            token,
            user_id,
            application.application_id,
            "email profile",
            expires,
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_standard_adapter_restricted_lookup(pool: PgPool) -> Result<(), DispatchError> {
        let adapter = StandardAdapter;
        let user = users::create_user(&pool, "jdoe", "jdoe@example.com", true).await?;

        let app = adapter
            .create_public_client(&pool, "public app", user.user_id, "", "public-client-id")
            .await?;

        assert!(!adapter.is_client_restricted(&pool, app.application_id).await?);

        applications::mark_restricted(&pool, app.application_id).await?;
        assert!(adapter.is_client_restricted(&pool, app.application_id).await?);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_legacy_adapter_never_restricted(pool: PgPool) -> Result<(), DispatchError> {
        let adapter = LegacyAdapter;
        let user = users::create_user(&pool, "jdoe", "jdoe@example.com", true).await?;

        let app = adapter
            .create_public_client(&pool, "legacy app", user.user_id, "", "legacy-client-id")
            .await?;

        // Even an explicit restricted marker is ignored by the legacy backend
        applications::mark_restricted(&pool, app.application_id).await?;
        assert!(!adapter.is_client_restricted(&pool, app.application_id).await?);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_token_round_trip_through_adapter(pool: PgPool) -> Result<(), DispatchError> {
        let adapter = StandardAdapter;
        let user = users::create_user(&pool, "jdoe", "jdoe@example.com", true).await?;
        let app = adapter
            .create_public_client(&pool, "public app", user.user_id, "", "public-client-id")
            .await?;

        let expires = Utc::now() + Duration::hours(1);
        let created = adapter
            .create_access_token_for_test(&pool, "token", &app, user.user_id, expires)
            .await?;

        let fetched = adapter.get_access_token(&pool, "token").await?;
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().token_id, created.token_id);

        let token_user = adapter.get_token_user(&pool, &created).await?;
        assert!(token_user.is_some());
        assert_eq!(token_user.unwrap().user_id, user.user_id);

        Ok(())
    }
}
