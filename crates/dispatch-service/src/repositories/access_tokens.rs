use crate::errors::DispatchError;
use crate::models::AccessToken;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Persist a new access token.
pub async fn create_access_token(
    pool: &PgPool,
    token: &str,
    user_id: Uuid,
    application_id: Uuid,
    scope: &str,
    expires: DateTime<Utc>,
) -> Result<AccessToken, DispatchError> {
    let access_token = sqlx::query_as::<_, AccessToken>(
        r#"
        INSERT INTO access_tokens (token, user_id, application_id, scope, expires)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING token_id, token, user_id, application_id, scope, expires, created_at
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(application_id)
    .bind(scope)
    .bind(expires)
    .fetch_one(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to create access token: {}", e)))?;

    Ok(access_token)
}

/// Look up an access token by its opaque token string.
pub async fn get_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<AccessToken>, DispatchError> {
    let access_token = sqlx::query_as::<_, AccessToken>(
        r#"
        SELECT token_id, token, user_id, application_id, scope, expires, created_at
        FROM access_tokens
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to fetch access token: {}", e)))?;

    Ok(access_token)
}

/// Delete tokens past their expiry. Returns the number of rows removed.
pub async fn purge_expired(pool: &PgPool) -> Result<u64, DispatchError> {
    let result = sqlx::query(
        r#"
        DELETE FROM access_tokens
        WHERE expires <= NOW()
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to purge expired tokens: {}", e)))?;

    Ok(result.rows_affected())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{ClientType, GrantType};
    use crate::repositories::{applications, users};
    use chrono::Duration;

    async fn test_fixture(pool: &PgPool) -> (Uuid, Uuid) {
        let user = users::create_user(pool, "jdoe", "jdoe@example.com", true)
            .await
            .expect("user creation should succeed");
        let app = applications::create_application(
            pool,
            "client-1",
            "app",
            user.user_id,
            "",
            ClientType::Public,
            GrantType::AuthorizationCode,
            None,
            &["email".to_string()],
        )
        .await
        .expect("application creation should succeed");
        (user.user_id, app.application_id)
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_and_fetch_token(pool: PgPool) -> Result<(), DispatchError> {
        let (user_id, application_id) = test_fixture(&pool).await;
        let expires = Utc::now() + Duration::hours(1);

        let token = create_access_token(
            &pool,
            "opaque-token",
            user_id,
            application_id,
            "email profile",
            expires,
        )
        .await?;

        assert_eq!(token.scope, "email profile");
        assert_eq!(token.expires.timestamp(), expires.timestamp());

        let fetched = get_by_token(&pool, "opaque-token").await?;
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().user_id, user_id);

        let missing = get_by_token(&pool, "no-such-token").await?;
        assert!(missing.is_none());

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_purge_expired(pool: PgPool) -> Result<(), DispatchError> {
        let (user_id, application_id) = test_fixture(&pool).await;

        create_access_token(
            &pool,
            "live-token",
            user_id,
            application_id,
            "email",
            Utc::now() + Duration::hours(1),
        )
        .await?;
        create_access_token(
            &pool,
            "dead-token",
            user_id,
            application_id,
            "email",
            Utc::now() - Duration::hours(1),
        )
        .await?;

        let purged = purge_expired(&pool).await?;
        assert_eq!(purged, 1);

        assert!(get_by_token(&pool, "live-token").await?.is_some());
        assert!(get_by_token(&pool, "dead-token").await?.is_none());

        Ok(())
    }
}
