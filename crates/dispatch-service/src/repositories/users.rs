use crate::errors::DispatchError;
use crate::models::User;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new user.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    is_active: bool,
) -> Result<User, DispatchError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, is_active)
        VALUES ($1, $2, $3)
        RETURNING user_id, username, email, is_active, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(is_active)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("users_username_key") {
            DispatchError::Database("User with this username already exists".to_string())
        } else {
            DispatchError::Database(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(user)
}

/// Get user by user_id.
pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, DispatchError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, username, email, is_active, created_at, updated_at
        FROM users
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to fetch user by id: {}", e)))?;

    Ok(user)
}

/// Flip the activation (email-verification) flag.
pub async fn set_active(pool: &PgPool, user_id: Uuid, is_active: bool) -> Result<(), DispatchError> {
    sqlx::query(
        r#"
        UPDATE users
        SET is_active = $2, updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(is_active)
    .execute(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to update user activation: {}", e)))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_and_fetch_user(pool: PgPool) -> Result<(), DispatchError> {
        let user = create_user(&pool, "jdoe", "jdoe@example.com", true).await?;

        assert_eq!(user.username, "jdoe");
        assert_eq!(user.email, "jdoe@example.com");
        assert!(user.is_active);

        let fetched = get_by_id(&pool, user.user_id).await?;
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().username, "jdoe");

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_duplicate_username_rejected(pool: PgPool) -> Result<(), DispatchError> {
        create_user(&pool, "jdoe", "jdoe@example.com", true).await?;
        let result = create_user(&pool, "jdoe", "other@example.com", false).await;

        assert!(matches!(result, Err(DispatchError::Database(msg)) if msg.contains("already exists")));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_set_active(pool: PgPool) -> Result<(), DispatchError> {
        let user = create_user(&pool, "jdoe", "jdoe@example.com", true).await?;

        set_active(&pool, user.user_id, false).await?;

        let fetched = get_by_id(&pool, user.user_id).await?.unwrap();
        assert!(!fetched.is_active);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_get_by_id_missing(pool: PgPool) -> Result<(), DispatchError> {
        let fetched = get_by_id(&pool, Uuid::new_v4()).await?;
        assert!(fetched.is_none());
        Ok(())
    }
}
