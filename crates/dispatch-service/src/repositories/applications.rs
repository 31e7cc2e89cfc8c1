use crate::errors::DispatchError;
use crate::models::{Application, ClientType, GrantType};
use sqlx::PgPool;
use uuid::Uuid;

/// Register a new OAuth application.
///
/// `client_secret_hash` is None for public clients.
#[expect(clippy::too_many_arguments)] // Represents all registration fields
pub async fn create_application(
    pool: &PgPool,
    client_id: &str,
    name: &str,
    user_id: Uuid,
    redirect_uri: &str,
    client_type: ClientType,
    grant_type: GrantType,
    client_secret_hash: Option<&str>,
    scopes: &[String],
) -> Result<Application, DispatchError> {
    let application = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications (
            client_id, name, user_id, redirect_uri,
            client_type, authorization_grant_type, client_secret_hash, scopes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING
            application_id, client_id, name, user_id, redirect_uri,
            client_type, authorization_grant_type, client_secret_hash, scopes,
            created_at, updated_at
        "#,
    )
    .bind(client_id)
    .bind(name)
    .bind(user_id)
    .bind(redirect_uri)
    .bind(client_type.as_str())
    .bind(grant_type.as_str())
    .bind(client_secret_hash)
    .bind(scopes)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("applications_client_id_key") {
            DispatchError::Database("Application with this client_id already exists".to_string())
        } else {
            DispatchError::Database(format!("Failed to create application: {}", e))
        }
    })?;

    Ok(application)
}

/// Get application by client_id.
pub async fn get_by_client_id(
    pool: &PgPool,
    client_id: &str,
) -> Result<Option<Application>, DispatchError> {
    let application = sqlx::query_as::<_, Application>(
        r#"
        SELECT
            application_id, client_id, name, user_id, redirect_uri,
            client_type, authorization_grant_type, client_secret_hash, scopes,
            created_at, updated_at
        FROM applications
        WHERE client_id = $1
        "#,
    )
    .bind(client_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        DispatchError::Database(format!("Failed to fetch application by client_id: {}", e))
    })?;

    Ok(application)
}

/// Get application by application_id.
pub async fn get_by_id(
    pool: &PgPool,
    application_id: Uuid,
) -> Result<Option<Application>, DispatchError> {
    let application = sqlx::query_as::<_, Application>(
        r#"
        SELECT
            application_id, client_id, name, user_id, redirect_uri,
            client_type, authorization_grant_type, client_secret_hash, scopes,
            created_at, updated_at
        FROM applications
        WHERE application_id = $1
        "#,
    )
    .bind(application_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to fetch application: {}", e)))?;

    Ok(application)
}

/// Flag an application as restricted (stricter signing policy).
pub async fn mark_restricted(pool: &PgPool, application_id: Uuid) -> Result<(), DispatchError> {
    sqlx::query(
        r#"
        INSERT INTO restricted_applications (application_id)
        VALUES ($1)
        ON CONFLICT (application_id) DO NOTHING
        "#,
    )
    .bind(application_id)
    .execute(pool)
    .await
    .map_err(|e| {
        DispatchError::Database(format!("Failed to mark application restricted: {}", e))
    })?;

    Ok(())
}

/// Check whether an application is registered as restricted.
pub async fn is_restricted(pool: &PgPool, application_id: Uuid) -> Result<bool, DispatchError> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT application_id
        FROM restricted_applications
        WHERE application_id = $1
        "#,
    )
    .bind(application_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to check restricted status: {}", e)))?;

    Ok(row.is_some())
}
