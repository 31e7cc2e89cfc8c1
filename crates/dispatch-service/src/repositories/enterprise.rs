//! Enterprise tenancy: customers, user associations, and role assignments.
//!
//! Role strings rendered here feed the `roles` JWT claim directly.

use crate::errors::DispatchError;
use crate::models::{EnterpriseCustomer, EnterpriseRole};
use sqlx::PgPool;
use uuid::Uuid;

/// Create an enterprise customer with an explicit uuid.
///
/// The uuid is caller-supplied because it is the tenant identifier embedded
/// in role claims and must survive re-provisioning.
pub async fn create_customer(
    pool: &PgPool,
    customer_id: Uuid,
    name: &str,
    site_id: i32,
) -> Result<EnterpriseCustomer, DispatchError> {
    let customer = sqlx::query_as::<_, EnterpriseCustomer>(
        r#"
        INSERT INTO enterprise_customers (customer_id, name, site_id)
        VALUES ($1, $2, $3)
        RETURNING customer_id, name, site_id, created_at
        "#,
    )
    .bind(customer_id)
    .bind(name)
    .bind(site_id)
    .fetch_one(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to create enterprise customer: {}", e)))?;

    Ok(customer)
}

/// Associate a user with an enterprise customer.
pub async fn link_user(
    pool: &PgPool,
    user_id: Uuid,
    customer_id: Uuid,
) -> Result<(), DispatchError> {
    sqlx::query(
        r#"
        INSERT INTO enterprise_customer_users (user_id, customer_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, customer_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(customer_id)
    .execute(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to link enterprise user: {}", e)))?;

    Ok(())
}

/// Create a system-wide enterprise role.
pub async fn create_role(pool: &PgPool, name: &str) -> Result<EnterpriseRole, DispatchError> {
    let role = sqlx::query_as::<_, EnterpriseRole>(
        r#"
        INSERT INTO enterprise_roles (name)
        VALUES ($1)
        RETURNING role_id, name, created_at
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to create enterprise role: {}", e)))?;

    Ok(role)
}

/// Assign a system-wide role to a user.
pub async fn assign_role(pool: &PgPool, user_id: Uuid, role_id: Uuid) -> Result<(), DispatchError> {
    sqlx::query(
        r#"
        INSERT INTO enterprise_role_assignments (user_id, role_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, role_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(role_id)
    .execute(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to assign enterprise role: {}", e)))?;

    Ok(())
}

/// Render "{role_name}:{customer_id}" for every role assignment the user
/// holds under their enterprise-customer association.
///
/// Users without an association get an empty list; the join eliminates
/// assignments that have no customer to scope them to.
pub async fn get_role_strings(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, DispatchError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT er.name || ':' || ec.customer_id::text
        FROM enterprise_role_assignments era
        JOIN enterprise_roles er ON er.role_id = era.role_id
        JOIN enterprise_customer_users ecu ON ecu.user_id = era.user_id
        JOIN enterprise_customers ec ON ec.customer_id = ecu.customer_id
        WHERE era.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to fetch enterprise roles: {}", e)))?;

    Ok(rows.into_iter().map(|(s,)| s).collect())
}
