use crate::crypto;
use crate::errors::DispatchError;
use crate::models::{Jwks, JsonWebKey};
use crate::repositories::signing_keys;
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use sqlx::PgPool;

const KEY_VALIDITY_DAYS: i64 = 365; // 1 year

/// Get the next sequence number for a key with given prefix
async fn get_next_key_sequence(pool: &PgPool, prefix: &str) -> Result<u32, DispatchError> {
    let count: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM signing_keys
        WHERE key_id LIKE $1
        "#,
    )
    .bind(format!("{}%", prefix))
    .fetch_one(pool)
    .await
    .map_err(|e| DispatchError::Database(format!("Failed to count keys: {}", e)))?;

    Ok((count.0 + 1) as u32)
}

/// Initialize the first signing key if none exists
///
/// Idempotent; called at startup so asymmetric signing is always possible.
pub async fn initialize_signing_key(
    pool: &PgPool,
    master_key: &[u8],
    cluster_name: &str,
) -> Result<(), DispatchError> {
    let active_key = signing_keys::get_active_key(pool).await?;

    if active_key.is_some() {
        return Ok(());
    }

    // key_id format: 'dispatch-{cluster}-{YYYY}-{NN}'
    let now = Utc::now();
    let key_prefix = format!("dispatch-{}-{}-", cluster_name, now.format("%Y"));
    let sequence = get_next_key_sequence(pool, &key_prefix).await?;
    let key_id = format!("{}{:02}", key_prefix, sequence);

    let (public_key_pem, private_key_pkcs8) = crypto::generate_signing_key()?;
    let encrypted = crypto::encrypt_private_key(&private_key_pkcs8, master_key)?;

    let valid_from = now;
    let valid_until = now + Duration::days(KEY_VALIDITY_DAYS);

    use secrecy::ExposeSecret;
    signing_keys::create_signing_key(
        pool,
        &key_id,
        &public_key_pem,
        encrypted.encrypted_data.expose_secret(),
        &encrypted.nonce,
        &encrypted.tag,
        1, // master_key_version
        valid_from,
        valid_until,
    )
    .await?;

    tracing::info!(key_id = %key_id, "Generated initial signing key");

    Ok(())
}

/// Get JWKS (JSON Web Key Set) for public key distribution
///
/// Returns all active public keys in RFC 7517 format
pub async fn get_jwks(pool: &PgPool) -> Result<Jwks, DispatchError> {
    let keys = signing_keys::get_all_active_keys(pool).await?;

    let json_web_keys: Vec<JsonWebKey> = keys
        .into_iter()
        .filter_map(|key| {
            // Extract base64 from PEM and re-encode as base64url for JWKS
            let public_key_b64 = key
                .public_key
                .lines()
                .filter(|line| !line.starts_with("-----"))
                .collect::<String>();

            let public_key_bytes = match general_purpose::STANDARD.decode(&public_key_b64) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(key_id = %key.key_id, error = %e, "Skipping key with invalid PEM");
                    return None;
                }
            };

            Some(JsonWebKey {
                kid: key.key_id,
                kty: "OKP".to_string(),
                crv: "Ed25519".to_string(),
                x: general_purpose::URL_SAFE_NO_PAD.encode(public_key_bytes),
                use_: "sig".to_string(),
                alg: "EdDSA".to_string(),
            })
        })
        .collect();

    Ok(Jwks {
        keys: json_web_keys,
    })
}
