use crate::config::DEFAULT_BCRYPT_COST;
use crate::errors::DispatchError;
use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::{
    aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM},
    rand::{SecureRandom, SystemRandom},
    signature::{Ed25519KeyPair, KeyPair},
};
use secrecy::{ExposeSecret, SecretBox};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Maximum allowed JWT size in bytes.
///
/// Oversized tokens are rejected before base64 decoding or any signature
/// work. Typical tokens issued here are well under 2KB even with a long
/// role list.
const MAX_JWT_SIZE_BYTES: usize = 4096;

/// Claims carried by every access-token JWT.
///
/// `sub`, `preferred_username`, and `email` identify the user and must not
/// leak into logs; the Debug impl redacts them.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub preferred_username: String,
    pub email: String,
    pub email_verified: bool,
    pub scopes: Vec<String>,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl fmt::Debug for AccessTokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenClaims")
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("sub", &"[REDACTED]")
            .field("preferred_username", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("email_verified", &self.email_verified)
            .field("scopes", &self.scopes)
            .field("roles", &self.roles)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Encrypted key structure (AES-256-GCM).
///
/// The ciphertext is wrapped in `SecretBox` so encrypted key material never
/// shows up in logs or debug output.
pub struct EncryptedKey {
    /// Encrypted key material. Use `.expose_secret()` to access the bytes.
    pub encrypted_data: SecretBox<Vec<u8>>,
    pub nonce: Vec<u8>, // 96-bit (12 bytes)
    pub tag: Vec<u8>,   // 128-bit (16 bytes)
}

impl Clone for EncryptedKey {
    fn clone(&self) -> Self {
        Self {
            encrypted_data: SecretBox::new(Box::new(self.encrypted_data.expose_secret().clone())),
            nonce: self.nonce.clone(),
            tag: self.tag.clone(),
        }
    }
}

impl fmt::Debug for EncryptedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedKey")
            .field("encrypted_data", &"[REDACTED]")
            .field("nonce", &"[REDACTED]")
            .field("tag", &"[REDACTED]")
            .finish()
    }
}

/// Generate EdDSA (Ed25519) keypair using CSPRNG
///
/// Returns (public_key_pem, private_key_pkcs8)
#[instrument(skip_all)]
pub fn generate_signing_key() -> Result<(String, Vec<u8>), DispatchError> {
    let rng = SystemRandom::new();

    let pkcs8_bytes = Ed25519KeyPair::generate_pkcs8(&rng)
        .map_err(|e| DispatchError::Crypto(format!("Keypair generation failed: {}", e)))?;

    let key_pair = Ed25519KeyPair::from_pkcs8(pkcs8_bytes.as_ref())
        .map_err(|e| DispatchError::Crypto(format!("Keypair parsing failed: {}", e)))?;

    let public_key_bytes = key_pair.public_key().as_ref();

    let public_key_pem = format!(
        "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
        general_purpose::STANDARD.encode(public_key_bytes)
    );

    Ok((public_key_pem, pkcs8_bytes.as_ref().to_vec()))
}

/// Encrypt private key with AES-256-GCM
///
/// Uses a 96-bit random nonce and produces a 128-bit authentication tag
#[instrument(skip_all)]
pub fn encrypt_private_key(
    private_key: &[u8],
    master_key: &[u8],
) -> Result<EncryptedKey, DispatchError> {
    if master_key.len() != 32 {
        return Err(DispatchError::Crypto(format!(
            "Invalid master key length: {} (expected 32)",
            master_key.len()
        )));
    }

    let rng = SystemRandom::new();

    let mut nonce_bytes = [0u8; 12];
    rng.fill(&mut nonce_bytes)
        .map_err(|e| DispatchError::Crypto(format!("Nonce generation failed: {}", e)))?;

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let unbound_key = UnboundKey::new(&AES_256_GCM, master_key)
        .map_err(|e| DispatchError::Crypto(format!("Cipher key creation failed: {}", e)))?;
    let sealing_key = LessSafeKey::new(unbound_key);

    // seal_in_place_append_tag leaves ciphertext + 16-byte tag in the buffer
    let mut in_out = private_key.to_vec();
    sealing_key
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|e| DispatchError::Crypto(format!("Encryption operation failed: {}", e)))?;

    let tag_start = in_out
        .len()
        .checked_sub(16)
        .ok_or_else(|| DispatchError::Crypto("Encryption produced invalid output".to_string()))?;
    let encrypted_data = in_out
        .get(..tag_start)
        .ok_or_else(|| DispatchError::Crypto("Encryption produced invalid output".to_string()))?
        .to_vec();
    let tag = in_out
        .get(tag_start..)
        .ok_or_else(|| DispatchError::Crypto("Encryption produced invalid output".to_string()))?
        .to_vec();

    Ok(EncryptedKey {
        encrypted_data: SecretBox::new(Box::new(encrypted_data)),
        nonce: nonce_bytes.to_vec(),
        tag,
    })
}

/// Decrypt private key with AES-256-GCM
#[instrument(skip_all)]
pub fn decrypt_private_key(
    encrypted: &EncryptedKey,
    master_key: &[u8],
) -> Result<Vec<u8>, DispatchError> {
    if master_key.len() != 32 {
        return Err(DispatchError::Crypto(format!(
            "Invalid master key length: {} (expected 32)",
            master_key.len()
        )));
    }

    if encrypted.nonce.len() != 12 {
        return Err(DispatchError::Crypto(format!(
            "Invalid nonce length: {} (expected 12)",
            encrypted.nonce.len()
        )));
    }

    if encrypted.tag.len() != 16 {
        return Err(DispatchError::Crypto(format!(
            "Invalid tag length: {} (expected 16)",
            encrypted.tag.len()
        )));
    }

    // Reconstruct ciphertext with tag
    let mut in_out = encrypted.encrypted_data.expose_secret().clone();
    in_out.extend_from_slice(&encrypted.tag);

    let nonce_bytes: [u8; 12] = encrypted
        .nonce
        .as_slice()
        .try_into()
        .map_err(|e| DispatchError::Crypto(format!("Invalid nonce format: {}", e)))?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let unbound_key = UnboundKey::new(&AES_256_GCM, master_key)
        .map_err(|e| DispatchError::Crypto(format!("Cipher key creation failed: {}", e)))?;
    let opening_key = LessSafeKey::new(unbound_key);

    let decrypted = opening_key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|e| DispatchError::Crypto(format!("Decryption operation failed: {}", e)))?;

    Ok(decrypted.to_vec())
}

/// Sign claims asymmetrically (EdDSA) with the given private key.
///
/// The `kid` header identifies the signing key for JWKS consumers.
#[instrument(skip_all)]
pub fn sign_asymmetric<T: Serialize>(
    claims: &T,
    private_key_pkcs8: &[u8],
    key_id: &str,
) -> Result<String, DispatchError> {
    // Validate the private key format before handing it to jsonwebtoken
    let _key_pair = Ed25519KeyPair::from_pkcs8(private_key_pkcs8)
        .map_err(|e| DispatchError::Crypto(format!("Invalid private key format: {}", e)))?;

    let encoding_key = EncodingKey::from_ed_der(private_key_pkcs8);

    let mut header = Header::new(Algorithm::EdDSA);
    header.typ = Some("JWT".to_string());
    header.kid = Some(key_id.to_string());

    let token = encode(&header, claims, &encoding_key)
        .map_err(|e| DispatchError::Crypto(format!("JWT signing operation failed: {}", e)))?;

    Ok(token)
}

/// Sign claims symmetrically (HS256) with the shared secret.
#[instrument(skip_all)]
pub fn sign_symmetric<T: Serialize>(claims: &T, secret: &str) -> Result<String, DispatchError> {
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::new(Algorithm::HS256);

    let token = encode(&header, claims, &encoding_key)
        .map_err(|e| DispatchError::Crypto(format!("JWT signing operation failed: {}", e)))?;

    Ok(token)
}

/// Verify an asymmetrically signed JWT against an Ed25519 public key.
///
/// Validates token size, signature, expiry, and audience.
#[instrument(skip_all)]
pub fn verify_asymmetric<T: DeserializeOwned>(
    token: &str,
    public_key_pem: &str,
    audience: &str,
) -> Result<T, DispatchError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        return Err(DispatchError::InvalidToken(
            "The access token is invalid or expired".to_string(),
        ));
    }

    // Extract base64 from PEM format
    let public_key_b64 = public_key_pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect::<String>();

    let public_key_bytes = general_purpose::STANDARD
        .decode(&public_key_b64)
        .map_err(|e| {
            tracing::debug!(target: "crypto", error = %e, "Invalid public key encoding");
            DispatchError::InvalidToken("The access token is invalid or expired".to_string())
        })?;

    let decoding_key = DecodingKey::from_ed_der(&public_key_bytes);

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_audience(&[audience]);

    let token_data = decode::<T>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "crypto", error = %e, "Token verification failed");
        DispatchError::InvalidToken("The access token is invalid or expired".to_string())
    })?;

    Ok(token_data.claims)
}

/// Verify a symmetrically signed JWT against the shared secret.
#[instrument(skip_all)]
pub fn verify_symmetric<T: DeserializeOwned>(
    token: &str,
    secret: &str,
    audience: &str,
) -> Result<T, DispatchError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        return Err(DispatchError::InvalidToken(
            "The access token is invalid or expired".to_string(),
        ));
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    let token_data = decode::<T>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "crypto", error = %e, "Token verification failed");
        DispatchError::InvalidToken("The access token is invalid or expired".to_string())
    })?;

    Ok(token_data.claims)
}

/// Hash a client secret with bcrypt.
#[instrument(skip_all)]
pub fn hash_client_secret(secret: &str) -> Result<String, DispatchError> {
    bcrypt::hash(secret, DEFAULT_BCRYPT_COST)
        .map_err(|e| DispatchError::Crypto(format!("Secret hashing failed: {}", e)))
}

/// Verify a client secret against its bcrypt hash.
#[instrument(skip_all)]
pub fn verify_client_secret(secret: &str, hash: &str) -> Result<bool, DispatchError> {
    bcrypt::verify(secret, hash)
        .map_err(|e| DispatchError::Crypto(format!("Secret verification failed: {}", e)))
}

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, DispatchError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| DispatchError::Crypto(format!("Random bytes generation failed: {}", e)))?;
    Ok(bytes)
}

/// Generate an opaque access-token string (32 random bytes, base64url).
pub fn generate_token_string() -> Result<String, DispatchError> {
    let bytes = generate_random_bytes(32)?;
    Ok(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}
