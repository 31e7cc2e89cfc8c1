use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Platform user (maps to users table).
///
/// `is_active` doubles as the email-verification flag and is mirrored into
/// the `email_verified` JWT claim.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// OAuth client registration (maps to applications table).
#[derive(Debug, Clone, FromRow)]
pub struct Application {
    pub application_id: Uuid,
    pub client_id: String,
    pub name: String,
    pub user_id: Uuid,
    pub redirect_uri: String,
    pub client_type: String,
    pub authorization_grant_type: String,
    pub client_secret_hash: Option<String>,
    pub scopes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Opaque access token (maps to access_tokens table).
#[derive(Debug, Clone, FromRow)]
pub struct AccessToken {
    pub token_id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub application_id: Uuid,
    pub scope: String,
    pub expires: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Enterprise tenant (maps to enterprise_customers table).
#[derive(Debug, Clone, FromRow)]
pub struct EnterpriseCustomer {
    pub customer_id: Uuid,
    pub name: String,
    pub site_id: i32,
    pub created_at: DateTime<Utc>,
}

/// System-wide enterprise role (maps to enterprise_roles table).
#[derive(Debug, Clone, FromRow)]
pub struct EnterpriseRole {
    pub role_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Signing key model (maps to signing_keys table).
#[derive(Debug, Clone, FromRow)]
pub struct SigningKey {
    pub key_id: String,
    pub public_key: String,
    pub private_key_encrypted: Vec<u8>,
    pub encryption_nonce: Vec<u8>,
    pub encryption_tag: Vec<u8>,
    pub encryption_algorithm: String,
    pub master_key_version: i32,
    pub algorithm: String,
    pub is_active: bool,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Token endpoint response (OAuth 2.0 compliant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub scope: String,
}

/// JWKS response (RFC 7517)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<JsonWebKey>,
}

/// JSON Web Key (RFC 7517)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kid: String, // Key ID
    pub kty: String, // Key Type (e.g., "OKP" for EdDSA)
    pub crv: String, // Curve (e.g., "Ed25519")
    pub x: String,   // Public key (base64url encoded)
    #[serde(rename = "use")]
    pub use_: String, // Public key use (e.g., "sig")
    pub alg: String, // Algorithm (e.g., "EdDSA")
}

/// OAuth client type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientType {
    Public,
    Confidential,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Public => "public",
            ClientType::Confidential => "confidential",
        }
    }
}

impl FromStr for ClientType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(ClientType::Public),
            "confidential" => Ok(ClientType::Confidential),
            _ => Err(format!("Invalid client type: {}", s)),
        }
    }
}

/// OAuth authorization grant type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    Password,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization-code",
            GrantType::ClientCredentials => "client-credentials",
            GrantType::Password => "password",
        }
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization-code" => Ok(GrantType::AuthorizationCode),
            "client-credentials" => Ok(GrantType::ClientCredentials),
            "password" => Ok(GrantType::Password),
            _ => Err(format!("Invalid grant type: {}", s)),
        }
    }
}

/// Requested format for the token endpoint response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFormat {
    Bearer,
    Jwt,
}

impl FromStr for TokenFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bearer" => Ok(TokenFormat::Bearer),
            "jwt" => Ok(TokenFormat::Jwt),
            _ => Err(format!("Invalid token format: {}", s)),
        }
    }
}
