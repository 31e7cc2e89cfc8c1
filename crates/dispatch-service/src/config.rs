use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default bcrypt cost for client secret hashing (~200ms per hash).
pub const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// 32-byte key protecting asymmetric private keys at rest.
    pub master_key: Vec<u8>,
    /// Issuer (`iss`) claim stamped on every JWT.
    pub issuer: String,
    /// Default audience (`aud`) claim.
    pub audience: String,
    /// Shared secret for symmetric (HS256) signing.
    pub symmetric_secret: String,
    /// Default state of the scope-enforcement toggle.
    pub enforce_jwt_scopes: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid master key format: {0}")]
    InvalidMasterKey(String),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8083".to_string());

        let master_key_base64 = vars
            .get("DISPATCH_MASTER_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("DISPATCH_MASTER_KEY".to_string()))?;

        let master_key = general_purpose::STANDARD
            .decode(master_key_base64)
            .map_err(ConfigError::Base64Error)?;

        if master_key.len() != 32 {
            return Err(ConfigError::InvalidMasterKey(format!(
                "Expected 32 bytes, got {}",
                master_key.len()
            )));
        }

        let issuer = vars
            .get("JWT_ISSUER")
            .cloned()
            .unwrap_or_else(|| "oauth-dispatch".to_string());

        let audience = vars
            .get("JWT_AUDIENCE")
            .cloned()
            .unwrap_or_else(|| "platform-api".to_string());

        let symmetric_secret = vars
            .get("JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?
            .clone();

        let enforce_jwt_scopes = vars
            .get("ENFORCE_JWT_SCOPES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Config {
            database_url,
            bind_address,
            master_key,
            issuer,
            audience,
            symmetric_secret,
            enforce_jwt_scopes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn test_master_key_base64() -> String {
        general_purpose::STANDARD.encode([0u8; 32])
    }

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://localhost/dispatch".to_string(),
            ),
            ("DISPATCH_MASTER_KEY".to_string(), test_master_key_base64()),
            ("JWT_SECRET".to_string(), "test-secret".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_success() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("JWT_ISSUER".to_string(), "https://auth.test".to_string());
        vars.insert("ENFORCE_JWT_SCOPES".to_string(), "true".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.database_url, "postgresql://localhost/dispatch");
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.master_key.len(), 32);
        assert_eq!(config.issuer, "https://auth.test");
        assert_eq!(config.audience, "platform-api");
        assert!(config.enforce_jwt_scopes);
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.bind_address, "0.0.0.0:8083");
        assert_eq!(config.issuer, "oauth-dispatch");
        assert_eq!(config.audience, "platform-api");
        assert!(!config.enforce_jwt_scopes);
    }

    #[test]
    fn test_from_vars_missing_database_url() {
        let mut vars = base_vars();
        vars.remove("DATABASE_URL");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn test_from_vars_missing_master_key() {
        let mut vars = base_vars();
        vars.remove("DISPATCH_MASTER_KEY");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "DISPATCH_MASTER_KEY"));
    }

    #[test]
    fn test_from_vars_missing_secret() {
        let mut vars = base_vars();
        vars.remove("JWT_SECRET");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "JWT_SECRET"));
    }

    #[test]
    fn test_from_vars_invalid_base64() {
        let mut vars = base_vars();
        vars.insert(
            "DISPATCH_MASTER_KEY".to_string(),
            "not-valid-base64!@#$".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::Base64Error(_))));
    }

    #[test]
    fn test_from_vars_master_key_too_short() {
        let mut vars = base_vars();
        vars.insert(
            "DISPATCH_MASTER_KEY".to_string(),
            general_purpose::STANDARD.encode([0u8; 16]),
        );

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidMasterKey(_))));
    }
}
