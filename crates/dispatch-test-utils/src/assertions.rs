//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued JWTs.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default)]
    pub kid: Option<String>,
}

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub scopes: Vec<String>,
}

/// Custom assertions for issued JWTs
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_symmetrically_signed()
///     .assert_has_scope("email");
/// ```
pub trait JwtAssertions {
    /// Assert that the token is a valid JWT format
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert HS256 signing (no key id in the header)
    fn assert_symmetrically_signed(&self) -> &Self;

    /// Assert EdDSA signing with a key id in the header
    fn assert_asymmetrically_signed(&self) -> &Self;

    /// Assert that the token contains the specified scope
    fn assert_has_scope(&self, scope: &str) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert that the token carries the specified audience
    fn assert_audience(&self, audience: &str) -> &Self;

    /// Assert that the token expires within the specified seconds
    fn assert_expires_within(&self, seconds: i64) -> &Self;
}

fn decode_header(token: &str) -> JwtHeader {
    let parts: Vec<_> = token.split('.').collect();
    assert_eq!(
        parts.len(),
        3,
        "JWT must have 3 parts (header.payload.signature), got {}",
        parts.len()
    );

    let header_bytes = URL_SAFE_NO_PAD
        .decode(parts[0])
        .expect("Failed to base64 decode JWT header");
    serde_json::from_slice(&header_bytes).expect("Failed to parse JWT header JSON")
}

fn decode_claims(token: &str) -> JwtClaims {
    let parts: Vec<_> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "JWT must have 3 parts");

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .expect("Failed to base64 decode JWT payload");
    serde_json::from_slice(&payload_bytes).expect("Failed to parse JWT claims JSON")
}

impl JwtAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let header = decode_header(self);
        assert_eq!(header.typ, "JWT", "Expected JWT type");
        assert!(
            header.alg == "HS256" || header.alg == "EdDSA",
            "Unexpected algorithm: {}",
            header.alg
        );

        // Payload must decode and parse
        decode_claims(self);

        self
    }

    fn assert_symmetrically_signed(&self) -> &Self {
        let header = decode_header(self);
        assert_eq!(header.alg, "HS256", "Expected symmetric (HS256) signing");
        assert!(
            header.kid.is_none(),
            "Symmetric tokens must not carry a key id, got {:?}",
            header.kid
        );
        self
    }

    fn assert_asymmetrically_signed(&self) -> &Self {
        let header = decode_header(self);
        assert_eq!(header.alg, "EdDSA", "Expected asymmetric (EdDSA) signing");
        assert!(
            header.kid.is_some(),
            "Asymmetric tokens must carry a key id"
        );
        self
    }

    fn assert_has_scope(&self, scope: &str) -> &Self {
        let claims = decode_claims(self);
        assert!(
            claims.scopes.iter().any(|s| s == scope),
            "Token does not contain scope '{}'. Available scopes: {:?}",
            scope,
            claims.scopes
        );
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(
            claims.sub, subject,
            "Expected subject '{}', got '{}'",
            subject, claims.sub
        );
        self
    }

    fn assert_audience(&self, audience: &str) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(
            claims.aud, audience,
            "Expected audience '{}', got '{}'",
            audience, claims.aud
        );
        self
    }

    fn assert_expires_within(&self, seconds: i64) -> &Self {
        let claims = decode_claims(self);
        let lifetime = claims.exp - claims.iat;
        assert!(
            lifetime <= seconds,
            "Token lifetime {}s exceeds {}s",
            lifetime,
            seconds
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_service::crypto::{sign_asymmetric, sign_symmetric, generate_signing_key};

    fn test_claims() -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        serde_json::json!({
            "iss": "test-issuer",
            "aud": "test-aud",
            "sub": "user-1",
            "scopes": ["email", "profile"],
            "iat": now,
            "exp": now + 3600,
        })
    }

    #[test]
    fn test_symmetric_assertions() {
        let token = sign_symmetric(&test_claims(), "secret").unwrap();
        token
            .assert_valid_jwt()
            .assert_symmetrically_signed()
            .assert_has_scope("email")
            .assert_for_subject("user-1")
            .assert_audience("test-aud")
            .assert_expires_within(3600);
    }

    #[test]
    fn test_asymmetric_assertions() {
        let (_, private_key) = generate_signing_key().unwrap();
        let token = sign_asymmetric(&test_claims(), &private_key, "test-key-01").unwrap();
        token.assert_valid_jwt().assert_asymmetrically_signed();
    }

    #[test]
    #[should_panic(expected = "Expected symmetric")]
    fn test_symmetric_assertion_rejects_asymmetric_token() {
        let (_, private_key) = generate_signing_key().unwrap();
        let token = sign_asymmetric(&test_claims(), &private_key, "test-key-01").unwrap();
        token.assert_symmetrically_signed();
    }

    #[test]
    #[should_panic(expected = "does not contain scope")]
    fn test_missing_scope_panics() {
        let token = sign_symmetric(&test_claims(), "secret").unwrap();
        token.assert_has_scope("admin");
    }
}
