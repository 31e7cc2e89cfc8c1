//! Observability helpers.
//!
//! Instrumentation is privacy-first: identifying fields (client_id,
//! usernames, token strings) never appear in logs in plaintext. Fields
//! that need correlation across log entries are hashed.

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// One-way transformation for correlation only; the truncation limits
/// reversibility while keeping entries matchable.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..4])
}
