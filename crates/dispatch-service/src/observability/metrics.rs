//! Metrics definitions for the dispatch service.
//!
//! Prometheus naming conventions: `dispatch_` prefix, `_total` suffix for
//! counters. Label cardinality is bounded:
//! - `signing`: 2 values (symmetric, asymmetric)
//! - `grant_type`: bounded by supported grants
//! - `status`: 2 values (success, error)

use metrics::counter;

/// Record a JWT issued with the given signing mode.
///
/// Metric: `dispatch_jwt_issued_total`
/// Labels: `signing`
pub fn record_jwt_issued(signing: &str) {
    counter!("dispatch_jwt_issued_total", "signing" => signing.to_string()).increment(1);
}

/// Record a token-endpoint issuance attempt.
///
/// Metric: `dispatch_token_issuance_total`
/// Labels: `grant_type`, `status`
pub fn record_token_issuance(grant_type: &str, status: &str) {
    counter!("dispatch_token_issuance_total", "grant_type" => grant_type.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record a JWKS fetch.
///
/// Metric: `dispatch_jwks_requests_total`
pub fn record_jwks_request() {
    counter!("dispatch_jwks_requests_total").increment(1);
}
