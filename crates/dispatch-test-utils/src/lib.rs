//! # Dispatch Test Utilities
//!
//! Shared test utilities for the OAuth dispatch service.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed master keys, settings builders)
//! - Database fixtures (users, clients, access tokens)
//! - Custom assertions (`JwtAssertions` trait, full access-token checks)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dispatch_test_utils::*;
//!
//! #[sqlx::test]
//! async fn test_example(pool: PgPool) {
//!     let settings = test_settings(false);
//!     let user = create_test_user(&pool, "alice", true).await;
//!
//!     jwt.assert_valid_jwt()
//!        .assert_symmetrically_signed()
//!        .assert_has_scope("email");
//! }
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod assertions;
pub mod fixtures;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
