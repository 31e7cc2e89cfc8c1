//! OAuth Dispatch Service Library
//!
//! Converts OAuth access tokens into signed JWTs for the learning platform,
//! selecting a signing key per policy and populating enterprise-role claims.
//!
//! # Modules
//!
//! - `adapters` - OAuth backend adapters (standard and legacy)
//! - `config` - Service configuration
//! - `crypto` - Cryptographic operations (JWT signing, key encryption)
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `jwt` - Claims assembly and signing-mode selection
//! - `models` - Data models
//! - `repositories` - Database access layer
//! - `services` - Business logic layer
//! - `toggles` - Runtime feature toggles

pub mod adapters;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod jwt;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod toggles;
