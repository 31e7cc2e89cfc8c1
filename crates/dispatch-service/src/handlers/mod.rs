//! HTTP request handlers.

pub mod jwks_handler;
pub mod token_handler;
