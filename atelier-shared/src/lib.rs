//! # Atelier Shared Library
//!
//! Shared types and business logic used by the Atelier content API.
//!
//! ## Module Organization
//!
//! - `models`: database models for content collections and auth state
//! - `store`: generic typed document repository over PostgreSQL
//! - `auth`: JWT sessions, Argon2id passwords, and the role hierarchy
//! - `cache`: in-memory response cache with TTL expiry
//! - `db`: connection pool and migration runner
//! - `slug`: URL slug derivation

pub mod auth;
pub mod cache;
pub mod db;
pub mod models;
pub mod slug;
pub mod store;

/// Current version of the Atelier shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
