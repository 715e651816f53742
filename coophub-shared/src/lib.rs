//! # CoopHub Shared Library
//!
//! This crate contains the types and business logic shared by the CoopHub
//! API server and the seed runner.
//!
//! ## Module Organization
//!
//! - `models`: Database records (users, organizations, sessions, lookups)
//! - `store`: Repository traits with PostgreSQL and in-memory backends
//! - `auth`: Password hashing, JWT, single-use hashes, request auth context
//! - `mail`: Outgoing mail abstraction and message templates
//! - `seed`: Idempotent reference data seeding
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;
pub mod seed;
pub mod store;

/// Current version of the CoopHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
