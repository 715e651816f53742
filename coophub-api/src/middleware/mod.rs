/// HTTP middleware
///
/// - `auth`: Bearer token validation for access and refresh tokens
/// - `security`: Security response headers

pub mod auth;
pub mod security;
