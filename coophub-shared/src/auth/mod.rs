/// Authentication utilities
///
/// This module provides the authentication primitives for CoopHub:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Access/refresh token issuing and validation
/// - [`hash`]: Single-use random hashes (email confirmation, password reset, sessions)
/// - [`middleware`]: Bearer token parsing and the per-request auth context
///
/// # Example
///
/// ```no_run
/// use coophub_shared::auth::password::{hash_password, verify_password};
/// use coophub_shared::auth::jwt::JwtSettings;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Password authentication
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// // Token pair for a freshly created session
/// let settings = JwtSettings::new("access-secret", "refresh-secret");
/// let pair = settings.issue_pair(Uuid::new_v4(), Some(2), Uuid::new_v4(), "session-hash")?;
/// assert!(!pair.token.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod hash;
pub mod jwt;
pub mod middleware;
pub mod password;
