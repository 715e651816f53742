/// Request authentication context
///
/// The API server validates bearer tokens in its middleware layers and stores
/// the result in request extensions as one of the contexts below. Handlers
/// pull them out with Axum's `Extension` extractor.
///
/// # Request Extensions
///
/// - [`AuthContext`]: set for routes protected by an access token
/// - [`RefreshContext`]: set for the refresh route, protected by a refresh token
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use coophub_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}, admin: {}", auth.user_id, auth.is_admin())
/// }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::role::RoleEnum;

/// Caller identity taken from a validated access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role at the time the token was issued
    pub role: Option<RoleEnum>,

    /// Session the token belongs to
    pub session_id: Uuid,
}

impl AuthContext {
    /// Creates auth context from access token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role.and_then(RoleEnum::from_id),
            session_id: claims.sid,
        }
    }

    /// Whether the caller holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Some(RoleEnum::Admin)
    }
}

/// Session binding taken from a validated refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshContext {
    pub user_id: Uuid,
    pub session_id: Uuid,

    /// Session hash the refresh token was issued against
    pub hash: String,
}

impl RefreshContext {
    /// Creates refresh context from refresh token claims
    ///
    /// Returns `None` when the claims carry no session hash.
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        Some(Self {
            user_id: claims.sub,
            session_id: claims.sid,
            hash: claims.hash.clone()?,
        })
    }
}

/// Error type for bearer extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Authorization header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
        }
    }
}

/// Extracts the bearer token from the `Authorization` header
///
/// The scheme is matched case-insensitively; the token itself is returned
/// untouched.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::InvalidFormat("Expected Bearer token".to_string()));
    }

    Ok(token.trim())
}
