/// JWT token generation and validation module
///
/// Access and refresh tokens are both HS256 JWTs, signed with *different*
/// secrets so a leaked refresh secret cannot mint access tokens and vice versa.
///
/// # Token Types
///
/// - **Access Token**: Short-lived (15 minutes by default). Carries the user id,
///   the role id and the session id.
/// - **Refresh Token**: Long-lived (3650 days by default). Carries the user id,
///   the session id and the session hash current at issue time. A refresh
///   token stops working as soon as its session is rotated or revoked.
///
/// # Example
///
/// ```
/// use coophub_shared::auth::jwt::{JwtSettings, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = JwtSettings::new("access-secret", "refresh-secret");
/// let user_id = Uuid::new_v4();
///
/// let pair = settings.issue_pair(user_id, Some(2), Uuid::new_v4(), "abc")?;
///
/// let access = settings.validate_access_token(&pair.token)?;
/// assert_eq!(access.sub, user_id);
/// assert_eq!(access.token_type, TokenType::Access);
///
/// let refresh = settings.validate_refresh_token(&pair.refresh_token)?;
/// assert_eq!(refresh.hash.as_deref(), Some("abc"));
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into, and required from, every token
pub const ISSUER: &str = "coophub";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was valid but of the wrong kind
    #[error("Expected {expected} token, got {actual} token")]
    WrongType { expected: TokenType, actual: TokenType },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    /// Gets token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "coophub")
/// - `iat` / `nbf` / `exp`: Unix timestamps (seconds)
///
/// # Custom Claims
///
/// - `sid`: Session the token belongs to
/// - `role`: Role id at issue time (access tokens only)
/// - `hash`: Session hash at issue time (refresh tokens only)
/// - `token_type`: Access or refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub sid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub token_type: TokenType,
}

impl Claims {
    /// Creates access token claims valid for `expires_in`
    pub fn access(user_id: Uuid, role: Option<i32>, session_id: Uuid, expires_in: Duration) -> Self {
        Self::build(user_id, session_id, TokenType::Access, expires_in, role, None)
    }

    /// Creates refresh token claims bound to the given session hash
    pub fn refresh(user_id: Uuid, session_id: Uuid, hash: &str, expires_in: Duration) -> Self {
        Self::build(
            user_id,
            session_id,
            TokenType::Refresh,
            expires_in,
            None,
            Some(hash.to_string()),
        )
    }

    fn build(
        user_id: Uuid,
        session_id: Uuid,
        token_type: TokenType,
        expires_in: Duration,
        role: Option<i32>,
        hash: Option<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            sid: session_id,
            role,
            hash,
            token_type,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Expiry as milliseconds since the Unix epoch
    pub fn expires_at_millis(&self) -> i64 {
        self.exp * 1000
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates signature, expiry, `nbf` and issuer, then returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

fn expect_type(claims: Claims, expected: TokenType) -> Result<Claims, JwtError> {
    if claims.token_type != expected {
        return Err(JwtError::WrongType {
            expected,
            actual: claims.token_type,
        });
    }

    Ok(claims)
}

/// Tokens returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Access token
    pub token: String,

    /// Refresh token
    pub refresh_token: String,

    /// Access token expiry, milliseconds since the Unix epoch
    pub token_expires: i64,
}

/// Secrets and lifetimes used to issue and validate tokens
///
/// Read-only after startup; cloned into the application state.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtSettings {
    /// Creates settings with the default lifetimes (15 minutes / 3650 days)
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(3650),
        }
    }

    /// Overrides token lifetimes
    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Issues an access/refresh pair for a session
    ///
    /// `session_hash` must be the hash currently stored on the session; the
    /// refresh token is only honoured while the two still match.
    pub fn issue_pair(
        &self,
        user_id: Uuid,
        role: Option<i32>,
        session_id: Uuid,
        session_hash: &str,
    ) -> Result<TokenPair, JwtError> {
        let access = Claims::access(user_id, role, session_id, self.access_ttl);
        let refresh = Claims::refresh(user_id, session_id, session_hash, self.refresh_ttl);

        Ok(TokenPair {
            token: create_token(&access, &self.access_secret)?,
            refresh_token: create_token(&refresh, &self.refresh_secret)?,
            token_expires: access.expires_at_millis(),
        })
    }

    /// Validates a token signed with the access secret and of type `Access`
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        expect_type(validate_token(token, &self.access_secret)?, TokenType::Access)
    }

    /// Validates a token signed with the refresh secret and of type `Refresh`
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = expect_type(validate_token(token, &self.refresh_secret)?, TokenType::Refresh)?;

        if claims.hash.is_none() {
            return Err(JwtError::ValidationError(
                "Refresh token carries no session hash".to_string(),
            ));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings::new(
            "test-access-secret-at-least-32-bytes",
            "test-refresh-secret-at-least-32-bytes",
        )
    }

    #[test]
    fn test_access_claims() {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        let claims = Claims::access(user_id, Some(1), session_id, Duration::minutes(15));

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.sid, session_id);
        assert_eq!(claims.role, Some(1));
        assert!(claims.hash.is_none());
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_issue_pair_and_validate() {
        let settings = settings();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        let pair = settings
            .issue_pair(user_id, Some(2), session_id, "session-hash")
            .unwrap();

        let access = settings.validate_access_token(&pair.token).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(access.sid, session_id);
        assert_eq!(access.role, Some(2));
        assert_eq!(pair.token_expires, access.exp * 1000);

        let refresh = settings.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, user_id);
        assert_eq!(refresh.sid, session_id);
        assert_eq!(refresh.hash.as_deref(), Some("session-hash"));
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let settings = settings();
        let pair = settings
            .issue_pair(Uuid::new_v4(), None, Uuid::new_v4(), "h")
            .unwrap();

        // Different secrets: the signature check fails first
        assert!(settings.validate_access_token(&pair.refresh_token).is_err());
        assert!(settings.validate_refresh_token(&pair.token).is_err());
    }

    #[test]
    fn test_wrong_type_with_shared_secret() {
        let claims = Claims::refresh(Uuid::new_v4(), Uuid::new_v4(), "h", Duration::days(1));
        let token = create_token(&claims, "same-secret").unwrap();

        let shared = JwtSettings::new("same-secret", "same-secret");
        let result = shared.validate_access_token(&token);

        assert!(matches!(
            result,
            Err(JwtError::WrongType {
                expected: TokenType::Access,
                actual: TokenType::Refresh
            })
        ));
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::access(Uuid::new_v4(), None, Uuid::new_v4(), Duration::minutes(5));
        let token = create_token(&claims, "secret1").unwrap();

        assert!(validate_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::access(Uuid::new_v4(), None, Uuid::new_v4(), Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, "test-secret").unwrap();
        let result = validate_token(&token, "test-secret");

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_custom_ttls() {
        let settings = settings().with_ttls(Duration::minutes(1), Duration::days(1));
        let pair = settings
            .issue_pair(Uuid::new_v4(), None, Uuid::new_v4(), "h")
            .unwrap();

        let remaining_ms = pair.token_expires - Utc::now().timestamp_millis();
        assert!(remaining_ms <= 60_000);
        assert!(remaining_ms > 55_000);
    }
}
