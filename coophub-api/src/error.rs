/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Errors render as JSON:
///
/// - validation failures: `422 {"status": 422, "erros": {"<field>": "<code>"}}`
/// - everything else: `{"status": <code>, "error": "<kind>", "message": "<text>"}`
///
/// The `erros` key is part of the public contract and must not be "fixed".
///
/// # Example
///
/// ```
/// use coophub_api::error::{ApiError, ApiResult};
///
/// fn check_email(taken: bool) -> ApiResult<()> {
///     if taken {
///         return Err(ApiError::field("email", "emailAlreadyExists"));
///     }
///     Ok(())
/// }
/// ```

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coophub_shared::auth::jwt::JwtError;
use coophub_shared::auth::middleware::AuthError;
use coophub_shared::auth::password::PasswordError;
use coophub_shared::mail::MailError;
use coophub_shared::store::StoreError;
use serde::{Deserialize, Serialize};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Field name → error code, serialized as the `erros` object
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), e.g. malformed JSON
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Unprocessable entity (422) with per-field codes
    ValidationError(FieldErrors),

    /// Internal server error (500)
    InternalError(String),
}

impl ApiError {
    /// Single-field validation error
    pub fn field(field: &str, code: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), code.into());
        ApiError::ValidationError(errors)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub erros: Option<FieldErrors>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::ValidationError(errors) => {
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                let body = ErrorResponse {
                    status: status.as_u16(),
                    error: None,
                    message: None,
                    erros: Some(errors),
                };
                return (status, Json(body)).into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            status: status.as_u16(),
            error: Some(error_code.to_string()),
            message: Some(message),
            erros: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => ApiError::field(field, format!("{field}AlreadyExists")),
            StoreError::Database(e) => ApiError::InternalError(format!("Database error: {}", e)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => {
                ApiError::Unauthorized(msg)
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => {
                ApiError::InternalError(format!("Token creation failed: {}", msg))
            }
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Converts derive-validator failures, keyed by camelCase field name
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errs)| {
                let code = errs.first()?.code.to_string();
                Some((camel_case(field.as_ref()), code))
            })
            .collect();

        ApiError::ValidationError(fields)
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
