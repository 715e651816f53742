/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/email/login` - Login (regular users)
/// - `POST /auth/admin/email/login` - Login (admins)
/// - `POST /auth/email/register` - Register, sends a confirmation mail
/// - `POST /auth/email/confirm` - Confirm email with the mailed hash
/// - `GET /auth/me` - Current profile
/// - `PATCH /auth/me` - Update profile, optionally changing password
/// - `DELETE /auth/me` - Soft-delete the account
/// - `POST /auth/refresh` - Rotate the session and issue new tokens
/// - `POST /auth/logout` - Revoke the current session
/// - `POST /auth/forgot/password` - Mail a password reset hash
/// - `POST /auth/reset/password` - Set a new password with the mailed hash
///
/// Credential failures are reported as 422 with field codes rather than 401,
/// matching what existing clients expect.

use axum::{extract::State, http::StatusCode, Extension, Json};
use coophub_shared::{
    auth::{
        hash::{generate_hash, hashes_match, is_valid_hash, HashPurpose},
        jwt::TokenPair,
        middleware::{AuthContext, RefreshContext},
        password::{hash_password, verify_password},
    },
    mail::{confirm_email_message, reset_password_message},
    models::{
        role::RoleEnum,
        status::StatusEnum,
        user::{CreateUser, UpdateUser, User, UserProfile, PROVIDER_EMAIL},
    },
};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidJson,
};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(code = "invalidEmail"))]
    pub email: String,

    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,

    pub user: UserProfile,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(code = "invalidEmail"))]
    pub email: String,

    #[validate(length(min = 6, code = "minLength"))]
    pub password: String,

    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub first_name: String,

    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmEmailRequest {
    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub hash: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// Accepts a JSON string or number; stored as text
    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub last_name: Option<String>,

    pub photo: Option<String>,

    #[validate(length(min = 6, code = "minLength"))]
    pub password: Option<String>,

    pub old_password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(code = "invalidEmail"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub hash: String,

    #[validate(length(min = 6, code = "minLength"))]
    pub password: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

/// Shared login flow; `role` is the role the endpoint is reserved for
async fn login_as(state: &AppState, req: LoginRequest, role: RoleEnum) -> ApiResult<LoginResponse> {
    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .filter(|user| user.may_sign_in_as(role))
        .ok_or_else(|| ApiError::field("email", "notFound"))?;

    if user.provider != PROVIDER_EMAIL {
        return Err(ApiError::field(
            "email",
            format!("needLoginViaProvider:{}", user.provider),
        ));
    }

    let stored = user
        .password
        .as_deref()
        .ok_or_else(|| ApiError::field("password", "incorrectPassword"))?;
    if !verify_password(&req.password, stored)? {
        return Err(ApiError::field("password", "incorrectPassword"));
    }

    let session = state.store.create_session(user.id, &generate_hash()).await?;
    let tokens = state
        .jwt
        .issue_pair(user.id, user.role_id, session.id, &session.hash)?;

    tracing::info!(user_id = %user.id, session_id = %session.id, "User logged in");

    Ok(LoginResponse {
        tokens,
        user: UserProfile::from(&user),
    })
}

/// `POST /auth/email/login`
///
/// ```json
/// { "email": "john.doe@example.com", "password": "secret" }
/// ```
///
/// Returns `{token, refreshToken, tokenExpires, user}`.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(login_as(&state, req, RoleEnum::User).await?))
}

/// `POST /auth/admin/email/login`
pub async fn admin_login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(login_as(&state, req, RoleEnum::Admin).await?))
}

/// `POST /auth/email/register`
///
/// Creates an inactive account and mails a `confirm-email/<hash>` link.
///
/// # Errors
///
/// - `422 {erros: {email: "emailAlreadyExists"}}`: a live account uses the email
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<StatusCode> {
    if state.store.find_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::field("email", "emailAlreadyExists"));
    }

    let hash = generate_hash();
    let user = state
        .store
        .create_user(CreateUser {
            email: req.email,
            password: hash_password(&req.password)?,
            first_name: Some(req.first_name),
            last_name: Some(req.last_name),
            role: RoleEnum::User,
            status: StatusEnum::Inactive,
            hash: Some(HashPurpose::ConfirmEmail.tag(&hash)),
        })
        .await?;

    let email = user.email.as_deref().unwrap_or_default();
    state
        .mailer
        .send(confirm_email_message(
            &state.config.mail.frontend_domain,
            email,
            &hash,
        ))
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /auth/email/confirm`
///
/// Activates the account holding `hash` and clears it, so a second attempt
/// with the same hash is a 404.
pub async fn confirm_email(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ConfirmEmailRequest>,
) -> ApiResult<StatusCode> {
    let not_found = || ApiError::NotFound("Confirmation hash not found".to_string());
    if !is_valid_hash(&req.hash) {
        return Err(not_found());
    }

    let user = state
        .store
        .find_user_by_hash(&HashPurpose::ConfirmEmail.tag(&req.hash))
        .await?
        .ok_or_else(not_found)?;

    state
        .store
        .update_user(
            user.id,
            UpdateUser {
                hash: Some(None),
                status_id: Some(StatusEnum::Active.id()),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Email confirmed");
    Ok(StatusCode::NO_CONTENT)
}

async fn current_user(state: &AppState, auth: &AuthContext) -> ApiResult<User> {
    state
        .store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// `GET /auth/me`
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserProfile>> {
    let user = current_user(&state, &auth).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// `PATCH /auth/me`
///
/// Changing `password` requires `oldPassword`. On success the previous hash is
/// kept in `previous_password` and every other session of the user is revoked;
/// the calling session stays valid.
///
/// # Errors
///
/// - `422 {erros: {oldPassword: "missingOldPassword"}}`
/// - `422 {erros: {oldPassword: "incorrectOldPassword"}}`
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserProfile>> {
    let user = current_user(&state, &auth).await?;

    let mut update = UpdateUser {
        first_name: req.first_name,
        last_name: req.last_name,
        photo: req.photo.map(Some),
        ..Default::default()
    };

    let password_changed = match req.password {
        None => false,
        Some(new_password) => {
            let old_password = req
                .old_password
                .ok_or_else(|| ApiError::field("oldPassword", "missingOldPassword"))?;

            let current = user
                .password
                .as_deref()
                .ok_or_else(|| ApiError::field("oldPassword", "incorrectOldPassword"))?;
            if !verify_password(&old_password, current)? {
                return Err(ApiError::field("oldPassword", "incorrectOldPassword"));
            }

            update.password = Some(hash_password(&new_password)?);
            update.previous_password = Some(user.password.clone());
            true
        }
    };

    let updated = state
        .store
        .update_user(user.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if password_changed {
        let revoked = state
            .store
            .delete_user_sessions(user.id, Some(auth.session_id))
            .await?;
        tracing::info!(user_id = %user.id, revoked, "Password changed");
    }

    Ok(Json(UserProfile::from(&updated)))
}

/// `DELETE /auth/me`
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    if !state.store.soft_delete_user(auth.user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    state.store.delete_user_sessions(auth.user_id, None).await?;

    tracing::info!(user_id = %auth.user_id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /auth/refresh` with `Authorization: Bearer <refreshToken>`
///
/// The token must carry the session's current hash. The hash is rotated, so
/// each refresh token works once.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(context): Extension<RefreshContext>,
) -> ApiResult<Json<TokenPair>> {
    let session = state
        .store
        .find_session(context.session_id)
        .await?
        .filter(|s| s.user_id == context.user_id && hashes_match(&s.hash, &context.hash))
        .ok_or_else(|| ApiError::Unauthorized("Session is no longer valid".to_string()))?;

    let user = state
        .store
        .find_user_by_id(session.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session is no longer valid".to_string()))?;

    let rotated = state
        .store
        .rotate_session_hash(session.id, &generate_hash())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session is no longer valid".to_string()))?;

    let tokens = state
        .jwt
        .issue_pair(user.id, user.role_id, rotated.id, &rotated.hash)?;

    Ok(Json(tokens))
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state.store.delete_session(auth.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /auth/forgot/password`
///
/// Stores a fresh hash on the account and mails a `password-change/<hash>` link.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ForgotPasswordRequest>,
) -> ApiResult<StatusCode> {
    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::field("email", "emailNotExists"))?;

    let hash = generate_hash();
    state
        .store
        .update_user(
            user.id,
            UpdateUser {
                hash: Some(Some(HashPurpose::ResetPassword.tag(&hash))),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::field("email", "emailNotExists"))?;

    state
        .mailer
        .send(reset_password_message(
            &state.config.mail.frontend_domain,
            &req.email,
            &hash,
        ))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /auth/reset/password`
///
/// Consumes the hash, sets the new password and revokes every session.
pub async fn reset_password(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    if !is_valid_hash(&req.hash) {
        return Err(ApiError::field("hash", "notFound"));
    }

    let user = state
        .store
        .find_user_by_hash(&HashPurpose::ResetPassword.tag(&req.hash))
        .await?
        .ok_or_else(|| ApiError::field("hash", "notFound"))?;

    state
        .store
        .update_user(
            user.id,
            UpdateUser {
                password: Some(hash_password(&req.password)?),
                previous_password: Some(user.password.clone()),
                hash: Some(None),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::field("hash", "notFound"))?;

    state.store.delete_user_sessions(user.id, None).await?;

    tracing::info!(user_id = %user.id, "Password reset");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name_accepts_number() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"firstName": 1718000000000}"#).unwrap();
        assert_eq!(req.first_name.as_deref(), Some("1718000000000"));

        let req: UpdateProfileRequest = serde_json::from_str(r#"{"firstName": "Ana"}"#).unwrap();
        assert_eq!(req.first_name.as_deref(), Some("Ana"));

        let req: UpdateProfileRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(req.first_name, None);

        assert!(serde_json::from_str::<UpdateProfileRequest>(r#"{"firstName": true}"#).is_err());
    }

    #[test]
    fn test_login_rejects_trailing_space_email() {
        let req = LoginRequest {
            email: "john.doe@example.com  ".to_string(),
            password: "secret".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            email: "new@example.com".to_string(),
            password: "12345".to_string(),
            first_name: String::new(),
            last_name: "E2E".to_string(),
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("first_name"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn test_login_response_shape() {
        let now = chrono::Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4(),
            email: Some("a@example.com".to_string()),
            password: Some("$argon2id$x".to_string()),
            previous_password: None,
            provider: PROVIDER_EMAIL.to_string(),
            social_id: None,
            first_name: None,
            last_name: None,
            photo: None,
            role_id: Some(RoleEnum::User.id()),
            status_id: Some(StatusEnum::Active.id()),
            hash: Some("secret-hash".to_string()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let response = LoginResponse {
            tokens: TokenPair {
                token: "a".to_string(),
                refresh_token: "r".to_string(),
                token_expires: 1,
            },
            user: UserProfile::from(&user),
        };
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["token"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert_eq!(json["tokenExpires"], 1);
        assert!(json["user"].get("hash").is_none());
        assert!(json["user"].get("password").is_none());
    }
}
