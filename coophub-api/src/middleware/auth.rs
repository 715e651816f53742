/// Bearer token middleware
///
/// Two layers, both reading `Authorization: Bearer <token>`:
///
/// - [`access_auth_layer`] validates an access token and inserts an
///   [`AuthContext`] into the request extensions
/// - [`refresh_auth_layer`] validates a refresh token and inserts a
///   [`RefreshContext`]; it guards `POST /auth/refresh` only
///
/// Access tokens are checked statelessly. Refresh tokens are additionally
/// checked against their session by the refresh handler.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use coophub_shared::auth::middleware::{bearer_token, AuthContext, AuthError, RefreshContext};

use crate::{app::AppState, error::ApiError};

pub async fn access_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;
    let claims = state.jwt.validate_access_token(token)?;

    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}

pub async fn refresh_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;
    let claims = state.jwt.validate_refresh_token(token)?;

    let context = RefreshContext::from_claims(&claims).ok_or_else(|| {
        AuthError::InvalidToken("Refresh token carries no session hash".to_string())
    })?;
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
