/// Admin user management
///
/// Every handler checks the caller's role and answers 403 to non-admins.
///
/// # Endpoints
///
/// - `GET /users?page=&limit=` - List live users, `{data, hasNextPage}`
/// - `GET /users/:id` - Fetch one
/// - `DELETE /users/:id` - Soft-delete and revoke sessions (204)

use axum::{extract::State, http::StatusCode, Extension, Json};
use coophub_shared::{auth::middleware::AuthContext, models::user::UserProfile};
use uuid::Uuid;

use super::{InfinityPaginationResponse, Pagination};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Path, Query},
};

fn require_admin(auth: &AuthContext) -> ApiResult<()> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin role required".to_string()))
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<InfinityPaginationResponse<UserProfile>>> {
    require_admin(&auth)?;

    let users = state
        .store
        .list_users(pagination.fetch_limit(), pagination.offset())
        .await?;
    let profiles = users.iter().map(UserProfile::from).collect();

    Ok(Json(InfinityPaginationResponse::new(profiles, &pagination)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserProfile>> {
    require_admin(&auth)?;

    let user = state
        .store
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&auth)?;

    if !state.store.soft_delete_user(id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    let revoked = state.store.delete_user_sessions(id, None).await?;

    tracing::info!(user_id = %id, revoked, admin_id = %auth.user_id, "User deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}
