/// Organization (cooperative) endpoints
///
/// All routes require an access token. Reads are open to any authenticated
/// user; updates and deletes are limited to the organization's manager and
/// to admins.
///
/// # Endpoints
///
/// - `POST /organizations` - Create (201)
/// - `GET /organizations?page=&limit=` - List, `{data, hasNextPage}`
/// - `GET /organizations/:id` - Fetch one
/// - `PATCH /organizations/:id` - Update
/// - `DELETE /organizations/:id` - Soft-delete (204)

use axum::{extract::State, http::StatusCode, Extension, Json};
use coophub_shared::{
    auth::middleware::AuthContext,
    models::{
        organization::{CreateOrganization, Organization, OrganizationView, UpdateOrganization},
        user::UserProfile,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{InfinityPaginationResponse, Pagination};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Path, Query, ValidJson},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub name: String,

    #[validate(email(code = "invalidEmail"))]
    pub email: Option<String>,

    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub document: String,

    pub address_street: Option<String>,
    pub address_number: Option<String>,
    pub address_neighborhood: Option<String>,
    pub address_city: Option<String>,
    pub address_zipcode: Option<String>,

    /// Honoured for admins only; everyone else manages what they create
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub name: Option<String>,

    #[validate(email(code = "invalidEmail"))]
    pub email: Option<String>,

    #[validate(length(min = 1, code = "isNotEmpty"))]
    pub document: Option<String>,

    pub address_street: Option<String>,
    pub address_number: Option<String>,
    pub address_neighborhood: Option<String>,
    pub address_city: Option<String>,
    pub address_zipcode: Option<String>,

    /// Admin only
    pub manager_id: Option<Uuid>,
}

/// Loads the manager's profile for embedding
async fn to_view(state: &AppState, organization: Organization) -> ApiResult<OrganizationView> {
    let manager = match organization.manager_id {
        Some(id) => state
            .store
            .find_user_by_id(id)
            .await?
            .map(|user| UserProfile::from(&user)),
        None => None,
    };
    Ok(OrganizationView::new(organization, manager))
}

async fn find_live(state: &AppState, id: Uuid) -> ApiResult<Organization> {
    state
        .store
        .find_organization(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))
}

fn ensure_can_manage(auth: &AuthContext, organization: &Organization) -> ApiResult<()> {
    if auth.is_admin() || organization.is_managed_by(auth.user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only the manager or an admin can change this organization".to_string(),
        ))
    }
}

async fn ensure_manager_exists(state: &AppState, manager_id: Uuid) -> ApiResult<()> {
    if state.store.find_user_by_id(manager_id).await?.is_none() {
        return Err(ApiError::field("managerId", "notFound"));
    }
    Ok(())
}

pub async fn create_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<OrganizationView>)> {
    let manager_id = match req.manager_id {
        Some(id) if auth.is_admin() => {
            ensure_manager_exists(&state, id).await?;
            id
        }
        _ => auth.user_id,
    };

    let organization = state
        .store
        .create_organization(CreateOrganization {
            name: req.name,
            email: req.email,
            document: req.document,
            address_street: req.address_street,
            address_number: req.address_number,
            address_neighborhood: req.address_neighborhood,
            address_city: req.address_city,
            address_zipcode: req.address_zipcode,
            manager_id: Some(manager_id),
        })
        .await?;

    tracing::info!(organization_id = %organization.id, %manager_id, "Organization created");

    Ok((StatusCode::CREATED, Json(to_view(&state, organization).await?)))
}

pub async fn list_organizations(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<InfinityPaginationResponse<OrganizationView>>> {
    let rows = state
        .store
        .list_organizations(pagination.fetch_limit(), pagination.offset())
        .await?;
    let page = InfinityPaginationResponse::new(rows, &pagination);

    let mut data = Vec::with_capacity(page.data.len());
    for organization in page.data {
        data.push(to_view(&state, organization).await?);
    }

    Ok(Json(InfinityPaginationResponse {
        data,
        has_next_page: page.has_next_page,
    }))
}

pub async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrganizationView>> {
    let organization = find_live(&state, id).await?;
    Ok(Json(to_view(&state, organization).await?))
}

pub async fn update_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateOrganizationRequest>,
) -> ApiResult<Json<OrganizationView>> {
    let organization = find_live(&state, id).await?;
    ensure_can_manage(&auth, &organization)?;

    let manager_id = match req.manager_id {
        Some(manager_id) if auth.is_admin() => {
            ensure_manager_exists(&state, manager_id).await?;
            Some(Some(manager_id))
        }
        Some(_) => {
            return Err(ApiError::Forbidden(
                "Only an admin can reassign the manager".to_string(),
            ))
        }
        None => None,
    };

    let updated = state
        .store
        .update_organization(
            id,
            UpdateOrganization {
                name: req.name,
                email: req.email.map(Some),
                document: req.document,
                address_street: req.address_street.map(Some),
                address_number: req.address_number.map(Some),
                address_neighborhood: req.address_neighborhood.map(Some),
                address_city: req.address_city.map(Some),
                address_zipcode: req.address_zipcode.map(Some),
                manager_id,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    Ok(Json(to_view(&state, updated).await?))
}

pub async fn delete_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let organization = find_live(&state, id).await?;
    ensure_can_manage(&auth, &organization)?;

    state.store.soft_delete_organization(id).await?;

    tracing::info!(organization_id = %id, "Organization deleted");
    Ok(StatusCode::NO_CONTENT)
}
