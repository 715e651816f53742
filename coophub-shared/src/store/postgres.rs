/// PostgreSQL store
///
/// A thin wrapper over the model functions in [`crate::models`] that maps
/// unique-index violations to [`StoreError::Conflict`].

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    LookupStore, OrganizationStore, SessionStore, Store, StoreError, StoreResult, UserStore,
};
use crate::db::pool::health_check;
use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use crate::models::role::Role;
use crate::models::session::Session;
use crate::models::status::Status;
use crate::models::user::{CreateUser, UpdateUser, User};

/// Unique-violation SQLSTATE
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations on the email/document indexes to a conflict
fn map_conflict(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_error) = error {
        if db_error.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_error.constraint().unwrap_or_default();
            if constraint.contains("email") {
                return StoreError::Conflict("email");
            }
            if constraint.contains("document") {
                return StoreError::Conflict("document");
            }
        }
    }
    StoreError::Database(error)
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data).await.map_err(map_conflict)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_hash(&self, hash: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_hash(&self.pool, hash).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        User::update(&self.pool, id, data).await.map_err(map_conflict)
    }

    async fn soft_delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(User::soft_delete(&self.pool, id).await?)
    }

    async fn list_users(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>> {
        Ok(User::list(&self.pool, limit, offset).await?)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, user_id: Uuid, hash: &str) -> StoreResult<Session> {
        Ok(Session::create(&self.pool, user_id, hash).await?)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        Ok(Session::find_by_id(&self.pool, id).await?)
    }

    async fn rotate_session_hash(&self, id: Uuid, hash: &str) -> StoreResult<Option<Session>> {
        Ok(Session::update_hash(&self.pool, id, hash).await?)
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Session::soft_delete(&self.pool, id).await?)
    }

    async fn delete_user_sessions(&self, user_id: Uuid, except: Option<Uuid>) -> StoreResult<u64> {
        Ok(Session::soft_delete_by_user(&self.pool, user_id, except).await?)
    }
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn create_organization(&self, data: CreateOrganization) -> StoreResult<Organization> {
        Organization::create(&self.pool, data)
            .await
            .map_err(map_conflict)
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        Ok(Organization::find_by_id(&self.pool, id).await?)
    }

    async fn find_organization_by_document(
        &self,
        document: &str,
    ) -> StoreResult<Option<Organization>> {
        Ok(Organization::find_by_document(&self.pool, document).await?)
    }

    async fn list_organizations(&self, limit: i64, offset: i64) -> StoreResult<Vec<Organization>> {
        Ok(Organization::list(&self.pool, limit, offset).await?)
    }

    async fn update_organization(
        &self,
        id: Uuid,
        data: UpdateOrganization,
    ) -> StoreResult<Option<Organization>> {
        Organization::update(&self.pool, id, data)
            .await
            .map_err(map_conflict)
    }

    async fn soft_delete_organization(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Organization::soft_delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl LookupStore for PgStore {
    async fn count_roles(&self) -> StoreResult<i64> {
        Ok(Role::count(&self.pool).await?)
    }

    async fn insert_role(&self, role: &Role) -> StoreResult<bool> {
        Ok(Role::insert(&self.pool, role).await?)
    }

    async fn count_statuses(&self) -> StoreResult<i64> {
        Ok(Status::count(&self.pool).await?)
    }

    async fn insert_status(&self, status: &Status) -> StoreResult<bool> {
        Ok(Status::insert(&self.pool, status).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        let error = map_conflict(sqlx::Error::RowNotFound);
        assert!(matches!(error, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}
