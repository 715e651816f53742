/// Repository layer
///
/// Handlers never touch SQL directly: they talk to an `Arc<dyn Store>`, which
/// is either [`PgStore`] (production) or [`MemoryStore`] (tests and
/// `DATABASE_URL=memory://` local runs). Both backends enforce the same
/// uniqueness rules and report violations as [`StoreError::Conflict`].
///
/// Every lookup excludes soft-deleted rows.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use crate::models::role::Role;
use crate::models::session::Session;
use crate::models::status::Status;
use crate::models::user::{CreateUser, UpdateUser, User};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint on `field` was violated
    #[error("Conflict on field: {0}")]
    Conflict(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_hash(&self, hash: &str) -> StoreResult<Option<User>>;

    /// Returns `None` when the user is missing or soft-deleted
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;

    async fn soft_delete_user(&self, id: Uuid) -> StoreResult<bool>;
    async fn list_users(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, user_id: Uuid, hash: &str) -> StoreResult<Session>;
    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>>;
    async fn rotate_session_hash(&self, id: Uuid, hash: &str) -> StoreResult<Option<Session>>;
    async fn delete_session(&self, id: Uuid) -> StoreResult<bool>;

    /// Revokes every live session of `user_id` except `except`
    async fn delete_user_sessions(&self, user_id: Uuid, except: Option<Uuid>) -> StoreResult<u64>;
}

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn create_organization(&self, data: CreateOrganization) -> StoreResult<Organization>;
    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>>;
    async fn find_organization_by_document(&self, document: &str)
        -> StoreResult<Option<Organization>>;
    async fn list_organizations(&self, limit: i64, offset: i64) -> StoreResult<Vec<Organization>>;
    async fn update_organization(
        &self,
        id: Uuid,
        data: UpdateOrganization,
    ) -> StoreResult<Option<Organization>>;
    async fn soft_delete_organization(&self, id: Uuid) -> StoreResult<bool>;
}

/// Role and status lookup tables
#[async_trait]
pub trait LookupStore: Send + Sync {
    async fn count_roles(&self) -> StoreResult<i64>;
    async fn insert_role(&self, role: &Role) -> StoreResult<bool>;
    async fn count_statuses(&self) -> StoreResult<i64>;
    async fn insert_status(&self, status: &Status) -> StoreResult<bool>;
}

/// Everything the API server and seed runner need from persistence
#[async_trait]
pub trait Store: UserStore + SessionStore + OrganizationStore + LookupStore + 'static {
    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}
