/// In-memory store for tests and local development
///
/// Mirrors the PostgreSQL schema's behaviour: soft deletes, unique email among
/// live users, unique document/email among live organizations, and
/// insert-if-absent lookups.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    LookupStore, OrganizationStore, SessionStore, Store, StoreError, StoreResult, UserStore,
};
use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use crate::models::role::Role;
use crate::models::session::Session;
use crate::models::status::Status;
use crate::models::user::{CreateUser, UpdateUser, User, PROVIDER_EMAIL};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    sessions: HashMap<Uuid, Session>,
    organizations: Vec<Organization>,
    roles: BTreeMap<i32, Role>,
    statuses: BTreeMap<i32, Status>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tables {
    fn live_user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id && !u.is_deleted())
    }

    fn live_user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id && !u.is_deleted())
    }

    fn live_organization_mut(&mut self, id: Uuid) -> Option<&mut Organization> {
        self.organizations
            .iter_mut()
            .find(|o| o.id == id && o.deleted_at.is_none())
    }

    /// Checks organization uniqueness, ignoring the row `skip`
    fn check_organization(
        &self,
        document: &str,
        email: Option<&str>,
        skip: Option<Uuid>,
    ) -> StoreResult<()> {
        let others = self
            .organizations
            .iter()
            .filter(|o| o.deleted_at.is_none() && Some(o.id) != skip);

        for other in others {
            if other.document == document {
                return Err(StoreError::Conflict("document"));
            }
            if email.is_some() && other.email.as_deref() == email {
                return Err(StoreError::Conflict("email"));
            }
        }
        Ok(())
    }
}

/// Newest first, matching the SQL `ORDER BY created_at DESC`
fn page<T>(mut rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.reverse();
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables();

        let taken = tables
            .users
            .iter()
            .any(|u| !u.is_deleted() && u.email.as_deref() == Some(data.email.as_str()));
        if taken {
            return Err(StoreError::Conflict("email"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: Some(data.email),
            password: Some(data.password),
            previous_password: None,
            provider: PROVIDER_EMAIL.to_string(),
            social_id: None,
            first_name: data.first_name,
            last_name: data.last_name,
            photo: None,
            role_id: Some(data.role.id()),
            status_id: Some(data.status.id()),
            hash: data.hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables().live_user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| !u.is_deleted() && u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_user_by_hash(&self, hash: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| !u.is_deleted() && u.hash.as_deref() == Some(hash))
            .cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut tables = self.tables();
        Ok(tables.live_user_mut(id).map(|user| {
            data.apply(user);
            user.clone()
        }))
    }

    async fn soft_delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables();
        Ok(match tables.live_user_mut(id) {
            Some(user) => {
                let now = Utc::now();
                user.deleted_at = Some(now);
                user.updated_at = now;
                true
            }
            None => false,
        })
    }

    async fn list_users(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>> {
        let live = self
            .tables()
            .users
            .iter()
            .filter(|u| !u.is_deleted())
            .cloned()
            .collect();
        Ok(page(live, limit, offset))
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, user_id: Uuid, hash: &str) -> StoreResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            hash: hash.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.tables().sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        Ok(self
            .tables()
            .sessions
            .get(&id)
            .filter(|s| s.deleted_at.is_none())
            .cloned())
    }

    async fn rotate_session_hash(&self, id: Uuid, hash: &str) -> StoreResult<Option<Session>> {
        let mut tables = self.tables();
        Ok(tables
            .sessions
            .get_mut(&id)
            .filter(|s| s.deleted_at.is_none())
            .map(|session| {
                session.hash = hash.to_string();
                session.updated_at = Utc::now();
                session.clone()
            }))
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables();
        Ok(match tables.sessions.get_mut(&id) {
            Some(session) if session.deleted_at.is_none() => {
                session.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        })
    }

    async fn delete_user_sessions(&self, user_id: Uuid, except: Option<Uuid>) -> StoreResult<u64> {
        let now = Utc::now();
        let mut revoked = 0;

        for session in self.tables().sessions.values_mut() {
            if session.user_id == user_id
                && session.deleted_at.is_none()
                && Some(session.id) != except
            {
                session.deleted_at = Some(now);
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn create_organization(&self, data: CreateOrganization) -> StoreResult<Organization> {
        let mut tables = self.tables();
        tables.check_organization(&data.document, data.email.as_deref(), None)?;

        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            document: data.document,
            address_street: data.address_street,
            address_number: data.address_number,
            address_neighborhood: data.address_neighborhood,
            address_city: data.address_city,
            address_zipcode: data.address_zipcode,
            manager_id: data.manager_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        tables.organizations.push(organization.clone());
        Ok(organization)
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        Ok(self
            .tables()
            .organizations
            .iter()
            .find(|o| o.id == id && o.deleted_at.is_none())
            .cloned())
    }

    async fn find_organization_by_document(
        &self,
        document: &str,
    ) -> StoreResult<Option<Organization>> {
        Ok(self
            .tables()
            .organizations
            .iter()
            .find(|o| o.document == document && o.deleted_at.is_none())
            .cloned())
    }

    async fn list_organizations(&self, limit: i64, offset: i64) -> StoreResult<Vec<Organization>> {
        let live = self
            .tables()
            .organizations
            .iter()
            .filter(|o| o.deleted_at.is_none())
            .cloned()
            .collect();
        Ok(page(live, limit, offset))
    }

    async fn update_organization(
        &self,
        id: Uuid,
        data: UpdateOrganization,
    ) -> StoreResult<Option<Organization>> {
        let mut tables = self.tables();

        let Some(mut updated) = tables
            .organizations
            .iter()
            .find(|o| o.id == id && o.deleted_at.is_none())
            .cloned()
        else {
            return Ok(None);
        };

        data.apply(&mut updated);
        tables.check_organization(&updated.document, updated.email.as_deref(), Some(id))?;

        if let Some(row) = tables.live_organization_mut(id) {
            *row = updated.clone();
        }
        Ok(Some(updated))
    }

    async fn soft_delete_organization(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables();
        Ok(match tables.live_organization_mut(id) {
            Some(organization) => {
                let now = Utc::now();
                organization.deleted_at = Some(now);
                organization.updated_at = now;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl LookupStore for MemoryStore {
    async fn count_roles(&self) -> StoreResult<i64> {
        Ok(self.tables().roles.len() as i64)
    }

    async fn insert_role(&self, role: &Role) -> StoreResult<bool> {
        let mut tables = self.tables();
        if tables.roles.contains_key(&role.id) {
            return Ok(false);
        }
        tables.roles.insert(role.id, role.clone());
        Ok(true)
    }

    async fn count_statuses(&self) -> StoreResult<i64> {
        Ok(self.tables().statuses.len() as i64)
    }

    async fn insert_status(&self, status: &Status) -> StoreResult<bool> {
        let mut tables = self.tables();
        if tables.statuses.contains_key(&status.id) {
            return Ok(false);
        }
        tables.statuses.insert(status.id, status.clone());
        Ok(true)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
