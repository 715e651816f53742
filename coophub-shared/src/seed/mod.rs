/// Bootstrap data
///
/// Four idempotent steps, run in order by [`run_all`]:
///
/// 1. Roles `{1, Admin}` and `{2, User}` when the role table is empty
/// 2. Statuses `{1, Active}` and `{2, Inactive}` when the status table is empty
/// 3. The admin account and a regular tester account when absent
/// 4. A default cooperative managed by the admin when its document is unused
///
/// Running the whole sequence a second time changes nothing.

use thiserror::Error;
use tracing::{debug, info};

use crate::auth::password::{hash_password, PasswordError};
use crate::models::organization::CreateOrganization;
use crate::models::role::{Role, RoleEnum};
use crate::models::status::{Status, StatusEnum};
use crate::models::user::{CreateUser, User};
use crate::store::{Store, StoreError};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const TESTER_EMAIL: &str = "john.doe@example.com";

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub admin_password: String,
    pub user_password: String,
    pub cooperative_name: String,
    pub cooperative_document: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_password: "secret".to_string(),
            user_password: "secret".to_string(),
            cooperative_name: "CoopHub Cooperative".to_string(),
            cooperative_document: "00000000000191".to_string(),
        }
    }
}

/// What a seed run inserted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: usize,
    pub statuses: usize,
    pub users: usize,
    pub organizations: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub async fn seed_roles(store: &dyn Store) -> Result<usize, SeedError> {
    if store.count_roles().await? > 0 {
        debug!("Roles already seeded");
        return Ok(0);
    }

    let mut inserted = 0;
    for role in RoleEnum::ALL {
        if store.insert_role(&Role::from(role)).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

pub async fn seed_statuses(store: &dyn Store) -> Result<usize, SeedError> {
    if store.count_statuses().await? > 0 {
        debug!("Statuses already seeded");
        return Ok(0);
    }

    let mut inserted = 0;
    for status in StatusEnum::ALL {
        if store.insert_status(&Status::from(status)).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

async fn ensure_user(
    store: &dyn Store,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
    role: RoleEnum,
) -> Result<(User, bool), SeedError> {
    if let Some(user) = store.find_user_by_email(email).await? {
        return Ok((user, false));
    }

    let user = store
        .create_user(CreateUser {
            email: email.to_string(),
            password: hash_password(password)?,
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            role,
            status: StatusEnum::Active,
            hash: None,
        })
        .await?;

    info!(user_id = %user.id, email, "Seeded user");
    Ok((user, true))
}

/// Creates the admin and tester accounts, returning the admin
pub async fn seed_users(store: &dyn Store, config: &SeedConfig) -> Result<(User, usize), SeedError> {
    let (admin, admin_created) = ensure_user(
        store,
        ADMIN_EMAIL,
        &config.admin_password,
        "Super",
        "Admin",
        RoleEnum::Admin,
    )
    .await?;

    let (_, tester_created) = ensure_user(
        store,
        TESTER_EMAIL,
        &config.user_password,
        "John",
        "Doe",
        RoleEnum::User,
    )
    .await?;

    Ok((admin, usize::from(admin_created) + usize::from(tester_created)))
}

pub async fn seed_cooperative(
    store: &dyn Store,
    config: &SeedConfig,
    manager: &User,
) -> Result<usize, SeedError> {
    if store
        .find_organization_by_document(&config.cooperative_document)
        .await?
        .is_some()
    {
        debug!(document = %config.cooperative_document, "Cooperative already seeded");
        return Ok(0);
    }

    let organization = store
        .create_organization(CreateOrganization {
            name: config.cooperative_name.clone(),
            document: config.cooperative_document.clone(),
            manager_id: Some(manager.id),
            ..Default::default()
        })
        .await?;

    info!(organization_id = %organization.id, "Seeded cooperative");
    Ok(1)
}

/// Runs every seed step in order
pub async fn run_all(store: &dyn Store, config: &SeedConfig) -> Result<SeedReport, SeedError> {
    let roles = seed_roles(store).await?;
    let statuses = seed_statuses(store).await?;
    let (admin, users) = seed_users(store, config).await?;
    let organizations = seed_cooperative(store, config, &admin).await?;

    let report = SeedReport {
        roles,
        statuses,
        users,
        organizations,
    };
    info!(?report, "Seeding finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::store::{LookupStore, MemoryStore, OrganizationStore, UserStore};

    #[tokio::test]
    async fn test_run_all_is_idempotent() {
        let store = MemoryStore::new();
        let config = SeedConfig::default();

        let first = run_all(&store, &config).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                roles: 2,
                statuses: 2,
                users: 2,
                organizations: 1,
            }
        );

        let second = run_all(&store, &config).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(store.count_roles().await.unwrap(), 2);
        assert_eq!(store.list_users(10, 0).await.unwrap().len(), 2);
        assert_eq!(store.list_organizations(10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seeded_accounts() {
        let store = MemoryStore::new();
        run_all(&store, &SeedConfig::default()).await.unwrap();

        let admin = store.find_user_by_email(ADMIN_EMAIL).await.unwrap().unwrap();
        assert_eq!(admin.role(), Some(RoleEnum::Admin));
        assert_eq!(admin.status(), Some(StatusEnum::Active));
        assert!(verify_password("secret", admin.password.as_deref().unwrap()).unwrap());

        let tester = store.find_user_by_email(TESTER_EMAIL).await.unwrap().unwrap();
        assert_eq!(tester.role(), Some(RoleEnum::User));
        assert_eq!(tester.first_name.as_deref(), Some("John"));

        let cooperative = store
            .find_organization_by_document("00000000000191")
            .await
            .unwrap()
            .unwrap();
        assert!(cooperative.is_managed_by(admin.id));
    }
}
