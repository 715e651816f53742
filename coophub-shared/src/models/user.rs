/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255),
///     password VARCHAR(255),
///     previous_password VARCHAR(255),
///     provider VARCHAR(32) NOT NULL DEFAULT 'email',
///     social_id VARCHAR(255),
///     first_name VARCHAR(255),
///     last_name VARCHAR(255),
///     photo VARCHAR(512),
///     role_id INTEGER REFERENCES role(id),
///     status_id INTEGER REFERENCES status(id),
///     hash VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// CREATE UNIQUE INDEX users_email_active_key ON users (email) WHERE deleted_at IS NULL;
/// ```
///
/// # Secrets
///
/// `User` deliberately does not implement `Serialize`. Anything that leaves
/// the process goes through [`UserProfile`], which has no field for the
/// password, the previous password or the confirmation hash.
///
/// # Example
///
/// ```no_run
/// use coophub_shared::models::user::{CreateUser, User, UserProfile};
/// use coophub_shared::models::role::RoleEnum;
/// use coophub_shared::models::status::StatusEnum;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password: "$argon2id$...".to_string(),
///     first_name: Some("Jane".to_string()),
///     last_name: Some("Doe".to_string()),
///     role: RoleEnum::User,
///     status: StatusEnum::Inactive,
///     hash: None,
/// }).await?;
///
/// let profile = UserProfile::from(&user);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::role::{Role, RoleEnum};
use super::status::{Status, StatusEnum};

/// Provider name for email/password accounts
pub const PROVIDER_EMAIL: &str = "email";

const USER_COLUMNS: &str = "id, email, password, previous_password, provider, social_id, \
     first_name, last_name, photo, role_id, status_id, hash, created_at, updated_at, deleted_at";

/// User record
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Email address, compared exactly as stored
    pub email: Option<String>,

    /// Argon2id hash of the current password
    pub password: Option<String>,

    /// Hash that `password` replaced on the last password change
    pub previous_password: Option<String>,

    /// Identity provider (`"email"` for password accounts)
    pub provider: String,

    pub social_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo: Option<String>,
    pub role_id: Option<i32>,
    pub status_id: Option<i32>,

    /// Pending single-use hash (email confirmation or password reset)
    pub hash: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn role(&self) -> Option<RoleEnum> {
        self.role_id.and_then(RoleEnum::from_id)
    }

    pub fn status(&self) -> Option<StatusEnum> {
        self.status_id.and_then(StatusEnum::from_id)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether this account may sign in through an endpoint reserved for `role`
    ///
    /// Accounts without a role are not restricted to either endpoint.
    pub fn may_sign_in_as(&self, role: RoleEnum) -> bool {
        match self.role_id {
            None => true,
            Some(id) => id == role.id(),
        }
    }
}

/// Input for creating a new email/password user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: RoleEnum,
    pub status: StatusEnum,

    /// Initial single-use hash, if the account must confirm its email
    pub hash: Option<String>,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written. Nullable columns use `Option<Option<_>>`
/// so they can be cleared with `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo: Option<Option<String>>,
    pub password: Option<String>,
    pub previous_password: Option<Option<String>>,
    pub role_id: Option<i32>,
    pub status_id: Option<i32>,
    pub hash: Option<Option<String>>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.photo.is_none()
            && self.password.is_none()
            && self.previous_password.is_none()
            && self.role_id.is_none()
            && self.status_id.is_none()
            && self.hash.is_none()
    }

    /// Applies the update to an in-memory record
    pub fn apply(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = self.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(photo) = self.photo {
            user.photo = photo;
        }
        if let Some(password) = self.password {
            user.password = Some(password);
        }
        if let Some(previous_password) = self.previous_password {
            user.previous_password = previous_password;
        }
        if let Some(role_id) = self.role_id {
            user.role_id = Some(role_id);
        }
        if let Some(status_id) = self.status_id {
            user.status_id = Some(status_id);
        }
        if let Some(hash) = self.hash {
            user.hash = hash;
        }
        user.updated_at = Utc::now();
    }
}

/// Sanitized user projection returned by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub provider: String,
    pub social_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo: Option<String>,
    pub role: Option<Role>,
    pub status: Option<Status>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            provider: user.provider.clone(),
            social_id: user.social_id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            photo: user.photo.clone(),
            role: user.role().map(Role::from),
            status: user.status().map(Status::from),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_active_key` when a live
    /// account already uses the email.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password, provider, first_name, last_name, role_id, status_id, hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.password)
            .bind(PROVIDER_EMAIL)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.role.id())
            .bind(data.status.id())
            .bind(data.hash)
            .fetch_one(pool)
            .await
    }

    /// Finds a live user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a live user by exact email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds a live user holding the given single-use hash
    pub async fn find_by_hash(pool: &PgPool, hash: &str) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE hash = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, User>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Updates a live user
    ///
    /// Only `Some` fields in `data` are written; `updated_at` is always bumped.
    /// Returns `None` if the user does not exist or is soft-deleted.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        let mut push = |column: &str, query: &mut String| {
            bind_count += 1;
            query.push_str(&format!(", {} = ${}", column, bind_count));
        };

        if data.first_name.is_some() {
            push("first_name", &mut query);
        }
        if data.last_name.is_some() {
            push("last_name", &mut query);
        }
        if data.photo.is_some() {
            push("photo", &mut query);
        }
        if data.password.is_some() {
            push("password", &mut query);
        }
        if data.previous_password.is_some() {
            push("previous_password", &mut query);
        }
        if data.role_id.is_some() {
            push("role_id", &mut query);
        }
        if data.status_id.is_some() {
            push("status_id", &mut query);
        }
        if data.hash.is_some() {
            push("hash", &mut query);
        }

        query.push_str(&format!(
            " WHERE id = $1 AND deleted_at IS NULL RETURNING {USER_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(photo) = data.photo {
            q = q.bind(photo);
        }
        if let Some(password) = data.password {
            q = q.bind(password);
        }
        if let Some(previous_password) = data.previous_password {
            q = q.bind(previous_password);
        }
        if let Some(role_id) = data.role_id {
            q = q.bind(role_id);
        }
        if let Some(status_id) = data.status_id {
            q = q.bind(status_id);
        }
        if let Some(hash) = data.hash {
            q = q.bind(hash);
        }

        q.fetch_optional(pool).await
    }

    /// Soft-deletes a user
    ///
    /// Returns false if the user didn't exist or was already deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists live users, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: Some("user@example.com".to_string()),
            password: Some("$argon2id$secret".to_string()),
            previous_password: Some("$argon2id$older".to_string()),
            provider: PROVIDER_EMAIL.to_string(),
            social_id: None,
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            photo: None,
            role_id: Some(RoleEnum::User.id()),
            status_id: Some(StatusEnum::Inactive.id()),
            hash: Some("abc123".to_string()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_profile_omits_secrets() {
        let user = sample_user();
        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("previousPassword"));
        assert!(!object.contains_key("hash"));
        assert_eq!(object["email"], "user@example.com");
        assert_eq!(object["provider"], "email");
        assert_eq!(object["firstName"], "Jane");
        assert_eq!(object["role"]["name"], "User");
        assert_eq!(object["status"]["id"], 2);
    }

    #[test]
    fn test_may_sign_in_as() {
        let mut user = sample_user();
        assert!(user.may_sign_in_as(RoleEnum::User));
        assert!(!user.may_sign_in_as(RoleEnum::Admin));

        user.role_id = None;
        assert!(user.may_sign_in_as(RoleEnum::Admin));
    }

    #[test]
    fn test_update_apply() {
        let mut user = sample_user();
        let update = UpdateUser {
            first_name: Some("Janet".to_string()),
            photo: Some(Some("photo.png".to_string())),
            hash: Some(None),
            status_id: Some(StatusEnum::Active.id()),
            ..Default::default()
        };
        assert!(!update.is_empty());

        update.apply(&mut user);

        assert_eq!(user.first_name.as_deref(), Some("Janet"));
        assert_eq!(user.last_name.as_deref(), Some("Doe"));
        assert_eq!(user.photo.as_deref(), Some("photo.png"));
        assert_eq!(user.hash, None);
        assert_eq!(user.status(), Some(StatusEnum::Active));
    }

    #[test]
    fn test_update_default_is_empty() {
        assert!(UpdateUser::default().is_empty());
    }
}
