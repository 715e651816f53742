/// Role lookup table
///
/// # Schema
///
/// ```sql
/// CREATE TABLE role (
///     id INTEGER PRIMARY KEY,
///     name VARCHAR(64) NOT NULL
/// );
/// ```
///
/// Rows are fixed: `{1, Admin}` and `{2, User}`, inserted by the seed runner.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Known roles with their fixed ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleEnum {
    Admin,
    User,
}

impl RoleEnum {
    /// All roles in id order
    pub const ALL: [RoleEnum; 2] = [RoleEnum::Admin, RoleEnum::User];

    pub const fn id(self) -> i32 {
        match self {
            RoleEnum::Admin => 1,
            RoleEnum::User => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RoleEnum::Admin => "Admin",
            RoleEnum::User => "User",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }
}

/// Role row as stored and as embedded in user profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
}

impl From<RoleEnum> for Role {
    fn from(role: RoleEnum) -> Self {
        Self {
            id: role.id(),
            name: role.name().to_string(),
        }
    }
}

impl Role {
    /// Counts role rows
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM role")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Inserts a role row, leaving an existing row with the same id alone
    pub async fn insert(pool: &PgPool, role: &Role) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("INSERT INTO role (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(role.id)
            .bind(&role.name)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
