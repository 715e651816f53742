/// Login session model
///
/// One row per successful login. Refresh tokens embed the session id and the
/// session's current `hash`; refreshing rotates the hash so a refresh token
/// can be used only once.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Session {
    pub async fn create(pool: &PgPool, user_id: Uuid, hash: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, hash)
            VALUES ($1, $2)
            RETURNING id, user_id, hash, created_at, updated_at, deleted_at
            "#,
        )
        .bind(user_id)
        .bind(hash)
        .fetch_one(pool)
        .await
    }

    /// Finds a live session by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, hash, created_at, updated_at, deleted_at
            FROM sessions
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Replaces the hash of a live session
    pub async fn update_hash(
        pool: &PgPool,
        id: Uuid,
        hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET hash = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, user_id, hash, created_at, updated_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(hash)
        .fetch_optional(pool)
        .await
    }

    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-deletes every live session of a user, optionally sparing one
    ///
    /// Returns the number of sessions revoked.
    pub async fn soft_delete_by_user(
        pool: &PgPool,
        user_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET deleted_at = NOW()
            WHERE user_id = $1
              AND deleted_at IS NULL
              AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(user_id)
        .bind(except)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
