/// Account status lookup table
///
/// Fixed rows `{1, Active}` and `{2, Inactive}`. Registration creates
/// `Inactive` users; confirming the email flips them to `Active`.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEnum {
    Active,
    Inactive,
}

impl StatusEnum {
    pub const ALL: [StatusEnum; 2] = [StatusEnum::Active, StatusEnum::Inactive];

    pub const fn id(self) -> i32 {
        match self {
            StatusEnum::Active => 1,
            StatusEnum::Inactive => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            StatusEnum::Active => "Active",
            StatusEnum::Inactive => "Inactive",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.id() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    pub id: i32,
    pub name: String,
}

impl From<StatusEnum> for Status {
    fn from(status: StatusEnum) -> Self {
        Self {
            id: status.id(),
            name: status.name().to_string(),
        }
    }
}

impl Status {
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM status")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn insert(pool: &PgPool, status: &Status) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("INSERT INTO status (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(status.id)
            .bind(&status.name)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ids() {
        assert_eq!(StatusEnum::from_id(1), Some(StatusEnum::Active));
        assert_eq!(StatusEnum::from_id(2), Some(StatusEnum::Inactive));
        assert_eq!(StatusEnum::from_id(0), None);
        assert_eq!(Status::from(StatusEnum::Inactive).name, "Inactive");
    }
}
