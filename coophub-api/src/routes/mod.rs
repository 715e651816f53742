/// API route handlers, organized by resource
///
/// - `health`: Liveness and store connectivity
/// - `auth`: Registration, login, session and profile endpoints
/// - `organizations`: Cooperative CRUD
/// - `users`: Admin-only user management

pub mod auth;
pub mod health;
pub mod organizations;
pub mod users;

use serde::{Deserialize, Serialize};

/// Largest accepted page size
pub const MAX_PAGE_LIMIT: i64 = 50;

/// Highest page whose offset fits in an `i64` at any accepted limit
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_LIMIT;

/// `?page=&limit=` query, 1-based
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl Pagination {
    /// Limit clamped to `1..=MAX_PAGE_LIMIT`
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    /// Page clamped to `1..=MAX_PAGE`
    pub fn page(&self) -> i64 {
        self.page.clamp(1, MAX_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Fetches one extra row to learn whether another page exists
    pub fn fetch_limit(&self) -> i64 {
        self.limit() + 1
    }
}

/// `{data, hasNextPage}` page envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfinityPaginationResponse<T> {
    pub data: Vec<T>,
    pub has_next_page: bool,
}

impl<T> InfinityPaginationResponse<T> {
    /// Builds a page from rows fetched with [`Pagination::fetch_limit`]
    pub fn new(mut rows: Vec<T>, pagination: &Pagination) -> Self {
        let limit = pagination.limit() as usize;
        let has_next_page = rows.len() > limit;
        rows.truncate(limit);

        Self {
            data: rows,
            has_next_page,
        }
    }
}
