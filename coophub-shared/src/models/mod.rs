/// Database models for CoopHub
///
/// Each model owns its SQL: the PostgreSQL store in [`crate::store`] calls the
/// associated functions here and only adds error mapping on top.
///
/// # Models
///
/// - `user`: Accounts, plus the sanitized [`user::UserProfile`] projection
/// - `organization`: Cooperatives, each managed by a user
/// - `session`: Login sessions backing refresh tokens
/// - `role` / `status`: Seeded lookup tables
///
/// Every table except the lookups is soft-deleted: rows get a `deleted_at`
/// timestamp and the default queries filter them out.

pub mod organization;
pub mod role;
pub mod session;
pub mod status;
pub mod user;
