/// Database plumbing: the connection pool and embedded migrations
///
/// Row-level queries live with their records in [`crate::models`].

pub mod migrations;
pub mod pool;
