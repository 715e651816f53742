//! # CoopHub Seed Runner
//!
//! Creates the database if needed, applies migrations and inserts the
//! reference data: roles, statuses, the admin and tester accounts and one
//! sample cooperative. Every step skips what already exists, so the runner
//! is safe to repeat.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo run -p coophub-seed
//! ```
//!
//! `SEED_ADMIN_PASSWORD`, `SEED_USER_PASSWORD`, `SEED_COOPERATIVE_NAME` and
//! `SEED_COOPERATIVE_DOCUMENT` override the defaults.

use anyhow::Context;
use coophub_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    seed::{run_all, SeedConfig},
    store::PgStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coophub_seed=info,coophub_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    ensure_database_exists(&database_url)
        .await
        .context("Failed to create database")?;

    let pool = create_pool(DatabaseConfig::new(database_url).with_max_connections(2))
        .await
        .context("Failed to connect to database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let store = PgStore::new(pool.clone());
    let report = run_all(&store, &seed_config())
        .await
        .context("Seeding failed")?;

    if report.is_empty() {
        tracing::info!("Database already seeded, nothing to do");
    } else {
        tracing::info!(
            roles = report.roles,
            statuses = report.statuses,
            users = report.users,
            organizations = report.organizations,
            "Seeding complete"
        );
    }

    close_pool(pool).await;
    Ok(())
}

fn seed_config() -> SeedConfig {
    let defaults = SeedConfig::default();
    let var = |key: &str, default: String| std::env::var(key).unwrap_or(default);

    SeedConfig {
        admin_password: var("SEED_ADMIN_PASSWORD", defaults.admin_password),
        user_password: var("SEED_USER_PASSWORD", defaults.user_password),
        cooperative_name: var("SEED_COOPERATIVE_NAME", defaults.cooperative_name),
        cooperative_document: var("SEED_COOPERATIVE_DOCUMENT", defaults.cooperative_document),
    }
}
