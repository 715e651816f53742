//! # CoopHub API Server
//!
//! REST backend for cooperatives: email/password authentication with JWT
//! access tokens and rotating refresh tokens, user administration, and
//! organization management.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://... AUTH_JWT_SECRET=... AUTH_REFRESH_SECRET=... \
//!     cargo run -p coophub-api
//! ```
//!
//! With `DATABASE_URL=memory://` the server runs on the in-memory store,
//! seeded with the default accounts on startup.

use std::sync::Arc;

use anyhow::Context;
use coophub_api::{
    app::{build_router, shutdown_on, AppState},
    config::Config,
};
use coophub_shared::{
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    mail::LogMailer,
    seed::{run_all, SeedConfig},
    store::{MemoryStore, PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coophub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("CoopHub API Server v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    let store = open_store(&config).await?;
    let mailer = Arc::new(LogMailer::new(config.mail.default_from.clone()));

    let bind_address = config.bind_address();
    let prefix = config.route_prefix();
    let app = build_router(AppState::new(store, mailer, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!("Server listening on http://{}{}", bind_address, prefix);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    if config.uses_memory_store() {
        tracing::warn!("Using the in-memory store; data is lost on exit");
        let store = MemoryStore::new();
        run_all(&store, &SeedConfig::default())
            .await
            .context("Failed to seed in-memory store")?;
        return Ok(Arc::new(store));
    }

    let pool = create_pool(
        DatabaseConfig::new(config.database.url.clone())
            .with_max_connections(config.database.max_connections),
    )
    .await
    .context("Failed to connect to database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(Arc::new(PgStore::new(pool)))
}

