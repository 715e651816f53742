/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::{future::Future, io, sync::Arc};
/// use coophub_api::{app::{build_router, AppState}, config::Config};
/// use coophub_shared::mail::LogMailer;
/// use coophub_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let mailer = LogMailer::new(config.mail.default_from.clone());
/// let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(mailer), config);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, build_router(state)).await?;
/// # Ok(())
/// # }
/// ```

use std::{future::Future, io, sync::Arc};

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use coophub_shared::{auth::jwt::JwtSettings, mail::Mailer, store::Store};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    middleware::{
        auth::{access_auth_layer, refresh_auth_layer},
        security::security_headers,
    },
    routes,
};

/// Shared application state
///
/// Cloned per request by Axum's `State` extractor; every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtSettings>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        let jwt = config.jwt_settings();
        Self {
            store,
            mailer,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
        }
    }
}

/// Builds the complete router
///
/// ```text
/// /health                              public
/// /{API_PREFIX}/v1/
/// ├── /auth/
/// │   ├── POST /email/login            public
/// │   ├── POST /admin/email/login      public
/// │   ├── POST /email/register         public
/// │   ├── POST /email/confirm          public
/// │   ├── POST /forgot/password        public
/// │   ├── POST /reset/password         public
/// │   ├── GET|PATCH|DELETE /me         access token
/// │   ├── POST /logout                 access token
/// │   └── POST /refresh                refresh token
/// ├── /organizations                   access token
/// │   ├── POST /   GET /
/// │   └── GET|PATCH|DELETE /:id
/// └── /users                           access token, admin only
///     ├── GET /
///     └── GET|DELETE /:id
/// ```
pub fn build_router(state: AppState) -> Router {
    let public_auth = Router::new()
        .route("/email/login", post(routes::auth::login))
        .route("/admin/email/login", post(routes::auth::admin_login))
        .route("/email/register", post(routes::auth::register))
        .route("/email/confirm", post(routes::auth::confirm_email))
        .route("/forgot/password", post(routes::auth::forgot_password))
        .route("/reset/password", post(routes::auth::reset_password));

    let session_auth = Router::new()
        .route(
            "/me",
            get(routes::auth::me)
                .patch(routes::auth::update_me)
                .delete(routes::auth::delete_me),
        )
        .route("/logout", post(routes::auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            access_auth_layer,
        ));

    let refresh_auth = Router::new()
        .route("/refresh", post(routes::auth::refresh))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            refresh_auth_layer,
        ));

    let organization_routes = Router::new()
        .route(
            "/",
            post(routes::organizations::create_organization)
                .get(routes::organizations::list_organizations),
        )
        .route(
            "/:id",
            get(routes::organizations::get_organization)
                .patch(routes::organizations::update_organization)
                .delete(routes::organizations::delete_organization),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            access_auth_layer,
        ));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route(
            "/:id",
            get(routes::users::get_user).delete(routes::users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            access_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest(
            "/auth",
            public_auth.merge(session_auth).merge(refresh_auth),
        )
        .nest("/organizations", organization_routes)
        .nest("/users", user_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest(&state.config.route_prefix(), v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(middleware::from_fn_with_state(
            state.config.api.production,
            security_headers,
        ))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Graceful shutdown trigger for `axum::serve`
///
/// Resolves when `signal` does. If the signal handler could not be installed
/// the error is logged and this never resolves, so the server keeps running.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_on_signal() {
        let signal = async { Ok::<(), io::Error>(()) };

        let result = tokio::time::timeout(Duration::from_millis(100), shutdown_on(signal)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_failed_signal_keeps_running() {
        let failing = async {
            Err::<(), _>(io::Error::new(io::ErrorKind::Other, "no signal handler"))
        };

        let result = tokio::time::timeout(Duration::from_millis(100), shutdown_on(failing)).await;
        assert!(result.is_err(), "shutdown must not fire when the handler is missing");
    }
}
