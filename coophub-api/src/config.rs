/// Configuration management for the API server
///
/// Loaded once at startup from environment variables (and a `.env` file when
/// present).
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: Bind address (default `0.0.0.0:3000`)
/// - `API_PREFIX`: Route prefix, always followed by `/v1` (default `api`)
/// - `APP_PRODUCTION`: Enables HSTS (default `false`)
/// - `CORS_ORIGINS`: Comma-separated origins, or `*` (default `*`)
/// - `DATABASE_URL`: PostgreSQL URL, or `memory://` for the in-memory store (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default 10)
/// - `AUTH_JWT_SECRET` / `AUTH_REFRESH_SECRET`: Signing secrets, at least 32 chars (required)
/// - `AUTH_JWT_TOKEN_EXPIRES_IN`: Access token lifetime in minutes (default 15)
/// - `AUTH_REFRESH_TOKEN_EXPIRES_IN`: Refresh token lifetime in days (default 3650)
/// - `APP_FRONTEND_DOMAIN`: Base URL for links in outgoing mail
/// - `MAIL_DEFAULT_EMAIL`: Sender address
///
/// # Example
///
/// ```no_run
/// use coophub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;

use chrono::Duration;
use coophub_shared::auth::jwt::JwtSettings;

/// Minimum length of each signing secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// `DATABASE_URL` value selecting the in-memory store
pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Route prefix without slashes, e.g. `api`
    pub prefix: String,

    pub production: bool,

    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token signing secret
    ///
    /// Generate with: `openssl rand -hex 32`
    pub jwt_secret: String,

    /// Refresh token signing secret, distinct from `jwt_secret`
    pub refresh_secret: String,

    pub token_expires_minutes: i64,
    pub refresh_expires_days: i64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub frontend_domain: String,
    pub default_from: String,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a secret is too
    /// short, or a numeric value does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = required("AUTH_JWT_SECRET")?;
        let refresh_secret = required("AUTH_REFRESH_SECRET")?;

        for (key, secret) in [
            ("AUTH_JWT_SECRET", &jwt_secret),
            ("AUTH_REFRESH_SECRET", &refresh_secret),
        ] {
            if secret.len() < MIN_SECRET_LENGTH {
                anyhow::bail!("{key} must be at least {MIN_SECRET_LENGTH} characters long");
            }
        }

        let cors_origins = or_default("CORS_ORIGINS", "*")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty() && *origin != "*")
            .map(str::to_string)
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: or_default("API_HOST", "0.0.0.0"),
                port: parse(&lookup, "API_PORT", 3000)?,
                prefix: or_default("API_PREFIX", "api").trim_matches('/').to_string(),
                production: parse(&lookup, "APP_PRODUCTION", false)?,
                cors_origins,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            auth: AuthConfig {
                jwt_secret,
                refresh_secret,
                token_expires_minutes: parse(&lookup, "AUTH_JWT_TOKEN_EXPIRES_IN", 15)?,
                refresh_expires_days: parse(&lookup, "AUTH_REFRESH_TOKEN_EXPIRES_IN", 3650)?,
            },
            mail: MailConfig {
                frontend_domain: or_default("APP_FRONTEND_DOMAIN", "http://localhost:3000"),
                default_from: or_default("MAIL_DEFAULT_EMAIL", "noreply@example.com"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Versioned route prefix, e.g. `/api/v1`
    pub fn route_prefix(&self) -> String {
        if self.api.prefix.is_empty() {
            "/v1".to_string()
        } else {
            format!("/{}/v1", self.api.prefix)
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database.url == MEMORY_DATABASE_URL
    }

    pub fn jwt_settings(&self) -> JwtSettings {
        JwtSettings::new(&self.auth.jwt_secret, &self.auth.refresh_secret).with_ttls(
            Duration::minutes(self.auth.token_expires_minutes),
            Duration::days(self.auth.refresh_expires_days),
        )
    }
}

fn parse<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value {raw:?}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgresql://localhost/coophub"),
            ("AUTH_JWT_SECRET", SECRET),
            ("AUTH_REFRESH_SECRET", SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = load(&minimal()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.route_prefix(), "/api/v1");
        assert!(!config.api.production);
        assert!(config.api.cors_origins.is_empty());
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.auth.token_expires_minutes, 15);
        assert_eq!(config.auth.refresh_expires_days, 3650);
        assert!(!config.uses_memory_store());
    }

    #[test]
    fn test_overrides() {
        let mut vars = minimal();
        vars.extend([
            ("API_PORT", "8080"),
            ("API_PREFIX", "/coop/"),
            ("APP_PRODUCTION", "true"),
            ("CORS_ORIGINS", "http://a.example, http://b.example"),
            ("DATABASE_URL", "memory://"),
        ]);

        let config = load(&vars).unwrap();

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.route_prefix(), "/coop/v1");
        assert!(config.api.production);
        assert_eq!(
            config.api.cors_origins,
            vec!["http://a.example".to_string(), "http://b.example".to_string()]
        );
        assert!(config.uses_memory_store());
    }

    #[test]
    fn test_missing_required() {
        let err = load(&[("AUTH_JWT_SECRET", SECRET), ("AUTH_REFRESH_SECRET", SECRET)])
            .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut vars = minimal();
        vars.push(("AUTH_REFRESH_SECRET", "short"));

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("AUTH_REFRESH_SECRET"));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut vars = minimal();
        vars.push(("API_PORT", "not-a-port"));

        assert!(load(&vars).is_err());
    }
}
