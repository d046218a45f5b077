/**
 * Server Configuration
 *
 * Configuration comes from environment variables (optionally loaded from a
 * `.env` file by the binary). Every setting has a development default except
 * `JWT_SECRET`, which must be set unless `APP_ENV=development`.
 *
 * # Variables
 *
 * | Variable | Default |
 * |---|---|
 * | `SERVER_HOST` / `SERVER_PORT` | `0.0.0.0` / `3000` |
 * | `DATABASE_URL` | `sqlite://stride.db?mode=rwc` |
 * | `JWT_SECRET`, `JWT_EXPIRY_DAYS` | required, `30` |
 * | `BCRYPT_COST` | `12` |
 * | `BILLING_WEBHOOK_SECRET` | unset (webhook answers 503) |
 * | `RATE_LIMIT_MAX`, `RATE_LIMIT_WINDOW_SECS` | `100`, `60` |
 * | `CORS_ORIGIN` | any origin |
 * | `EMAIL_ENABLED`, `SMTP_*`, `EMAIL_FROM` | disabled |
 *
 * The database loader falls back to an in-memory store when the configured
 * one cannot be opened, so the server still starts.
 */

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

const DEV_JWT_SECRET: &str = "stride-development-secret";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Outbound SMTP settings
#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    pub bcrypt_cost: u32,
    /// `None` disables the billing webhook
    pub billing_webhook_secret: Option<String>,
    /// Maximum age of a signed webhook timestamp
    pub webhook_tolerance_secs: i64,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// `None` allows any origin
    pub cors_origin: Option<String>,
    pub email: EmailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite://stride.db?mode=rwc".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiry_days: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            billing_webhook_secret: None,
            webhook_tolerance_secs: 300,
            rate_limit_max: 100,
            rate_limit_window_secs: 60,
            cors_origin: None,
            email: EmailConfig {
                enabled: false,
                smtp_host: None,
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                from_address: "Stride <no-reply@stride.local>".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let development = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        let jwt_secret = match non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None if development => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::MissingValue("JWT_SECRET")),
        };

        let config = Self {
            host: non_empty("SERVER_HOST").unwrap_or(defaults.host),
            port: parse_env("SERVER_PORT", defaults.port)?,
            database_url: non_empty("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret,
            jwt_expiry_days: parse_env("JWT_EXPIRY_DAYS", defaults.jwt_expiry_days)?,
            bcrypt_cost: parse_env("BCRYPT_COST", defaults.bcrypt_cost)?,
            billing_webhook_secret: non_empty("BILLING_WEBHOOK_SECRET"),
            webhook_tolerance_secs: parse_env(
                "BILLING_WEBHOOK_TOLERANCE_SECS",
                defaults.webhook_tolerance_secs,
            )?,
            rate_limit_max: parse_env("RATE_LIMIT_MAX", defaults.rate_limit_max)?,
            rate_limit_window_secs: parse_env(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )?,
            cors_origin: non_empty("CORS_ORIGIN"),
            email: EmailConfig {
                enabled: parse_env("EMAIL_ENABLED", false)?,
                smtp_host: non_empty("SMTP_HOST"),
                smtp_port: parse_env("SMTP_PORT", defaults.email.smtp_port)?,
                smtp_username: non_empty("SMTP_USERNAME"),
                smtp_password: non_empty("SMTP_PASSWORD"),
                from_address: non_empty("EMAIL_FROM").unwrap_or(defaults.email.from_address),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                key: "BCRYPT_COST",
                value: self.bcrypt_cost.to_string(),
            });
        }
        if self.jwt_expiry_days <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRY_DAYS",
                value: self.jwt_expiry_days.to_string(),
            });
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_WINDOW_SECS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

/// Builder for AppConfig, mostly used by tests
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: Option<AppConfig>,
}

impl AppConfigBuilder {
    fn config(&mut self) -> &mut AppConfig {
        self.config.get_or_insert_with(AppConfig::default)
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config().jwt_secret = secret.into();
        self
    }

    pub fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.config().bcrypt_cost = cost;
        self
    }

    pub fn billing_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.config().billing_webhook_secret = Some(secret.into());
        self
    }

    pub fn rate_limit(mut self, max: u32, window_secs: u64) -> Self {
        let config = self.config();
        config.rate_limit_max = max;
        config.rate_limit_window_secs = window_secs;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config().database_url = url.into();
        self
    }

    /// Build the configuration
    pub fn build(mut self) -> Result<AppConfig, ConfigError> {
        let config = self.config().clone();
        config.validate()?;
        Ok(config)
    }
}

/// Open the SQLite pool and run migrations
///
/// If the configured database cannot be opened the server falls back to a
/// private in-memory database and logs a warning. Migration failures are
/// logged; the pool is still returned.
pub async fn load_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let pool = match open_pool(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to open database {}: {:?}", database_url, e);
            tracing::warn!("Falling back to an in-memory database; data will not persist");
            memory_pool().await?
        }
    };

    tracing::info!("Running database migrations...");
    match run_migrations(&pool).await {
        Ok(()) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Ok(pool)
}

async fn open_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Single-connection in-memory pool; the database lives as long as the pool
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Apply the embedded migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
