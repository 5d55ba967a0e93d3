//! PostgreSQL connection pool for the platform's user store.
//!
//! The pool connects lazily: nothing touches the database until the first
//! login query, so the process starts (and answers liveness checks) while the
//! database is still coming up.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use thiserror::Error;

/// Default database name of a platform installation.
pub const DEFAULT_DATABASE: &str = "thingsboard";

/// Errors that can occur while building the pool.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid database URL: {0}")]
    InvalidUrl(#[source] sqlx::Error),

    #[error("database host and password are required when no URL is given")]
    MissingParameters,
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;

/// How to reach the database: a full URL, or discrete connection parameters.
#[derive(Debug, Clone)]
pub enum DbTarget {
    Url(String),
    Params {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
}

impl DbTarget {
    /// Prefer `url`; otherwise require `host` and `password`.
    pub fn resolve(
        url: Option<String>,
        host: Option<String>,
        port: u16,
        user: String,
        password: Option<String>,
        database: String,
    ) -> Result<Self> {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            return Ok(Self::Url(url));
        }
        match (host, password) {
            (Some(host), Some(password)) => Ok(Self::Params {
                host,
                port,
                user,
                password,
                database,
            }),
            _ => Err(DbError::MissingParameters),
        }
    }

    fn connect_options(&self) -> Result<PgConnectOptions> {
        match self {
            Self::Url(url) => url.parse().map_err(DbError::InvalidUrl),
            Self::Params {
                host,
                port,
                user,
                password,
                database,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(database)),
        }
    }

    /// Connection target with the password elided, for logging.
    pub fn redacted(&self) -> String {
        match self {
            Self::Url(url) => match url::Url::parse(url) {
                Ok(mut parsed) => {
                    if parsed.password().is_some() {
                        let _ = parsed.set_password(Some("***"));
                    }
                    parsed.to_string()
                }
                Err(_) => "<unparsable url>".to_string(),
            },
            Self::Params {
                host,
                port,
                user,
                database,
                ..
            } => format!("postgres://{user}:***@{host}:{port}/{database}"),
        }
    }
}

/// Pool sizing and checkout bound.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Build a lazily connecting pool for `target`.
pub fn connect_lazy(target: &DbTarget, settings: &PoolSettings) -> Result<PgPool> {
    let options = target.connect_options()?;
    Ok(PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_lazy_with(options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_takes_precedence() {
        let target = DbTarget::resolve(
            Some("postgres://tb:pw@db:5432/tb".into()),
            None,
            5432,
            "postgres".into(),
            None,
            DEFAULT_DATABASE.into(),
        )
        .unwrap();
        assert!(matches!(target, DbTarget::Url(_)));
    }

    #[test]
    fn params_require_host_and_password() {
        let missing = DbTarget::resolve(
            None,
            Some("db".into()),
            5432,
            "postgres".into(),
            None,
            DEFAULT_DATABASE.into(),
        );
        assert!(matches!(missing, Err(DbError::MissingParameters)));

        let target = DbTarget::resolve(
            None,
            Some("db".into()),
            5433,
            "postgres".into(),
            Some("pw".into()),
            DEFAULT_DATABASE.into(),
        )
        .unwrap();
        assert_eq!(target.redacted(), "postgres://postgres:***@db:5433/thingsboard");
    }

    #[test]
    fn redacted_url_hides_password() {
        let target = DbTarget::Url("postgres://tb:secret@db:5432/tb".into());
        let shown = target.redacted();
        assert!(!shown.contains("secret"));
        assert!(shown.contains("***"));
    }

    #[tokio::test]
    async fn lazy_pool_builds_without_database() {
        let target = DbTarget::Url("postgres://tb:pw@127.0.0.1:1/tb".into());
        let pool = connect_lazy(&target, &PoolSettings::default()).unwrap();
        assert_eq!(pool.size(), 0);
    }
}
