//! tbauth login gateway server binary.
//!
//! Fetches the identity provider's key set, then serves the login gateway.
//! The listener is not bound until the key set is in hand, so a failed fetch
//! means the process exits without ever accepting traffic.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tbauth_api::config::{ApiConfig, parse_duration, parse_token_lifetime};
use tbauth_core::auth::keyset::KeySetCache;
use tbauth_core::auth::queries::PgUserStore;
use tbauth_core::db::{self, DbTarget, PoolSettings};
use tracing::info;
use url::Url;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,tbauth_api=debug,tbauth_core=debug";

/// CLI arguments; every one can also come from the environment.
#[derive(Parser, Debug)]
#[command(name = "tbauth_api_server", about = "OIDC login gateway for the IoT platform")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = tbauth_api::config::DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// Full PostgreSQL connection URL; overrides the POSTGRES_* parameters.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "POSTGRES_USER", default_value = "postgres")]
    postgres_user: String,

    #[arg(long, env = "POSTGRES_SECRET", hide_env_values = true)]
    postgres_secret: Option<String>,

    #[arg(long, env = "POSTGRES_HOST")]
    postgres_host: Option<String>,

    #[arg(long, env = "POSTGRES_PORT", default_value_t = 5432)]
    postgres_port: u16,

    #[arg(long, env = "POSTGRES_DATABASE", default_value = db::DEFAULT_DATABASE)]
    postgres_database: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "POSTGRES_MAX_CONNECTIONS", default_value_t = 10)]
    postgres_max_connections: u32,

    /// How long a query may wait for a pooled connection.
    #[arg(long, env = "POSTGRES_ACQUIRE_TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    postgres_acquire_timeout: Duration,

    /// Shared secret for minted session tokens.
    #[arg(long, env = "TOKEN_SIGNING_KEY", hide_env_values = true)]
    token_signing_key: String,

    /// Access token lifetime, e.g. `9000s`, `2.5h`. At least one second.
    #[arg(long, env = "ACCESS_TOKEN_EXPIRATION", default_value = "9000s", value_parser = parse_token_lifetime)]
    access_token_expiration: Duration,

    /// Refresh token lifetime, e.g. `604800s`, `7d`. At least one second.
    #[arg(long, env = "REFRESH_TOKEN_EXPIRATION", default_value = "604800s", value_parser = parse_token_lifetime)]
    refresh_token_expiration: Duration,

    /// Identity provider's published key set (JWKS) URL.
    #[arg(long, env = "OAUTH2_CERTS_ENDPOINT")]
    oauth2_certs_endpoint: Url,

    /// Refetch the key set on an unknown key id, at most once per interval.
    /// Unset means the key set is fetched once at startup only.
    #[arg(long, env = "OAUTH2_CERTS_REFETCH_INTERVAL", value_parser = parse_duration)]
    oauth2_certs_refetch_interval: Option<Duration>,

    /// The platform's native login endpoint.
    #[arg(long, env = "THINGSBOARD_AUTH_URL")]
    thingsboard_auth_url: Url,

    /// Bound on key set fetches and forwarded legacy logins.
    #[arg(long, env = "UPSTREAM_TIMEOUT", default_value = "10s", value_parser = parse_duration)]
    upstream_timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();

    let target = DbTarget::resolve(
        args.database_url,
        args.postgres_host,
        args.postgres_port,
        args.postgres_user,
        args.postgres_secret,
        args.postgres_database,
    )?;
    info!(
        database = %target.redacted(),
        max_connections = args.postgres_max_connections,
        "configuring connection pool"
    );
    let pool = db::connect_lazy(
        &target,
        &PoolSettings {
            max_connections: args.postgres_max_connections,
            acquire_timeout: args.postgres_acquire_timeout,
        },
    )?;

    let http = reqwest::Client::builder()
        .timeout(args.upstream_timeout)
        .build()?;
    let mut keys = KeySetCache::fetch(http, args.oauth2_certs_endpoint.as_str()).await?;
    if let Some(interval) = args.oauth2_certs_refetch_interval {
        info!(?interval, "key set refetch on unknown kid enabled");
        keys = keys.with_refetch_interval(interval);
    }

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        signing_key: args.token_signing_key,
        access_token_ttl: args.access_token_expiration,
        refresh_token_ttl: args.refresh_token_expiration,
        upstream_login_url: args.thingsboard_auth_url,
        upstream_timeout: args.upstream_timeout,
    };
    info!(?config, "starting tbauth_api_server");

    let state = tbauth_api::AppState::new(&config, keys, Arc::new(PgUserStore::new(pool)))?;
    let app = tbauth_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "login gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("login gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
