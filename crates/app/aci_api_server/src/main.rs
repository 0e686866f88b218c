//! ACI Dashboard API server binary.
//!
//! Reads configuration from flags and the environment (a `.env` file is
//! loaded first), migrates the database and serves the HTTP API until
//! Ctrl-C.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use aci_api::config::{
    ApiConfig, DEFAULT_BIND_ADDR, DEFAULT_DATABASE_URL, DEFAULT_LOGIN_ATTEMPTS,
    DEFAULT_LOGIN_WINDOW_SECS,
};
use aci_core::notify::LogNotifier;
use aci_core::settings::AuthConfig;
use aci_core::store::CredentialStore;
use aci_core::store::memory::MemoryCredentialStore;
use aci_core::store::postgres::PgCredentialStore;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "aci_api_server", about = "ACI Dashboard API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep all data in process memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    in_memory: bool,

    /// Login/reset attempts allowed per client per window.
    #[arg(long, env = "LOGIN_RATE_LIMIT", default_value_t = DEFAULT_LOGIN_ATTEMPTS)]
    login_rate_limit: u32,

    /// Rate-limit window in seconds.
    #[arg(long, env = "LOGIN_RATE_WINDOW_SECS", default_value_t = DEFAULT_LOGIN_WINDOW_SECS)]
    login_rate_window_secs: u64,

    /// Reverse proxies allowed to set X-Forwarded-For (comma-separated IPs).
    #[arg(long, env = "TRUSTED_PROXIES", value_delimiter = ',')]
    trusted_proxies: Vec<IpAddr>,

    /// Superuser created at startup when missing.
    #[arg(long, env = "ADMIN_USERNAME", requires_all = ["admin_email", "admin_password"])]
    admin_username: Option<String>,

    #[arg(long, env = "ADMIN_EMAIL")]
    admin_email: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,aci_api=debug,aci_core=debug")),
        )
        .init();

    let args = Args::parse();
    let auth_config = AuthConfig::from_env()?;
    info!(
        access_ttl_minutes = auth_config.access_ttl_minutes,
        refresh_ttl_days = auth_config.refresh_ttl_days,
        bcrypt_cost = auth_config.bcrypt_cost,
        "auth configuration loaded"
    );

    let store: Arc<dyn CredentialStore> = if args.in_memory {
        warn!("using in-memory credential store; data is lost on exit");
        Arc::new(MemoryCredentialStore::new())
    } else {
        info!(max_connections = args.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&args.database_url)
            .await?;

        info!("running database migrations");
        aci_api::migrate(&pool).await?;
        Arc::new(PgCredentialStore::new(pool))
    };

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        database_url: args.database_url,
        login_attempts_per_window: args.login_rate_limit,
        login_window_secs: args.login_rate_window_secs,
        trusted_proxies: args.trusted_proxies,
    };
    let state = aci_api::AppState::new(config.clone(), &auth_config, store, Arc::new(LogNotifier))?;

    if let (Some(username), Some(email), Some(password)) =
        (&args.admin_username, &args.admin_email, &args.admin_password)
    {
        match aci_api::services::admin::ensure_superuser(&state, username, email, password).await {
            Ok(true) => info!(username = %username, "bootstrap superuser created"),
            Ok(false) => info!(username = %username, "bootstrap superuser already present"),
            Err(e) => return Err(format!("bootstrap superuser: {e}").into()),
        }
    }

    // Periodically drop elapsed rate-limit windows.
    let limiter = state.limiter.clone();
    let window = Duration::from_secs(config.login_window_secs.max(1));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(window);
        loop {
            tick.tick().await;
            limiter.prune();
        }
    });

    let app = aci_api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
