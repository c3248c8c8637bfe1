//! TutorHub - Administrative backend for a tutoring center

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LoggingConfig};
use tutorhub_api::{AppState, create_router};
use tutorhub_auth::{TokenCodec, hash_password};
use tutorhub_db::{Database, NewAccount, Role};

/// TutorHub - Administrative backend for a tutoring center
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "TUTORHUB_CONFIG")]
    config: String,

    /// Bind address
    #[arg(long, env = "TUTORHUB_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "TUTORHUB_PORT")]
    port: Option<u16>,

    /// Token signing secret, overrides auth.jwt_secret
    #[arg(long, env = "TUTORHUB_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(secret) = args.jwt_secret {
        config.auth.jwt_secret = secret;
    }

    // Initialize logging
    init_logging(&config.logging);

    config.validate()?;

    info!("Starting TutorHub v{}", env!("CARGO_PKG_VERSION"));

    // Create data directory
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }

    // Initialize database
    let db = Database::new(&config.database.url()).await?;

    // Create the bootstrap admin account if no accounts exist
    if !db.has_accounts().await? {
        bootstrap_admin(&db, &config).await?;
    }

    // Initialize token codec
    let ttl_secs = i64::try_from(config.auth.token_ttl_secs)
        .context("auth.token_ttl_secs is out of range")?;
    let ttl = chrono::Duration::try_seconds(ttl_secs).context("auth.token_ttl_secs is out of range")?;
    let codec = Arc::new(TokenCodec::new(&config.auth.jwt_secret, ttl)?);

    // Create application state
    let state = AppState::new(db, codec)?;

    // Install metrics recorder
    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    // Create router
    let app = create_router(state, metrics_handle);

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the first admin account from the `auth.admin_*` settings
async fn bootstrap_admin(db: &Database, config: &Config) -> Result<()> {
    info!("Creating admin account {}", config.auth.admin_username);

    let password_hash = hash_password(&config.auth.admin_password)?;
    db.insert_account(NewAccount {
        username: config.auth.admin_username.clone(),
        password_hash,
        role: Role::Admin,
        full_name: None,
        email: None,
        phone: None,
    })
    .await?;

    if config.auth.admin_password == "admin" {
        warn!(
            "Admin account {} uses the default password; change it",
            config.auth.admin_username
        );
    }
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
