use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emporium::auth::TokenService;
use emporium::config::Config;
use emporium::store::Store;
use emporium::AppState;

#[derive(Parser, Debug)]
#[command(name = "emporium")]
#[command(author, version, about = "A lightweight e-commerce backend", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "emporium.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long, env = "EMPORIUM_LOG")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Emporium v{}", env!("CARGO_PKG_VERSION"));

    // Ensure the database directory exists
    if let Some(parent) = config.database.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create data directory: {}", parent.display()))?;
    }

    // Initialize the store and its tables
    let store = Store::connect(&config.database.path, emporium::records::registry()).await?;
    store.ensure_schema().await?;

    // Token service; an unset secret gets a throwaway one
    let secret = if config.auth.secret.is_empty() {
        tracing::warn!("No auth.secret configured; tokens will not survive a restart");
        uuid::Uuid::new_v4().to_string()
    } else {
        config.auth.secret.clone()
    };
    let tokens = TokenService::new(
        &secret,
        config.auth.signing_algorithm()?,
        config.auth.token_ttl_minutes,
    )?;

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), store, tokens));

    let app = emporium::api::create_router(state);

    // Start API server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
