use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use block_blast_backend::{
    api,
    config::Config,
    constants::{DEFAULT_LOG_FILTER, SERVICE_NAME},
    db::{InMemoryScoreStore, InMemoryUserStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; a missing bot token stops the process here
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("{} starting up...", SERVICE_NAME);
    tracing::info!("Environment: {}", config.environment);

    let app_state = api::AppState::new(
        config.clone(),
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryScoreStore::new()),
    )?;
    let app = api::build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {e}"))?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("{} shut down", SERVICE_NAME);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
