use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use revenue_engine::adapter::HttpMetricSource;
use revenue_engine::api::{create_router, state::AppState};
use revenue_engine::config::EngineConfig;
use revenue_engine::engine::RevenueEngine;
use revenue_engine::scheduler;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(version = revenue_engine::SERVICE_VERSION, "Starting revenue engine");

    let config = EngineConfig::load().context("loading configuration")?;

    let source = HttpMetricSource::from_platforms(&config.platforms, config.fetch_timeout())
        .context("building metrics client")?;
    let engine = Arc::new(RevenueEngine::bootstrap(&config, Arc::new(source)).await);

    let refresher = scheduler::spawn(Arc::clone(&engine), config.refresh_interval());

    let app = create_router(AppState::new(Arc::clone(&engine)));

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr))?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let cycles = refresher.shutdown().await;
    engine.persist().await;
    tracing::info!(cycles, "Revenue engine stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
