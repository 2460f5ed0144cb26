// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::ndvi_service::NdviService;
use crate::infrastructure::config::load_config;
use crate::infrastructure::earth_engine::EarthEngineClient;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_config()?;

    // Create the authenticated remote session (infrastructure layer)
    let backend = Arc::new(EarthEngineClient::new(&config.earth_engine)?);
    if !backend.has_credentials() {
        tracing::warn!("No Earth Engine access token configured; remote queries will be rejected");
    }

    // Create services (application layer)
    let ndvi_service = NdviService::new(backend, config.query.clone(), config.chart.clone());

    // Create application state
    let state = Arc::new(AppState { ndvi_service });

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!(
        "Starting ndvi-timeseries service on {} (collection {}, project {})",
        addr,
        config.query.collection_id,
        config.earth_engine.project
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;

    Ok(())
}
