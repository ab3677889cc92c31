mod app;
mod auth;
mod config;
mod error;
mod routes_datasets;
mod routes_report;
mod routes_upload;
mod state;
mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use equipment_store::{DatasetStore, FsBlobStore};
use tracing::info;

use crate::config::AppConfig;
use crate::state::{AppState, Credentials};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = AppConfig::from_env()?;

    // --- Storage ---
    if let Some(dir) = cfg.database_dir() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }
    let blobs = Arc::new(FsBlobStore::new(&cfg.upload_dir));
    let store = DatasetStore::connect(&cfg.database_url, blobs)
        .await
        .context("Failed to open dataset store")?;
    info!(
        database = %cfg.database_url,
        uploads = %cfg.upload_dir.display(),
        datasets = store.count().await?,
        "dataset store ready"
    );

    let state = Arc::new(AppState::new(store, Credentials::new(&cfg.username, &cfg.password)));
    let app = app::build_router(state.clone(), &cfg);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.bind_addr))?;
    info!(addr = %cfg.bind_addr, "equipment api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown())
        .await
        .context("Server error")?;

    state.store.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    info!("shutdown signal received");
}
