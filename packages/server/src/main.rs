use std::sync::Arc;

use anyhow::Context;
use server::config::AppConfig;
use server::database::init_db;
use server::state::AppState;
use server::store::{CollectionStore, MemoryCollectionStore, SqlCollectionStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let collections: Arc<dyn CollectionStore> = match &config.database.url {
        Some(url) => {
            let db = init_db(&config.database, url)
                .await
                .context("failed to connect to the database")?;
            info!("Connected to database");
            Arc::new(SqlCollectionStore::new(db))
        }
        None => {
            warn!("database.url is not set; collections are kept in memory only");
            Arc::new(MemoryCollectionStore::new())
        }
    };

    let blobs = common::storage::open(&config.storage)
        .await
        .context("failed to open blob storage")?;
    info!(backend = ?config.storage.backend, "Blob storage ready");

    let addr = config.bind_addr();
    let state = AppState::new(config, collections, blobs);
    let viewers = state.viewers.clone();
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(viewers.clone()))
        .await?;

    viewers.clear();
    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, closing every viewer session so upgraded sockets drain.
async fn shutdown_signal(viewers: server::broadcast::ViewerRegistry) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!(sessions = viewers.len(), "Shutting down");
    viewers.clear();
}
