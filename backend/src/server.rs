//! Process bootstrap: store, manager, router and listener.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::api;
use crate::config::{ServerConfig, StoreBackend};
use crate::manager::SessionManager;
use crate::store::{MemorySessionStore, SessionStore, SqliteSessionStore};

/// Open the configured session store.
pub async fn open_store(backend: &StoreBackend) -> anyhow::Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match backend {
        StoreBackend::Memory => {
            info!("keeping games in memory");
            Arc::new(MemorySessionStore::new())
        }
        StoreBackend::Sqlite { url } => {
            let store = SqliteSessionStore::connect(url)
                .await
                .with_context(|| format!("failed to open session database {url}"))?;
            info!(url = %url, "keeping games in SQLite");
            Arc::new(store)
        }
    };
    Ok(store)
}

/// Serve the API until ctrl-c.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let store = open_store(&config.store).await?;
    let manager = Arc::new(SessionManager::new(store, config.limits));
    let app = api::router(manager);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        addr = %config.bind_addr,
        default_depth = config.limits.default_depth,
        max_depth = config.limits.max_depth,
        "API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
