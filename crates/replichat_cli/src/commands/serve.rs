//! Serve command implementation.

use replichat_server::{ServerConfig, SyncServer};
use replichat_store::{
    MemoryStore, NewMessage, ReadTransaction, SqliteStore, SyncStore, WriteBatch,
};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Runs the pull server until interrupted.
///
/// Serves from the SQLite database at `path`, or from a fresh in-memory
/// store when no path is given.
pub fn run(
    path: Option<&Path>,
    config: ServerConfig,
    demo: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "opening sqlite store");
            let store = Arc::new(SqliteStore::open(path)?);
            if demo {
                seed_demo(store.as_ref())?;
            }
            runtime.block_on(serve(config, store))
        }
        None => {
            tracing::info!("using in-memory store");
            let store = Arc::new(MemoryStore::new());
            if demo {
                seed_demo(store.as_ref())?;
            }
            runtime.block_on(serve(config, store))
        }
    }
}

async fn serve<S: SyncStore + 'static>(
    config: ServerConfig,
    store: Arc<S>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    SyncServer::new(config, store)
        .serve_with_shutdown(listener, shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("shutdown requested");
}

/// Writes the two demo messages if the store has never been written.
///
/// Returns whether anything was written.
pub fn seed_demo<S: SyncStore>(store: &S) -> Result<bool, Box<dyn std::error::Error>> {
    let empty = {
        let txn = store.begin_read()?;
        let max = txn.max_version()?;
        txn.commit()?;
        max.is_none()
    };
    if !empty {
        tracing::info!("store already populated, skipping demo seed");
        return Ok(false);
    }

    let version = store.apply(
        WriteBatch::new()
            .put(NewMessage::new("a", "Jane", "Hey, what's for lunch?", 1))
            .put(NewMessage::new("b", "Fred", "tacos?", 2)),
    )?;
    tracing::info!(version, "seeded demo messages");
    Ok(true)
}
