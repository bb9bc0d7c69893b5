//! Put and delete command implementations.
//!
//! These stand in for the push endpoint when populating a database by hand.

use replichat_store::{NewMessage, SqliteStore, SyncStore, WriteBatch};
use std::path::Path;

/// Writes a message, optionally acknowledging a client mutation.
pub fn put(
    path: &Path,
    id: String,
    from: String,
    content: String,
    order: i64,
    ack: Option<(String, u64)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = WriteBatch::new().put(NewMessage::new(id.clone(), from, content, order));
    let version = apply(path, with_ack(batch, ack))?;
    println!("Wrote message {id} at version {version}");
    Ok(())
}

/// Deletes a message, optionally acknowledging a client mutation.
pub fn delete(
    path: &Path,
    id: String,
    ack: Option<(String, u64)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = WriteBatch::new().delete(id.clone());
    let version = apply(path, with_ack(batch, ack))?;
    println!("Deleted message {id} (store version {version})");
    Ok(())
}

fn with_ack(batch: WriteBatch, ack: Option<(String, u64)>) -> WriteBatch {
    match ack {
        Some((client_id, mutation_id)) => batch.acknowledge(client_id, mutation_id),
        None => batch,
    }
}

fn apply(path: &Path, batch: WriteBatch) -> Result<u64, Box<dyn std::error::Error>> {
    let store = SqliteStore::open(path)?;
    let version = store.apply(batch)?;
    tracing::debug!(path = %path.display(), version, "applied write batch");
    Ok(version)
}
