//! SQLite-backed store.
//!
//! Layout:
//!
//! - `message(id, sender, content, ord, version, deleted)` holds one row per
//!   record; a deleted record keeps its row as a tombstone with `deleted = 1`
//! - `replicache_client(id, last_mutation_id)` holds client watermarks

use crate::backend::{ReadTransaction, SyncStore};
use crate::batch::{WriteBatch, WriteOp};
use crate::error::{StoreError, StoreResult};
use parking_lot::{Mutex, MutexGuard};
use replichat_protocol::{Change, ChangeRecord, Version};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS message (
    id TEXT PRIMARY KEY NOT NULL,
    sender TEXT NOT NULL,
    content TEXT NOT NULL,
    ord INTEGER NOT NULL,
    version INTEGER NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS message_version ON message(version);

CREATE TABLE IF NOT EXISTS replicache_client (
    id TEXT PRIMARY KEY NOT NULL,
    last_mutation_id INTEGER NOT NULL
);
"#;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A store persisted in a SQLite database.
///
/// Thread-safe via an internal mutex around a single connection. Read
/// transactions run inside `BEGIN DEFERRED`, so other processes writing to
/// the same file cannot interleave with a pull's reads.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a database file and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            StoreError::Unavailable(format!("cannot open {}: {e}", path.as_ref().display()))
        })?;
        // WAL lets readers keep their snapshot while another process writes.
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "opened sqlite store");
        Self::with_connection(conn)
    }

    /// Creates an in-memory database.
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(value: i64, column: &str) -> StoreResult<u64> {
    u64::try_from(value)
        .map_err(|_| StoreError::Corrupted(format!("negative {column}: {value}")))
}

impl SyncStore for SqliteStore {
    type Transaction<'a> = SqliteReadTransaction<'a>;

    fn begin_read(&self) -> StoreResult<SqliteReadTransaction<'_>> {
        let conn = self.conn.lock();
        conn.execute_batch("BEGIN DEFERRED")?;
        Ok(SqliteReadTransaction { conn, open: true })
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<Version> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut max: i64 = tx.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM message",
            [],
            |row| row.get(0),
        )?;

        for op in batch.ops() {
            match op {
                WriteOp::Put(message) => {
                    max += 1;
                    tx.execute(
                        "INSERT INTO message (id, sender, content, ord, version, deleted)
                         VALUES (?1, ?2, ?3, ?4, ?5, 0)
                         ON CONFLICT(id) DO UPDATE SET
                             sender = excluded.sender,
                             content = excluded.content,
                             ord = excluded.ord,
                             version = excluded.version,
                             deleted = 0",
                        params![message.id, message.sender, message.content, message.order, max],
                    )?;
                }
                WriteOp::Delete(id) => {
                    let updated = tx.execute(
                        "UPDATE message
                         SET deleted = 1, sender = '', content = '', version = ?2
                         WHERE id = ?1 AND deleted = 0",
                        params![id, max + 1],
                    )?;
                    if updated > 0 {
                        max += 1;
                    }
                }
            }
        }

        if let Some(watermark) = batch.watermark() {
            tx.execute(
                "INSERT INTO replicache_client (id, last_mutation_id) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     last_mutation_id = MAX(last_mutation_id, excluded.last_mutation_id)",
                params![watermark.client_id, to_sql_int(watermark.last_mutation_id)],
            )?;
        }

        tx.commit()?;
        from_sql_int(max, "version")
    }
}

/// Read transaction over a [`SqliteStore`].
///
/// Holds the connection until committed or dropped; dropping an open
/// transaction rolls it back.
pub struct SqliteReadTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    open: bool,
}

impl ReadTransaction for SqliteReadTransaction<'_> {
    fn last_mutation_id(&self, client_id: &str) -> StoreResult<Option<u64>> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT last_mutation_id FROM replicache_client WHERE id = ?1",
                params![client_id],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|v| from_sql_int(v, "last_mutation_id"))
            .transpose()
    }

    fn changes_since(&self, baseline: Version) -> StoreResult<Vec<Change>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, sender, content, ord, version, deleted
             FROM message WHERE version > ?1 ORDER BY version ASC",
        )?;
        let rows = stmt.query_map(params![to_sql_int(baseline)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })?;

        let mut changes = Vec::new();
        for row in rows {
            let (id, sender, content, order, version, deleted) = row?;
            let version = from_sql_int(version, "version")?;
            changes.push(if deleted {
                Change::Delete { id, version }
            } else {
                Change::Put(ChangeRecord {
                    id,
                    sender,
                    content,
                    order,
                    version,
                })
            });
        }
        Ok(changes)
    }

    fn max_version(&self) -> StoreResult<Option<Version>> {
        let value: Option<i64> =
            self.conn
                .query_row("SELECT MAX(version) FROM message", [], |row| row.get(0))?;
        value.map(|v| from_sql_int(v, "version")).transpose()
    }

    fn commit(mut self) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.open = false;
        Ok(())
    }
}

impl Drop for SqliteReadTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "failed to roll back read transaction");
            }
        }
    }
}
