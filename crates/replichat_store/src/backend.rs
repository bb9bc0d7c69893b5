//! Store trait definitions.

use crate::batch::WriteBatch;
use crate::error::StoreResult;
use replichat_protocol::{Change, Version};

/// A store holding versioned messages and per-client watermarks.
///
/// The store plays two roles for the pull path: the version store (messages
/// stamped with a global version) and the client watermark store (last
/// applied mutation per client). Both are read through one
/// [`ReadTransaction`] so that every read of a pull observes the same
/// snapshot.
///
/// # Invariants
///
/// - Every committed change carries a unique, strictly increasing version
/// - A read transaction never observes a write committed after it began
/// - `apply` is atomic: either the whole batch is visible or none of it is
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For testing and ephemeral servers
/// - [`super::SqliteStore`] - For persistent storage
pub trait SyncStore: Send + Sync {
    /// Read transaction handle borrowed from the store.
    type Transaction<'a>: ReadTransaction
    where
        Self: 'a;

    /// Begins a read-only transaction over a consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or the snapshot
    /// cannot be established.
    fn begin_read(&self) -> StoreResult<Self::Transaction<'_>>;

    /// Atomically applies a batch of writes.
    ///
    /// Returns the store's max version after the batch commits.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be committed. Nothing from the
    /// batch is visible in that case.
    fn apply(&self, batch: WriteBatch) -> StoreResult<Version>;
}

/// A read-only transaction over one snapshot of a [`SyncStore`].
///
/// Dropping a transaction without calling [`ReadTransaction::commit`] rolls
/// it back.
pub trait ReadTransaction {
    /// Returns the last mutation ID applied for a client.
    ///
    /// Returns `Ok(None)` if the client is unknown.
    fn last_mutation_id(&self, client_id: &str) -> StoreResult<Option<u64>>;

    /// Returns every change with `version > baseline`, ascending by version.
    ///
    /// Records replaced by a later write appear once, at their latest
    /// version. Deleted records appear as tombstones.
    fn changes_since(&self, baseline: Version) -> StoreResult<Vec<Change>>;

    /// Returns the highest version in the store, tombstones included.
    ///
    /// Returns `Ok(None)` if nothing has ever been written.
    fn max_version(&self) -> StoreResult<Option<Version>>;

    /// Ends the transaction.
    fn commit(self) -> StoreResult<()>;
}
