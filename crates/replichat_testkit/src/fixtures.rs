//! Store fixtures.
//!
//! Provides ready-made stores for common test scenarios.

use replichat_protocol::{Change, Version};
use replichat_store::{
    MemoryStore, NewMessage, ReadTransaction, SqliteStore, StoreError, StoreResult, SyncStore,
    WriteBatch,
};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// The two messages every chat fixture starts with.
///
/// `a` is written at version 1 and `b` at version 2.
pub fn chat_messages() -> Vec<NewMessage> {
    vec![
        NewMessage::new("a", "Jane", "Hey, what's for lunch?", 1),
        NewMessage::new("b", "Fred", "tacos?", 2),
    ]
}

/// Writes `messages` in one batch.
pub fn seed<S: SyncStore>(store: &S, messages: Vec<NewMessage>) -> Version {
    let batch = messages
        .into_iter()
        .fold(WriteBatch::new(), |batch, message| batch.put(message));
    store.apply(batch).expect("Failed to seed store")
}

/// Creates an in-memory store holding [`chat_messages`].
pub fn chat_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    seed(&store, chat_messages());
    Arc::new(store)
}

/// A SQLite store in a temporary directory, removed on drop.
pub struct TestSqliteStore {
    /// The store instance.
    pub store: Arc<SqliteStore>,
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TestSqliteStore {
    /// Creates an empty file-backed store.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("replichat.db");
        let store = SqliteStore::open(&path).expect("Failed to open sqlite store");
        Self {
            store: Arc::new(store),
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Creates a file-backed store holding [`chat_messages`].
    pub fn chat() -> Self {
        let test_store = Self::new();
        seed(test_store.store.as_ref(), chat_messages());
        test_store
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a second connection to the same database file.
    pub fn reopen(&self) -> SqliteStore {
        SqliteStore::open(&self.path).expect("Failed to reopen sqlite store")
    }
}

impl Default for TestSqliteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestSqliteStore {
    type Target = SqliteStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// A store whose every operation fails with [`StoreError::Unavailable`].
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    /// Creates a store that fails with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Transaction type of [`UnavailableStore`]; it can never be constructed.
pub struct NoTransaction(Infallible);

impl ReadTransaction for NoTransaction {
    fn last_mutation_id(&self, _client_id: &str) -> StoreResult<Option<u64>> {
        match self.0 {}
    }

    fn changes_since(&self, _baseline: Version) -> StoreResult<Vec<Change>> {
        match self.0 {}
    }

    fn max_version(&self) -> StoreResult<Option<Version>> {
        match self.0 {}
    }

    fn commit(self) -> StoreResult<()> {
        match self.0 {}
    }
}

impl SyncStore for UnavailableStore {
    type Transaction<'a> = NoTransaction;

    fn begin_read(&self) -> StoreResult<NoTransaction> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    fn apply(&self, _batch: WriteBatch) -> StoreResult<Version> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}
