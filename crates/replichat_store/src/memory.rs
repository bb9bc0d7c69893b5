//! In-memory store for testing and ephemeral servers.

use crate::backend::{ReadTransaction, SyncStore};
use crate::batch::{WriteBatch, WriteOp};
use crate::error::StoreResult;
use parking_lot::{RwLock, RwLockReadGuard};
use replichat_protocol::{Change, ChangeRecord, Version};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

/// Committed store contents.
#[derive(Debug, Default)]
struct StoreState {
    /// Latest change per record ID (a put or a tombstone).
    rows: HashMap<String, Change>,
    /// Version index over `rows`: version -> record ID.
    by_version: BTreeMap<Version, String>,
    /// Client watermarks: client ID -> last mutation ID.
    clients: HashMap<String, u64>,
}

impl StoreState {
    fn max_version(&self) -> Option<Version> {
        self.by_version.keys().next_back().copied()
    }

    fn next_version(&self) -> Version {
        self.max_version().unwrap_or(0) + 1
    }

    /// Installs a change, dropping the index entry of the row it replaces.
    fn install(&mut self, change: Change) {
        let id = change.id().to_string();
        let version = change.version();
        if let Some(old) = self.rows.insert(id.clone(), change) {
            self.by_version.remove(&old.version());
        }
        self.by_version.insert(version, id);
    }

    fn is_live(&self, id: &str) -> bool {
        matches!(self.rows.get(id), Some(Change::Put(_)))
    }
}

/// An in-memory store.
///
/// Readers share a read lock for the lifetime of their transaction and
/// writers take the write lock for the duration of a batch, so a read
/// transaction always sees a single committed state.
///
/// # Example
///
/// ```rust
/// use replichat_store::{MemoryStore, NewMessage, ReadTransaction, SyncStore, WriteBatch};
///
/// let store = MemoryStore::new();
/// store
///     .apply(WriteBatch::new().put(NewMessage::new("a", "Jane", "hey", 1)))
///     .unwrap();
///
/// let txn = store.begin_read().unwrap();
/// assert_eq!(txn.max_version().unwrap(), Some(1));
/// assert_eq!(txn.changes_since(0).unwrap().len(), 1);
/// txn.commit().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rows, tombstones included.
    pub fn len(&self) -> usize {
        self.state.read().rows.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.state.read().rows.is_empty()
    }
}

impl SyncStore for MemoryStore {
    type Transaction<'a> = MemoryReadTransaction<'a>;

    fn begin_read(&self) -> StoreResult<MemoryReadTransaction<'_>> {
        Ok(MemoryReadTransaction {
            state: self.state.read(),
        })
    }

    fn apply(&self, batch: WriteBatch) -> StoreResult<Version> {
        let mut state = self.state.write();

        for op in batch.ops() {
            match op {
                WriteOp::Put(message) => {
                    let version = state.next_version();
                    state.install(Change::Put(ChangeRecord {
                        id: message.id.clone(),
                        sender: message.sender.clone(),
                        content: message.content.clone(),
                        order: message.order,
                        version,
                    }));
                }
                WriteOp::Delete(id) => {
                    if state.is_live(id) {
                        let version = state.next_version();
                        state.install(Change::Delete {
                            id: id.clone(),
                            version,
                        });
                    }
                }
            }
        }

        if let Some(watermark) = batch.watermark() {
            let entry = state
                .clients
                .entry(watermark.client_id.clone())
                .or_insert(0);
            *entry = (*entry).max(watermark.last_mutation_id);
        }

        Ok(state.max_version().unwrap_or(0))
    }
}

/// Read transaction over a [`MemoryStore`].
///
/// Holds the store's read lock until committed or dropped.
pub struct MemoryReadTransaction<'a> {
    state: RwLockReadGuard<'a, StoreState>,
}

impl ReadTransaction for MemoryReadTransaction<'_> {
    fn last_mutation_id(&self, client_id: &str) -> StoreResult<Option<u64>> {
        Ok(self.state.clients.get(client_id).copied())
    }

    fn changes_since(&self, baseline: Version) -> StoreResult<Vec<Change>> {
        Ok(self
            .state
            .by_version
            .range((Bound::Excluded(baseline), Bound::Unbounded))
            .filter_map(|(_, id)| self.state.rows.get(id).cloned())
            .collect())
    }

    fn max_version(&self) -> StoreResult<Option<Version>> {
        Ok(self.state.max_version())
    }

    fn commit(self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::NewMessage;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .apply(
                WriteBatch::new()
                    .put(NewMessage::new("a", "Jane", "Hey, what's for lunch?", 1))
                    .put(NewMessage::new("b", "Fred", "tacos?", 2)),
            )
            .unwrap();
        store
    }

    #[test]
    fn empty_store() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        let txn = store.begin_read().unwrap();
        assert_eq!(txn.max_version().unwrap(), None);
        assert!(txn.changes_since(0).unwrap().is_empty());
        assert_eq!(txn.last_mutation_id("anyone").unwrap(), None);
    }

    #[test]
    fn versions_assigned_in_batch_order() {
        let store = seeded();
        let txn = store.begin_read().unwrap();

        let changes = txn.changes_since(0).unwrap();
        let versions: Vec<_> = changes.iter().map(Change::version).collect();
        assert_eq!(versions, vec![1, 2]);
        assert_eq!(changes[0].id(), "a");
        assert_eq!(txn.max_version().unwrap(), Some(2));
    }

    #[test]
    fn changes_since_is_exclusive() {
        let store = seeded();
        let txn = store.begin_read().unwrap();

        let changes = txn.changes_since(1).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].id(), "b");
        assert!(txn.changes_since(2).unwrap().is_empty());
        assert!(txn.changes_since(Version::MAX).unwrap().is_empty());
    }

    #[test]
    fn replacing_a_record_moves_it_forward() {
        let store = seeded();
        let max = store
            .apply(WriteBatch::new().put(NewMessage::new("a", "Jane", "edited", 1)))
            .unwrap();
        assert_eq!(max, 3);

        let txn = store.begin_read().unwrap();
        let changes = txn.changes_since(0).unwrap();
        let ids: Vec<_> = changes.iter().map(Change::id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn delete_leaves_tombstone() {
        let store = seeded();
        let max = store.apply(WriteBatch::new().delete("a")).unwrap();
        assert_eq!(max, 3);

        let txn = store.begin_read().unwrap();
        let changes = txn.changes_since(2).unwrap();
        assert_eq!(
            changes,
            vec![Change::Delete {
                id: "a".into(),
                version: 3
            }]
        );
    }

    #[test]
    fn delete_of_missing_record_is_noop() {
        let store = seeded();
        assert_eq!(store.apply(WriteBatch::new().delete("zzz")).unwrap(), 2);

        store.apply(WriteBatch::new().delete("a")).unwrap();
        assert_eq!(store.apply(WriteBatch::new().delete("a")).unwrap(), 3);
    }

    #[test]
    fn watermark_never_moves_backwards() {
        let store = MemoryStore::new();
        store.apply(WriteBatch::new().acknowledge("c1", 5)).unwrap();
        store.apply(WriteBatch::new().acknowledge("c1", 3)).unwrap();

        let txn = store.begin_read().unwrap();
        assert_eq!(txn.last_mutation_id("c1").unwrap(), Some(5));
        assert_eq!(txn.last_mutation_id("c2").unwrap(), None);
    }

    #[test]
    fn writer_waits_for_open_reader() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let store = Arc::new(seeded());
        let txn = store.begin_read().unwrap();
        let before = txn.changes_since(0).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .apply(WriteBatch::new().put(NewMessage::new("c", "Jane", "late", 3)))
                    .unwrap()
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(txn.max_version().unwrap(), Some(2));
        assert_eq!(txn.changes_since(0).unwrap(), before);
        txn.commit().unwrap();

        assert_eq!(writer.join().unwrap(), 3);
    }
}
