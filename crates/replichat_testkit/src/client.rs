//! Client cache model.
//!
//! Mirrors what a sync client does with a pull response: apply the patch to
//! its key/value cache, then remember the cookie and last mutation ID.

use replichat_protocol::{
    message_key, Change, Cookie, MessageValue, PatchOperation, PullResponse,
};
use replichat_store::{ReadTransaction, SyncStore};
use std::collections::BTreeMap;

/// A client's local cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCache {
    entries: BTreeMap<String, MessageValue>,
    cookie: Cookie,
    last_mutation_id: u64,
}

impl ClientCache {
    /// Creates an empty cache with no cookie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cookie to send on the next pull.
    pub fn cookie(&self) -> Cookie {
        self.cookie
    }

    /// Returns the last acknowledged mutation ID.
    pub fn last_mutation_id(&self) -> u64 {
        self.last_mutation_id
    }

    /// Returns the cached entries.
    pub fn entries(&self) -> &BTreeMap<String, MessageValue> {
        &self.entries
    }

    /// Returns cached messages sorted by their `order` field, as a chat view
    /// would display them.
    pub fn messages(&self) -> Vec<(&str, &MessageValue)> {
        let mut list: Vec<_> = self
            .entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
            .collect();
        list.sort_by_key(|(_, value)| value.order);
        list
    }

    /// Applies a pull response.
    pub fn apply(&mut self, response: &PullResponse) {
        for op in &response.patch {
            match op {
                PatchOperation::Clear => self.entries.clear(),
                PatchOperation::Put { key, value } => {
                    self.entries.insert(key.clone(), value.clone());
                }
                PatchOperation::Del { key } => {
                    self.entries.remove(key);
                }
            }
        }
        self.cookie = Cookie::at(response.cookie);
        self.last_mutation_id = response.last_mutation_id;
    }
}

/// Returns the live contents of a store, keyed the way clients cache them.
pub fn expected_entries<S: SyncStore>(store: &S) -> BTreeMap<String, MessageValue> {
    let txn = store.begin_read().expect("Failed to begin read");
    let changes = txn.changes_since(0).expect("Failed to read changes");
    changes
        .iter()
        .filter_map(|change| match change {
            Change::Put(record) => Some((message_key(&record.id), MessageValue::from(record))),
            Change::Delete { .. } => None,
        })
        .collect()
}
