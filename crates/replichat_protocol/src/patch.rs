//! Patch operations applied by clients to their local cache.

use crate::record::{Change, ChangeRecord};
use serde::{Deserialize, Serialize};

/// Key namespace for chat messages.
pub const MESSAGE_KEY_PREFIX: &str = "message/";

/// An ordered list of cache mutations.
pub type Patch = Vec<PatchOperation>;

/// Returns the cache key for a message ID.
pub fn message_key(id: &str) -> String {
    format!("{MESSAGE_KEY_PREFIX}{id}")
}

/// Extracts the message ID from a cache key.
///
/// Returns `None` if the key is outside the message namespace.
pub fn message_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(MESSAGE_KEY_PREFIX)
}

/// Cached value of a message, as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageValue {
    /// Display name of the author.
    pub from: String,
    /// Message body.
    pub content: String,
    /// Client-assigned ordering key.
    pub order: i64,
}

impl From<&ChangeRecord> for MessageValue {
    fn from(record: &ChangeRecord) -> Self {
        Self {
            from: record.sender.clone(),
            content: record.content.clone(),
            order: record.order,
        }
    }
}

/// A single cache mutation.
///
/// Serialized with an `op` tag: `{"op":"clear"}`,
/// `{"op":"put","key":..,"value":..}` or `{"op":"del","key":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    /// Discard all cached state.
    Clear,
    /// Insert or replace a cached value.
    Put {
        /// Cache key.
        key: String,
        /// New value.
        value: MessageValue,
    },
    /// Remove a cached value.
    Del {
        /// Cache key.
        key: String,
    },
}

impl PatchOperation {
    /// Creates a put operation for a message.
    pub fn put(record: &ChangeRecord) -> Self {
        PatchOperation::Put {
            key: message_key(&record.id),
            value: MessageValue::from(record),
        }
    }

    /// Creates a delete operation for a message ID.
    pub fn del(id: &str) -> Self {
        PatchOperation::Del {
            key: message_key(id),
        }
    }

    /// Returns the cache key, or `None` for `clear`.
    pub fn key(&self) -> Option<&str> {
        match self {
            PatchOperation::Clear => None,
            PatchOperation::Put { key, .. } | PatchOperation::Del { key } => Some(key),
        }
    }
}

impl From<&Change> for PatchOperation {
    fn from(change: &Change) -> Self {
        match change {
            Change::Put(record) => PatchOperation::put(record),
            Change::Delete { id, .. } => PatchOperation::del(id),
        }
    }
}
