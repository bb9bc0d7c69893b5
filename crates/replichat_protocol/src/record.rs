//! Versioned store rows.

use serde::{Deserialize, Serialize};

/// Global version number.
///
/// Versions are assigned by the store write path, are unique, and strictly
/// increase with every committed change.
pub type Version = u64;

/// A chat message as stored in the version store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Message ID (opaque, chosen by the client).
    pub id: String,
    /// Display name of the author.
    pub sender: String,
    /// Message body.
    pub content: String,
    /// Client-assigned ordering key.
    pub order: i64,
    /// Version stamped at write time.
    pub version: Version,
}

impl ChangeRecord {
    /// Creates a new change record.
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        content: impl Into<String>,
        order: i64,
        version: Version,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            content: content.into(),
            order,
            version,
        }
    }
}

/// A single versioned change visible to a pull.
///
/// Deletions are kept as tombstones so that a client whose baseline predates
/// the deletion learns about it on its next pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Change {
    /// The record was created or replaced.
    Put(ChangeRecord),
    /// The record was deleted.
    Delete {
        /// ID of the deleted record.
        id: String,
        /// Version of the tombstone.
        version: Version,
    },
}

impl Change {
    /// Returns the record ID this change affects.
    pub fn id(&self) -> &str {
        match self {
            Change::Put(record) => &record.id,
            Change::Delete { id, .. } => id,
        }
    }

    /// Returns the version of this change.
    pub fn version(&self) -> Version {
        match self {
            Change::Put(record) => record.version,
            Change::Delete { version, .. } => *version,
        }
    }

    /// Returns true if this change is a tombstone.
    pub fn is_delete(&self) -> bool {
        matches!(self, Change::Delete { .. })
    }
}

/// Per-client mutation watermark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientState {
    /// Client ID.
    #[serde(rename = "clientID")]
    pub client_id: String,
    /// Last mutation ID from this client that the server applied.
    #[serde(rename = "lastMutationID")]
    pub last_mutation_id: u64,
}

impl ClientState {
    /// Creates a new client state.
    pub fn new(client_id: impl Into<String>, last_mutation_id: u64) -> Self {
        Self {
            client_id: client_id.into(),
            last_mutation_id,
        }
    }
}
