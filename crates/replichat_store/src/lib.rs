//! # Replichat Store
//!
//! Version store and client watermark store backends for Replichat.
//!
//! A store keeps chat messages stamped with a monotonically increasing global
//! version, tombstones for deleted messages, and the last applied mutation ID
//! of each client. The pull path reads all three through one snapshot.
//!
//! ## Available Backends
//!
//! - [`MemoryStore`] - For testing and ephemeral servers
//! - [`SqliteStore`] - For persistent storage
//!
//! ## Example
//!
//! ```rust
//! use replichat_store::{MemoryStore, NewMessage, ReadTransaction, SyncStore, WriteBatch};
//!
//! let store = MemoryStore::new();
//! let version = store
//!     .apply(WriteBatch::new().put(NewMessage::new("a", "Jane", "hey", 1)))
//!     .unwrap();
//! assert_eq!(version, 1);
//!
//! let txn = store.begin_read().unwrap();
//! assert_eq!(txn.changes_since(0).unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod backend;
mod batch;
mod error;
mod memory;
mod sqlite;

pub use backend::{ReadTransaction, SyncStore};
pub use batch::{NewMessage, WriteBatch, WriteOp};
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryReadTransaction, MemoryStore};
pub use sqlite::{SqliteReadTransaction, SqliteStore};
