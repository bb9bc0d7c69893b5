//! # Replichat Testkit
//!
//! Test utilities for Replichat.
//!
//! This crate provides:
//! - Store fixtures (the two-message chat, temporary SQLite files, a store
//!   that is always down)
//! - Property-based test generators using proptest
//! - A model of the client cache that applies pull patches
//!
//! ## Usage
//!
//! ```rust
//! use replichat_testkit::prelude::*;
//! use replichat_store::{ReadTransaction, SyncStore};
//!
//! let store = chat_store();
//! let txn = store.begin_read().unwrap();
//! assert_eq!(txn.max_version().unwrap(), Some(2));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use client::*;
pub use fixtures::*;
pub use generators::*;
