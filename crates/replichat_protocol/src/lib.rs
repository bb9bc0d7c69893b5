//! # Replichat Protocol
//!
//! Pull protocol types and JSON codecs for Replichat.
//!
//! This crate provides:
//! - `ChangeRecord` and `Change` for versioned store rows
//! - `PatchOperation` for client cache mutations
//! - Protocol messages (`PullRequest`, `PullResponse`)
//! - JSON encoding/decoding with validation at the boundary
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Example
//!
//! ```rust
//! use replichat_protocol::{Cookie, PullRequest};
//!
//! let request = PullRequest::decode(br#"{"clientID":"c1","cookie":null}"#).unwrap();
//! assert_eq!(request.client_id, "c1");
//! assert_eq!(request.cookie, Cookie::NONE);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;
mod patch;
mod record;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{Cookie, PullRequest, PullResponse, PULL_VERSION};
pub use patch::{message_id_from_key, message_key, MessageValue, Patch, PatchOperation, MESSAGE_KEY_PREFIX};
pub use record::{Change, ChangeRecord, ClientState, Version};
