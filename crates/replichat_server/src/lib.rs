//! # Replichat Sync Server
//!
//! HTTP pull server for Replichat.
//!
//! This crate provides:
//! - The pull responder (cookie diffing against a store snapshot)
//! - HTTP endpoints (`POST /api/replicache-pull`, `GET /healthz`)
//! - Error classification into 4xx/5xx responses
//!
//! # Architecture
//!
//! The server reads from a [`replichat_store::SyncStore`] and never writes to
//! it. Messages are written (and versioned) by the push path, which also
//! advances each client's last mutation ID. A pull:
//! 1. Opens one read transaction on the store
//! 2. Reads the client's last mutation ID (0 if unknown)
//! 3. Reads every change newer than the client's cookie
//! 4. Reads the store's max version as the new cookie
//! 5. Builds a patch (`clear` first if the client has no cookie)
//!
//! # Protocol
//!
//! ```text
//! POST /api/replicache-pull
//! {"clientID": "c1", "cookie": 1}
//!
//! 200 OK
//! {"lastMutationID": 3, "cookie": 2, "patch": [{"op": "put", "key": "message/b", "value": {...}}]}
//! ```
//!
//! Malformed requests are answered with 400 and a plain-text reason; store
//! failures with 500.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod responder;
mod server;

pub use config::{ServerConfig, DEFAULT_PULL_PATH};
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use responder::{build_patch, PullResponder};
pub use server::SyncServer;
