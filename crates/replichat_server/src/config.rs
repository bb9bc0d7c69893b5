//! Server configuration.

use replichat_protocol::PULL_VERSION;
use std::net::SocketAddr;

/// Default route for pull requests.
pub const DEFAULT_PULL_PATH: &str = "/api/replicache-pull";

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Route serving pull requests.
    pub pull_path: String,
    /// Maximum accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Pull protocol version accepted from clients that send one.
    pub pull_version: u64,
    /// Whether to log request and response bodies at debug level.
    pub log_payloads: bool,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            pull_path: DEFAULT_PULL_PATH.to_string(),
            max_body_bytes: 64 * 1024,
            pull_version: PULL_VERSION,
            log_payloads: false,
        }
    }

    /// Sets the pull route.
    pub fn with_pull_path(mut self, path: impl Into<String>) -> Self {
        self.pull_path = path.into();
        self
    }

    /// Sets the maximum request body size.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Sets the accepted pull protocol version.
    pub fn with_pull_version(mut self, version: u64) -> Self {
        self.pull_version = version;
        self
    }

    /// Enables debug logging of request and response bodies.
    pub fn with_payload_logging(mut self, enabled: bool) -> Self {
        self.log_payloads = enabled;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8080)))
    }
}
