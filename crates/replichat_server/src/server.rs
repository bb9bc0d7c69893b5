//! Main sync server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{health_route, pull_route, RequestHandler};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use replichat_protocol::{PullRequest, PullResponse};
use replichat_store::SyncStore;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The sync server.
///
/// Serves pull requests over HTTP using the Replicache pull protocol. The
/// push endpoint and poke notifications live elsewhere; this server only
/// reads the store.
///
/// # Example
///
/// ```
/// use replichat_server::{ServerConfig, SyncServer};
/// use replichat_store::MemoryStore;
/// use std::sync::Arc;
///
/// let server = SyncServer::new(ServerConfig::default(), Arc::new(MemoryStore::new()));
///
/// // Mount `server.router()` in an application, or call `server.serve().await`.
/// let _router = server.router();
/// ```
pub struct SyncServer<S> {
    handler: Arc<RequestHandler<S>>,
}

impl<S: SyncStore + 'static> SyncServer<S> {
    /// Creates a new sync server over a store.
    pub fn new(config: ServerConfig, store: Arc<S>) -> Self {
        Self {
            handler: Arc::new(RequestHandler::new(config, store)),
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        self.handler.config()
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        self.handler.responder().store()
    }

    /// Handles a pull request without going through HTTP.
    pub fn handle_pull(&self, request: &PullRequest) -> ServerResult<PullResponse> {
        self.handler.handle_pull(request)
    }

    /// Builds the HTTP router.
    pub fn router(&self) -> Router {
        let config = self.handler.config();
        Router::new()
            .route(&config.pull_path, post(pull_route::<S>))
            .route("/healthz", get(health_route))
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .with_state(Arc::clone(&self.handler))
    }

    /// Binds the configured address and serves until the process exits.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config().bind_addr).await?;
        self.serve_with_shutdown(listener, std::future::pending())
            .await
    }

    /// Serves on an existing listener until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, path = %self.config().pull_path, "sync server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("sync server stopped");
        Ok(())
    }
}
