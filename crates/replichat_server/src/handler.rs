//! Request handlers for sync endpoints.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::responder::PullResponder;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use replichat_protocol::{PullRequest, PullResponse};
use replichat_store::SyncStore;
use std::sync::Arc;

/// Handler for sync requests.
///
/// Decodes request bodies, checks the protocol version, and delegates to the
/// [`PullResponder`].
pub struct RequestHandler<S> {
    config: ServerConfig,
    responder: PullResponder<S>,
}

impl<S: SyncStore> RequestHandler<S> {
    /// Creates a new request handler.
    pub fn new(config: ServerConfig, store: Arc<S>) -> Self {
        Self {
            config,
            responder: PullResponder::new(store),
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the pull responder.
    pub fn responder(&self) -> &PullResponder<S> {
        &self.responder
    }

    /// Handles a decoded pull request.
    pub fn handle_pull(&self, request: &PullRequest) -> ServerResult<PullResponse> {
        if let Some(actual) = request.pull_version {
            if actual != self.config.pull_version {
                return Err(ServerError::UnsupportedPullVersion {
                    expected: self.config.pull_version,
                    actual,
                });
            }
        }

        self.responder.pull(request)
    }

    /// Handles a raw JSON pull body.
    pub fn handle_pull_body(&self, body: &[u8]) -> ServerResult<PullResponse> {
        if self.config.log_payloads {
            tracing::debug!(body = %String::from_utf8_lossy(body), "pull request");
        }

        let request = PullRequest::decode(body)?;
        let response = self.handle_pull(&request)?;

        if self.config.log_payloads {
            match serde_json::to_string(&response) {
                Ok(json) => tracing::debug!(body = %json, "pull response"),
                Err(e) => tracing::debug!(error = %e, "pull response not loggable"),
            }
        }

        Ok(response)
    }
}

/// `POST` pull route.
///
/// Store access blocks, so the pull runs on the blocking pool.
pub(crate) async fn pull_route<S>(
    State(handler): State<Arc<RequestHandler<S>>>,
    body: Bytes,
) -> Response
where
    S: SyncStore + 'static,
{
    let result = tokio::task::spawn_blocking(move || handler.handle_pull_body(&body)).await;

    match result {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => ServerError::Internal(format!("pull task failed: {e}")).into_response(),
    }
}

/// `GET` liveness route.
pub(crate) async fn health_route() -> &'static str {
    "ok"
}
