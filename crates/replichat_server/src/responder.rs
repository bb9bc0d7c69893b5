//! Pull response construction.

use crate::error::ServerResult;
use replichat_protocol::{Change, Cookie, Patch, PatchOperation, PullRequest, PullResponse};
use replichat_store::{ReadTransaction, SyncStore};
use std::sync::Arc;
use std::time::Instant;

/// Answers pull requests from a store snapshot.
///
/// Every read of a pull (client watermark, changed records, max version)
/// happens inside one read transaction, so the returned cookie never covers a
/// change that the patch leaves out. The responder never writes.
pub struct PullResponder<S> {
    store: Arc<S>,
}

impl<S: SyncStore> PullResponder<S> {
    /// Creates a responder over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Computes the response to a pull.
    ///
    /// Unknown clients get `lastMutationID` 0. A `null` cookie yields a patch
    /// starting with `clear`.
    pub fn pull(&self, request: &PullRequest) -> ServerResult<PullResponse> {
        request.validate()?;

        let span = tracing::info_span!(
            "pull",
            client_id = %request.client_id,
            cookie = %request.cookie,
        );
        let _enter = span.enter();
        let started = Instant::now();

        let txn = self.store.begin_read()?;
        let last_mutation_id = txn.last_mutation_id(&request.client_id)?.unwrap_or(0);
        let changes = txn.changes_since(request.cookie.baseline())?;
        let cookie = txn.max_version()?.unwrap_or(0);
        txn.commit()?;

        if request.cookie.baseline() > cookie {
            tracing::warn!(
                server_version = cookie,
                "client cookie is ahead of the store"
            );
        }

        let patch = build_patch(request.cookie, &changes);

        tracing::info!(
            changed = changes.len(),
            patch_len = patch.len(),
            new_cookie = cookie,
            last_mutation_id,
            elapsed_us = started.elapsed().as_micros() as u64,
            "processed pull"
        );

        Ok(PullResponse::new(last_mutation_id, cookie, patch))
    }
}

/// Builds the patch taking a client from `cookie` to the state described by
/// `changes`.
///
/// A reset cookie gets a leading `clear`. Tombstones become `del` operations,
/// except after a `clear` where there is nothing left to delete.
pub fn build_patch(cookie: Cookie, changes: &[Change]) -> Patch {
    let reset = cookie.requests_reset();
    let mut patch = Vec::with_capacity(changes.len() + usize::from(reset));

    if reset {
        patch.push(PatchOperation::Clear);
    }

    patch.extend(
        changes
            .iter()
            .filter(|change| !(reset && change.is_delete()))
            .map(PatchOperation::from),
    );

    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;
    use replichat_protocol::{message_key, ChangeRecord, ProtocolError};
    use replichat_store::{MemoryStore, NewMessage, WriteBatch};

    fn chat_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store
            .apply(
                WriteBatch::new()
                    .put(NewMessage::new("a", "Jane", "Hey, what's for lunch?", 1))
                    .put(NewMessage::new("b", "Fred", "tacos?", 2)),
            )
            .unwrap();
        Arc::new(store)
    }

    fn keys(response: &PullResponse) -> Vec<Option<&str>> {
        response.patch.iter().map(PatchOperation::key).collect()
    }

    #[test]
    fn null_cookie_clears_then_puts_everything() {
        let responder = PullResponder::new(chat_store());
        let response = responder.pull(&PullRequest::new("c1", Cookie::NONE)).unwrap();

        assert_eq!(response.cookie, 2);
        assert_eq!(response.last_mutation_id, 0);
        assert_eq!(
            keys(&response),
            vec![None, Some("message/a"), Some("message/b")]
        );
        assert!(response.resets_cache());
    }

    #[test]
    fn cookie_one_gets_only_b() {
        let responder = PullResponder::new(chat_store());
        let response = responder.pull(&PullRequest::new("c1", Cookie::at(1))).unwrap();

        assert_eq!(response.cookie, 2);
        assert_eq!(
            response.patch,
            vec![PatchOperation::put(&ChangeRecord::new(
                "b", "Fred", "tacos?", 2, 2
            ))]
        );
    }

    #[test]
    fn current_cookie_gets_empty_patch() {
        let responder = PullResponder::new(chat_store());
        let response = responder.pull(&PullRequest::new("c1", Cookie::at(2))).unwrap();

        assert_eq!(response.cookie, 2);
        assert!(response.patch.is_empty());
    }

    #[test]
    fn zero_cookie_never_clears() {
        let responder = PullResponder::new(chat_store());
        let response = responder.pull(&PullRequest::new("c1", Cookie::at(0))).unwrap();

        assert!(!response.resets_cache());
        assert_eq!(response.patch.len(), 2);
    }

    #[test]
    fn empty_store_returns_zero_cookie() {
        let responder = PullResponder::new(Arc::new(MemoryStore::new()));
        let response = responder.pull(&PullRequest::new("c1", Cookie::NONE)).unwrap();

        assert_eq!(response.cookie, 0);
        assert_eq!(response.patch, vec![PatchOperation::Clear]);
    }

    #[test]
    fn known_client_gets_its_watermark() {
        let store = chat_store();
        store.apply(WriteBatch::new().acknowledge("c1", 7)).unwrap();
        let responder = PullResponder::new(store);

        let response = responder.pull(&PullRequest::new("c1", Cookie::at(2))).unwrap();
        assert_eq!(response.last_mutation_id, 7);

        let response = responder.pull(&PullRequest::new("c2", Cookie::at(2))).unwrap();
        assert_eq!(response.last_mutation_id, 0);
    }

    #[test]
    fn deletions_become_del_ops() {
        let store = chat_store();
        store.apply(WriteBatch::new().delete("a")).unwrap();
        let responder = PullResponder::new(store);

        let response = responder.pull(&PullRequest::new("c1", Cookie::at(2))).unwrap();
        assert_eq!(response.cookie, 3);
        assert_eq!(response.patch, vec![PatchOperation::del("a")]);

        let response = responder.pull(&PullRequest::new("c1", Cookie::NONE)).unwrap();
        assert_eq!(
            keys(&response),
            vec![None, Some(message_key("b").as_str())]
        );
    }

    #[test]
    fn empty_client_id_is_malformed() {
        let responder = PullResponder::new(chat_store());
        let err = responder.pull(&PullRequest::new("", Cookie::NONE)).unwrap_err();
        assert!(matches!(
            err,
            ServerError::MalformedRequest(ProtocolError::EmptyClientId)
        ));
    }

    #[test]
    fn cookie_ahead_of_store_gets_store_cookie() {
        let responder = PullResponder::new(chat_store());
        let response = responder.pull(&PullRequest::new("c1", Cookie::at(9))).unwrap();

        assert_eq!(response.cookie, 2);
        assert!(response.cookie < 9);
        assert!(response.patch.is_empty());
        assert!(!response.resets_cache());
    }

    #[test]
    fn repeated_pull_is_idempotent() {
        let responder = PullResponder::new(chat_store());
        let request = PullRequest::new("c1", Cookie::at(1));
        assert_eq!(
            responder.pull(&request).unwrap(),
            responder.pull(&request).unwrap()
        );
    }

    #[test]
    fn build_patch_keeps_version_order() {
        let changes = vec![
            Change::Put(ChangeRecord::new("x", "Jane", "one", 5, 4)),
            Change::Delete {
                id: "y".into(),
                version: 5,
            },
            Change::Put(ChangeRecord::new("z", "Fred", "two", 1, 6)),
        ];

        let patch = build_patch(Cookie::at(3), &changes);
        let keys: Vec<_> = patch.iter().filter_map(PatchOperation::key).collect();
        assert_eq!(keys, vec!["message/x", "message/y", "message/z"]);

        let patch = build_patch(Cookie::NONE, &changes);
        assert_eq!(patch.len(), 3);
        assert_eq!(patch[0], PatchOperation::Clear);
    }
}
