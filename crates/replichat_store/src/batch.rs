//! Write batches for the store write path.

use replichat_protocol::ClientState;

/// A message to write, before a version is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Message ID.
    pub id: String,
    /// Display name of the author.
    pub sender: String,
    /// Message body.
    pub content: String,
    /// Client-assigned ordering key.
    pub order: i64,
}

impl NewMessage {
    /// Creates a new message.
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        content: impl Into<String>,
        order: i64,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            content: content.into(),
            order,
        }
    }
}

/// A single write in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert a message or replace an existing one.
    Put(NewMessage),
    /// Delete a message, leaving a tombstone.
    Delete(String),
}

/// An ordered set of writes committed atomically.
///
/// Each `Put` and each effective `Delete` consumes one version, in batch
/// order. Deleting an ID that is absent or already deleted is a no-op.
///
/// # Example
///
/// ```rust
/// use replichat_store::{NewMessage, WriteBatch};
///
/// let batch = WriteBatch::new()
///     .put(NewMessage::new("a", "Jane", "hey", 1))
///     .delete("b")
///     .acknowledge("client-1", 7);
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
    watermark: Option<ClientState>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a put.
    pub fn put(mut self, message: NewMessage) -> Self {
        self.ops.push(WriteOp::Put(message));
        self
    }

    /// Adds a delete.
    pub fn delete(mut self, id: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Delete(id.into()));
        self
    }

    /// Records that `last_mutation_id` from `client_id` has been applied.
    ///
    /// Watermarks never move backwards; a lower value is ignored.
    pub fn acknowledge(mut self, client_id: impl Into<String>, last_mutation_id: u64) -> Self {
        self.watermark = Some(ClientState::new(client_id, last_mutation_id));
        self
    }

    /// Returns the writes in batch order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Returns the watermark update, if any.
    pub fn watermark(&self) -> Option<&ClientState> {
        self.watermark.as_ref()
    }

    /// Returns the number of writes (excluding the watermark).
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the batch has no writes. A watermark alone does not
    /// count.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
