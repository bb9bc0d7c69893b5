//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random store histories and cookies.

use proptest::prelude::*;
use replichat_protocol::{Cookie, Version};
use replichat_store::{NewMessage, WriteBatch};

/// Strategy for message IDs drawn from a small pool, so that histories
/// revisit (replace and delete) the same records.
pub fn message_id_strategy() -> impl Strategy<Value = String> {
    (0u8..8).prop_map(|n| format!("m{n}"))
}

/// Strategy for messages.
pub fn new_message_strategy() -> impl Strategy<Value = NewMessage> {
    (
        message_id_strategy(),
        prop::sample::select(vec!["Jane", "Fred", "Ana"]),
        "[a-z ]{0,16}",
        0i64..1000,
    )
        .prop_map(|(id, sender, content, order)| NewMessage::new(id, sender, content, order))
}

/// A single step of a generated store history.
#[derive(Debug, Clone)]
pub enum HistoryStep {
    /// Write a message.
    Put(NewMessage),
    /// Delete a message.
    Delete(String),
    /// Advance a client's watermark.
    Acknowledge {
        /// Client ID.
        client_id: String,
        /// New last mutation ID.
        last_mutation_id: u64,
    },
}

impl HistoryStep {
    /// Converts the step into a single-write batch.
    pub fn into_batch(self) -> WriteBatch {
        match self {
            HistoryStep::Put(message) => WriteBatch::new().put(message),
            HistoryStep::Delete(id) => WriteBatch::new().delete(id),
            HistoryStep::Acknowledge {
                client_id,
                last_mutation_id,
            } => WriteBatch::new().acknowledge(client_id, last_mutation_id),
        }
    }
}

/// Strategy for history steps, weighted towards puts.
pub fn history_step_strategy() -> impl Strategy<Value = HistoryStep> {
    prop_oneof![
        4 => new_message_strategy().prop_map(HistoryStep::Put),
        1 => message_id_strategy().prop_map(HistoryStep::Delete),
        1 => (prop::sample::select(vec!["c1", "c2"]), 0u64..50).prop_map(
            |(client_id, last_mutation_id)| HistoryStep::Acknowledge {
                client_id: client_id.to_string(),
                last_mutation_id,
            }
        ),
    ]
}

/// Strategy for a sequence of history steps.
pub fn history_strategy(min_steps: usize, max_steps: usize) -> impl Strategy<Value = Vec<HistoryStep>> {
    prop::collection::vec(history_step_strategy(), min_steps..max_steps)
}

/// Strategy for cookies up to `max_version`, including the reset cookie.
pub fn cookie_strategy(max_version: Version) -> impl Strategy<Value = Cookie> {
    prop_oneof![
        1 => Just(Cookie::NONE),
        4 => (0..=max_version).prop_map(Cookie::at),
    ]
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
