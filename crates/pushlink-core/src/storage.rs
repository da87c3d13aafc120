//! Storage collaborator interface
//!
//! The runtime owns no persisted state. Normalized messages are handed to a
//! `MessageStore`, and receipts are applied through it. Implementations must
//! report a missing sent message as `StorageError::NotFound` so receipt
//! correlation can tell "not written yet" apart from real failures.

use async_trait::async_trait;

use crate::errors::StorageError;
use crate::message::{CorrelationResult, GroupContext, NormalizedMessage, StoredMessage};
use crate::types::Timestamp;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a normalized message into its conversation
    ///
    /// `is_incoming` is false for messages we sent ourselves (sync-sent).
    async fn process_message(
        &self,
        message: NormalizedMessage,
        group: Option<&GroupContext>,
        is_incoming: bool,
    ) -> Result<StoredMessage, StorageError>;

    /// Mark the sent message `(source, timestamp)` as received by its peer
    async fn mark_message_received(
        &self,
        source: &str,
        timestamp: Timestamp,
    ) -> Result<CorrelationResult, StorageError>;
}
