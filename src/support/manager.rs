//! Conversation manager: find-or-create per participant.

use std::sync::Arc;

use crate::support::core::conversation::{Conversation, ConversationStatus};
use crate::support::core::errors::StorageResult;
use crate::support::storage::ConversationStore;

/// Ensures a conversation record exists for a participant.
pub struct ConversationManager {
    store: Arc<dyn ConversationStore>,
}

impl ConversationManager {
    /// Create a manager over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Return the conversation for a participant, creating it with status
    /// `open` on first contact.
    ///
    /// Existing conversations are returned unchanged. Creation is idempotent:
    /// the store's insert is atomic against the participant uniqueness
    /// constraint, so concurrent first contacts yield the same row.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn ensure(&self, participant: &str) -> StorageResult<Conversation> {
        if let Some(existing) = self.store.find_by_participant(participant).await? {
            return Ok(existing);
        }
        self.store.insert(participant, ConversationStatus::Open).await
    }
}
