//! Message recorder: appends one message per inbound delivery or outbound send.

use std::sync::Arc;

use crate::support::core::errors::StorageResult;
use crate::support::core::ids::ConversationId;
use crate::support::core::message::{Direction, Message, NewMessage};
use crate::support::storage::MessageStore;

/// Records messages against a conversation.
pub struct MessageRecorder {
    store: Arc<dyn MessageStore>,
}

impl MessageRecorder {
    /// Create a recorder over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Append a message record. Always inserts, never updates; the single
    /// side effect is one new persisted message.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn record(
        &self,
        conversation_id: ConversationId,
        direction: Direction,
        sender: &str,
        recipient: &str,
        body: Option<String>,
        media_url: Option<String>,
    ) -> StorageResult<Message> {
        self.store
            .insert(NewMessage {
                conversation_id,
                direction,
                sender: sender.to_string(),
                recipient: recipient.to_string(),
                body,
                media_url,
            })
            .await
    }
}
