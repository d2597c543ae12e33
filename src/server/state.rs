//! Application state shared across all request handlers.
//!
//! Stores and the provider client are constructed once at startup and
//! injected here; handlers only ever see this struct.

use std::sync::Arc;

use crate::provider::{MessagingProvider, TwilioClient};
use crate::support::core::config::{ProviderConfig, StorageConfig};
use crate::support::storage::{
    ConversationStore, MessageStore, SqliteConversationStore, SqliteMessageStore,
};
use crate::support::{ConversationManager, MessageRecorder};

/// Shared application state.
pub struct AppState {
    /// Direct read access to the conversations collection.
    pub conversations: Arc<dyn ConversationStore>,
    /// Direct read access to the messages collection.
    pub messages: Arc<dyn MessageStore>,
    /// Find-or-create of conversations per participant.
    pub manager: ConversationManager,
    /// Appends message records.
    pub recorder: MessageRecorder,
    /// Outbound send client.
    pub provider: Arc<dyn MessagingProvider>,
    /// Configured sender address, the `From` of every outbound message.
    pub sender: String,
}

impl AppState {
    /// Create the application state from the process environment.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the provider
    /// client cannot be created.
    pub async fn new() -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let storage = StorageConfig::from_env();
        let provider_config = ProviderConfig::from_env();

        let conversations: Arc<dyn ConversationStore> =
            Arc::new(SqliteConversationStore::new(&storage).await?);
        let messages: Arc<dyn MessageStore> = Arc::new(SqliteMessageStore::new(&storage).await?);
        let provider = TwilioClient::new(&provider_config)
            .map_err(|e| format!("Failed to create Twilio client: {e}"))?;

        Ok(Arc::new(Self::assemble(
            conversations,
            messages,
            Arc::new(provider),
            provider_config.sender,
        )))
    }

    /// Wire the state from already-constructed parts (also used by tests).
    #[must_use]
    pub fn assemble(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        provider: Arc<dyn MessagingProvider>,
        sender: String,
    ) -> Self {
        Self {
            manager: ConversationManager::new(conversations.clone()),
            recorder: MessageRecorder::new(messages.clone()),
            conversations,
            messages,
            provider,
            sender,
        }
    }
}
