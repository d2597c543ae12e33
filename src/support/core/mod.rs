//! Core types for the conversation log: identifiers, records, errors, config.

pub mod config;
pub mod conversation;
pub mod errors;
pub mod ids;
pub mod message;

pub use config::{ProviderConfig, StorageConfig};
pub use conversation::{Conversation, ConversationStatus};
pub use errors::{StorageError, StorageResult};
pub use ids::{ConversationId, MessageId};
pub use message::{Direction, Message, NewMessage};
