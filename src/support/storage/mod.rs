//! Typed access to the two persisted collections: conversations and messages.
//!
//! Each store owns its own `tokio-rusqlite` connection to the configured
//! database and creates its table on construction. Operations are atomic at
//! the single-statement level only; no multi-statement transactions are used.

pub mod conversation_store;
pub mod message_store;

pub use conversation_store::{ConversationStore, SqliteConversationStore};
pub use message_store::{MessageStore, SqliteMessageStore};

use std::future::Future;
use std::pin::Pin;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
