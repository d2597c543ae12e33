//! Message storage: append and per-conversation listing.

use chrono::{TimeZone, Utc};
use tokio_rusqlite::Connection;

use crate::support::core::config::StorageConfig;
use crate::support::core::errors::{StorageError, StorageResult};
use crate::support::core::ids::MessageId;
use crate::support::core::message::{Message, NewMessage};
use crate::support::storage::StoreFuture;

/// Raw row shape as read from `SQLite`, decoded outside the connection thread.
type MessageRow = (String, String, String, String, String, Option<String>, Option<String>, i64);

/// Message store trait.
pub trait MessageStore: Send + Sync {
    /// Append a new message record; id and timestamp are assigned here.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn insert(&self, message: NewMessage) -> StoreFuture<'_, StorageResult<Message>>;

    /// List all messages for a conversation in creation order.
    ///
    /// The conversation id is an opaque string matched exactly; an unknown id
    /// yields an empty list, not an error.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn list_for_conversation(
        &self,
        conversation_id: &str,
    ) -> StoreFuture<'_, StorageResult<Vec<Message>>>;
}

/// `SQLite` implementation of the message store.
pub struct SqliteMessageStore {
    conn: Connection,
    table: String,
}

impl SqliteMessageStore {
    /// Initialize the message store.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        let conn = Connection::open(&config.sqlite_path).await?;
        let table = config.messages_table.clone();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id TEXT PRIMARY KEY,
                    conversation_id TEXT NOT NULL,
                    direction TEXT NOT NULL,
                    sender TEXT NOT NULL,
                    recipient TEXT NOT NULL,
                    body TEXT,
                    media_url TEXT,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table_name}_conversation
                    ON {table_name} (conversation_id);"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl MessageStore for SqliteMessageStore {
    fn insert(&self, message: NewMessage) -> StoreFuture<'_, StorageResult<Message>> {
        Box::pin(async move {
            let table = self.table.clone();
            let id = MessageId::new();
            // Truncate to millisecond precision up front so the returned
            // record is identical to what a later read will decode.
            let now_millis = Utc::now().timestamp_millis();
            let created_at = Utc
                .timestamp_millis_opt(now_millis)
                .single()
                .ok_or_else(|| StorageError::InvalidRecord("invalid timestamp".to_string()))?;

            let record = Message {
                id,
                conversation_id: message.conversation_id,
                direction: message.direction,
                sender: message.sender,
                recipient: message.recipient,
                body: message.body,
                media_url: message.media_url,
                created_at,
            };

            let row = (
                record.id.to_string(),
                record.conversation_id.to_string(),
                record.direction.as_str().to_string(),
                record.sender.clone(),
                record.recipient.clone(),
                record.body.clone(),
                record.media_url.clone(),
                record.created_at.timestamp_millis(),
            );
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table}
                             (id, conversation_id, direction, sender, recipient, body, media_url, created_at)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                        ),
                        rusqlite::params![
                            row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7
                        ],
                    )?;
                    Ok(())
                })
                .await?;

            Ok(record)
        })
    }

    fn list_for_conversation(
        &self,
        conversation_id: &str,
    ) -> StoreFuture<'_, StorageResult<Vec<Message>>> {
        let conversation_id = conversation_id.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, conversation_id, direction, sender, recipient, body, media_url, created_at
                         FROM {table}
                         WHERE conversation_id = ?1
                         ORDER BY rowid"
                    ))?;
                    let rows = stmt
                        .query_map(rusqlite::params![conversation_id], |row| {
                            let id: String = row.get(0)?;
                            let conversation_id: String = row.get(1)?;
                            let direction: String = row.get(2)?;
                            let sender: String = row.get(3)?;
                            let recipient: String = row.get(4)?;
                            let body: Option<String> = row.get(5)?;
                            let media_url: Option<String> = row.get(6)?;
                            let created_at: i64 = row.get(7)?;
                            Ok((
                                id,
                                conversation_id,
                                direction,
                                sender,
                                recipient,
                                body,
                                media_url,
                                created_at,
                            ))
                        })?
                        .collect::<Result<Vec<MessageRow>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;

            rows.into_iter().map(row_to_message).collect()
        })
    }
}

/// Decode a raw row into a typed message.
fn row_to_message(row: MessageRow) -> StorageResult<Message> {
    let (id, conversation_id, direction, sender, recipient, body, media_url, created_at) = row;
    Ok(Message {
        id: id
            .parse()
            .map_err(|err| StorageError::InvalidRecord(format!("invalid message id: {err}")))?,
        conversation_id: conversation_id
            .parse()
            .map_err(|err| StorageError::InvalidRecord(format!("invalid conversation id: {err}")))?,
        direction: direction
            .parse()
            .map_err(|err| StorageError::InvalidRecord(format!("invalid direction: {err}")))?,
        sender,
        recipient,
        body,
        media_url,
        created_at: Utc
            .timestamp_millis_opt(created_at)
            .single()
            .ok_or_else(|| StorageError::InvalidRecord(format!("invalid timestamp: {created_at}")))?,
    })
}
