//! Conversation storage: find/insert/list over the conversations table.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::support::core::config::StorageConfig;
use crate::support::core::conversation::{Conversation, ConversationStatus};
use crate::support::core::errors::{StorageError, StorageResult};
use crate::support::core::ids::ConversationId;
use crate::support::storage::StoreFuture;

/// Raw row shape as read from `SQLite`, decoded outside the connection thread.
type ConversationRow = (String, String, String, i64, i64);

/// Conversation store trait.
pub trait ConversationStore: Send + Sync {
    /// Look up a conversation by its participant address (exact match).
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn find_by_participant(
        &self,
        participant: &str,
    ) -> StoreFuture<'_, StorageResult<Option<Conversation>>>;

    /// Insert a conversation for a participant, or return the existing one.
    ///
    /// The insert is atomic at the storage layer (`ON CONFLICT DO NOTHING`
    /// against the participant uniqueness constraint), so concurrent first
    /// contacts for the same participant converge on a single row.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn insert(
        &self,
        participant: &str,
        status: ConversationStatus,
    ) -> StoreFuture<'_, StorageResult<Conversation>>;

    /// List all conversations, newest-updated first.
    ///
    /// Full scan, no pagination.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn list(&self) -> StoreFuture<'_, StorageResult<Vec<Conversation>>>;
}

/// `SQLite` implementation of the conversation store.
pub struct SqliteConversationStore {
    conn: Connection,
    table: String,
}

impl SqliteConversationStore {
    /// Initialize the conversation store.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        let conn = Connection::open(&config.sqlite_path).await?;
        let table = config.conversations_table.clone();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id TEXT PRIMARY KEY,
                    participant TEXT NOT NULL UNIQUE,
                    status TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl ConversationStore for SqliteConversationStore {
    fn find_by_participant(
        &self,
        participant: &str,
    ) -> StoreFuture<'_, StorageResult<Option<Conversation>>> {
        let participant = participant.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let row = self
                .conn
                .call(move |conn| {
                    let row: Option<ConversationRow> = conn
                        .query_row(
                            &format!(
                                "SELECT id, participant, status, created_at, updated_at
                                 FROM {table}
                                 WHERE participant = ?1"
                            ),
                            rusqlite::params![participant],
                            decode_row,
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;

            row.map(row_to_conversation).transpose()
        })
    }

    fn insert(
        &self,
        participant: &str,
        status: ConversationStatus,
    ) -> StoreFuture<'_, StorageResult<Conversation>> {
        let participant = participant.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let id = ConversationId::new().to_string();
            let status = status.as_str().to_string();
            let now = Utc::now().timestamp_millis();

            let row = self
                .conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (id, participant, status, created_at, updated_at)
                             VALUES (?1, ?2, ?3, ?4, ?5)
                             ON CONFLICT(participant) DO NOTHING"
                        ),
                        rusqlite::params![id, participant, status, now, now],
                    )?;
                    // Re-read to pick up the winning row when the insert lost
                    // a concurrent race on the uniqueness constraint.
                    let row: ConversationRow = conn.query_row(
                        &format!(
                            "SELECT id, participant, status, created_at, updated_at
                             FROM {table}
                             WHERE participant = ?1"
                        ),
                        rusqlite::params![participant],
                        decode_row,
                    )?;
                    Ok(row)
                })
                .await?;

            row_to_conversation(row)
        })
    }

    fn list(&self) -> StoreFuture<'_, StorageResult<Vec<Conversation>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, participant, status, created_at, updated_at
                         FROM {table}
                         ORDER BY updated_at DESC, rowid DESC"
                    ))?;
                    let rows = stmt
                        .query_map([], decode_row)?
                        .collect::<Result<Vec<ConversationRow>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;

            rows.into_iter().map(row_to_conversation).collect()
        })
    }
}

/// Map a result row to the raw tuple shape.
fn decode_row(row: &rusqlite::Row<'_>) -> Result<ConversationRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

/// Decode a raw row into a typed conversation.
fn row_to_conversation(row: ConversationRow) -> StorageResult<Conversation> {
    let (id, participant, status, created_at, updated_at) = row;
    Ok(Conversation {
        id: id
            .parse()
            .map_err(|err| StorageError::InvalidRecord(format!("invalid conversation id: {err}")))?,
        participant,
        status: status
            .parse()
            .map_err(|err| StorageError::InvalidRecord(format!("invalid status: {err}")))?,
        created_at: millis_to_datetime(created_at)?,
        updated_at: millis_to_datetime(updated_at)?,
    })
}

/// Decode a millisecond timestamp column.
fn millis_to_datetime(millis: i64) -> StorageResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StorageError::InvalidRecord(format!("invalid timestamp: {millis}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn in_memory_store() -> SqliteConversationStore {
        let config = StorageConfig {
            sqlite_path: ":memory:".into(),
            ..StorageConfig::default()
        };
        SqliteConversationStore::new(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_find_returns_none_for_unknown_participant() {
        let store = in_memory_store().await;
        let found = store.find_by_participant("whatsapp:+15551112222").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let store = in_memory_store().await;
        let conversation = store
            .insert("whatsapp:+15551112222", ConversationStatus::Open)
            .await
            .unwrap();
        assert_eq!(conversation.participant, "whatsapp:+15551112222");
        assert_eq!(conversation.status, ConversationStatus::Open);
        assert_eq!(conversation.created_at, conversation.updated_at);
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_per_participant() {
        let store = in_memory_store().await;
        let first = store
            .insert("whatsapp:+15551112222", ConversationStatus::Open)
            .await
            .unwrap();
        let second = store
            .insert("whatsapp:+15551112222", ConversationStatus::Open)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_newest_updated_first() {
        let store = in_memory_store().await;
        store.insert("whatsapp:+1", ConversationStatus::Open).await.unwrap();
        store.insert("whatsapp:+2", ConversationStatus::Open).await.unwrap();
        store.insert("whatsapp:+3", ConversationStatus::Open).await.unwrap();

        let all = store.list().await.unwrap();
        let participants: Vec<&str> = all.iter().map(|c| c.participant.as_str()).collect();
        assert_eq!(participants, vec!["whatsapp:+3", "whatsapp:+2", "whatsapp:+1"]);
    }
}
