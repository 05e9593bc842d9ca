//! Single-row-per-conversation metadata and the cached last-message snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Conversation, ConversationRef};
use crate::storage::{ClusteringKey, ColumnValue, Columns, Row, StorageDriver, Table};

const LAST_MESSAGE_AT: &str = "last_message_at";
const LAST_MESSAGE_CONTENT: &str = "last_message_content";

#[derive(Clone)]
pub struct ConversationCatalog {
    storage: Arc<dyn StorageDriver>,
}

impl ConversationCatalog {
    pub fn new(storage: Arc<dyn StorageDriver>) -> Self {
        Self { storage }
    }

    pub async fn get(&self, conversation_id: Uuid) -> AppResult<Conversation> {
        let row = self
            .storage
            .get(Table::Conversations, conversation_id, &ClusteringKey::root())
            .await?
            .ok_or(AppError::NotFound)?;
        conversation_from_row(conversation_id, &row)
    }

    /// Idempotent allocation: concurrent first-contact sends race on the
    /// conditional insert, and the loser reuses the winner's row.
    pub async fn create_if_absent(
        &self,
        conv: &ConversationRef,
        created_at: DateTime<Utc>,
    ) -> AppResult<Conversation> {
        let columns = Columns::from([
            ("user1_id".to_string(), ColumnValue::Uuid(conv.low_user_id)),
            ("user2_id".to_string(), ColumnValue::Uuid(conv.high_user_id)),
            ("created_at".to_string(), ColumnValue::Timestamp(created_at)),
        ]);
        let inserted = self
            .storage
            .put_if_absent(Table::Conversations, conv.id, ClusteringKey::root(), columns)
            .await?;
        if inserted {
            info!(conversation_id = %conv.id, "conversation created");
            return Ok(Conversation {
                id: conv.id,
                low_user_id: conv.low_user_id,
                high_user_id: conv.high_user_id,
                created_at,
                last_message_at: None,
                last_message_content: None,
            });
        }
        self.get(conv.id).await
    }

    /// Monotonic-write guard: the snapshot only moves forward. A stale
    /// timestamp means a newer send already landed, so the write is silently
    /// discarded. Returns whether the snapshot was applied.
    pub async fn update_last_message(
        &self,
        conversation_id: Uuid,
        timestamp: DateTime<Utc>,
        content: &str,
    ) -> AppResult<bool> {
        let columns = Columns::from([
            (LAST_MESSAGE_AT.to_string(), ColumnValue::Timestamp(timestamp)),
            (
                LAST_MESSAGE_CONTENT.to_string(),
                ColumnValue::Text(content.to_string()),
            ),
        ]);
        let applied = self
            .storage
            .put_if_column_less(
                Table::Conversations,
                conversation_id,
                ClusteringKey::root(),
                LAST_MESSAGE_AT,
                ColumnValue::Timestamp(timestamp),
                columns,
            )
            .await?;
        if !applied {
            debug!(%conversation_id, %timestamp, "stale last-message update ignored");
        }
        Ok(applied)
    }
}

fn conversation_from_row(conversation_id: Uuid, row: &Row) -> AppResult<Conversation> {
    Ok(Conversation {
        id: conversation_id,
        low_user_id: row.uuid("user1_id")?,
        high_user_id: row.uuid("user2_id")?,
        created_at: row.timestamp("created_at")?,
        last_message_at: row.opt_timestamp(LAST_MESSAGE_AT),
        last_message_content: row.opt_text(LAST_MESSAGE_CONTENT),
    })
}
