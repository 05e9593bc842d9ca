//! Per-user conversation index, ordered by recency and duplicated across both
//! participants.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::AppResult;
use crate::models::{ConversationListEntry, Page};
use crate::storage::{ClusteringKey, ColumnValue, Columns, Row, ScanRange, StorageDriver, Table};

#[derive(Clone)]
pub struct ConversationDirectory {
    storage: Arc<dyn StorageDriver>,
    config: Arc<Config>,
}

impl ConversationDirectory {
    pub fn new(storage: Arc<dyn StorageDriver>, config: Arc<Config>) -> Self {
        Self { storage, config }
    }

    /// Rewrite the owner's entry for this conversation at the new recency
    /// key. The row at the old key becomes an orphan that most-recent-first
    /// scans stop surfacing; an out-of-order write lands at an older key and
    /// is shadowed the same way, so this needs no read or guard.
    pub async fn upsert_entry(
        &self,
        owner_user_id: Uuid,
        conversation_id: Uuid,
        other_user_id: Uuid,
        timestamp: DateTime<Utc>,
        content: &str,
    ) -> AppResult<()> {
        let columns = Columns::from([
            ("conversation_id".to_string(), ColumnValue::Uuid(conversation_id)),
            ("other_user_id".to_string(), ColumnValue::Uuid(other_user_id)),
            ("last_message_at".to_string(), ColumnValue::Timestamp(timestamp)),
            (
                "last_message_content".to_string(),
                ColumnValue::Text(content.to_string()),
            ),
        ]);
        self.storage
            .put(
                Table::ConversationsByUser,
                owner_user_id,
                ClusteringKey::recency_id_asc(timestamp, conversation_id),
                columns,
            )
            .await
    }

    /// Most-recent-first conversation list. Scanning deduplicates by
    /// conversation id — the first occurrence is the newest entry, everything
    /// after it is an orphaned key from an earlier upsert.
    pub async fn list_conversations(
        &self,
        user_id: Uuid,
        cursor: Option<&str>,
        limit: usize,
    ) -> AppResult<Page<ConversationListEntry>> {
        let limit = limit.clamp(1, self.config.max_page_size);

        let mut below = cursor
            .map(Cursor::decode)
            .transpose()?
            .map(|c| ClusteringKey::recency_id_asc(c.timestamp, c.id));
        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut items: Vec<ConversationListEntry> = Vec::new();

        loop {
            let batch = limit + 1;
            let range = below
                .clone()
                .map(ScanRange::below)
                .unwrap_or_else(ScanRange::all);
            let rows = self
                .storage
                .scan(Table::ConversationsByUser, user_id, range, batch)
                .await?;
            let exhausted = rows.len() < batch;

            for row in &rows {
                let entry = entry_from_row(user_id, row)?;
                below = Some(ClusteringKey::recency_id_asc(
                    entry.last_message_at,
                    entry.conversation_id,
                ));
                if !seen.insert(entry.conversation_id) {
                    continue;
                }
                let next_cursor =
                    Cursor::new(entry.last_message_at, entry.conversation_id).encode();
                items.push(entry);
                if items.len() == limit {
                    return Ok(Page {
                        items,
                        next_cursor: Some(next_cursor),
                    });
                }
            }

            if exhausted {
                return Ok(Page {
                    items,
                    next_cursor: None,
                });
            }
        }
    }
}

fn entry_from_row(owner_user_id: Uuid, row: &Row) -> AppResult<ConversationListEntry> {
    Ok(ConversationListEntry {
        owner_user_id,
        conversation_id: row.uuid("conversation_id")?,
        other_user_id: row.uuid("other_user_id")?,
        last_message_at: row.timestamp("last_message_at")?,
        last_message_content: row.text("last_message_content")?,
    })
}
