//! Append-only per-conversation message log.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use tracing::debug;
use uuid::timestamp::context::ContextV7;
use uuid::Uuid;

use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::AppResult;
use crate::models::{Message, Page};
use crate::storage::{ClusteringKey, ColumnValue, Columns, Row, ScanRange, StorageDriver, Table};

// Shared v7 context keeps same-millisecond ids monotonic per writer.
static V7_CONTEXT: Lazy<Mutex<ContextV7>> = Lazy::new(|| Mutex::new(ContextV7::new()));

/// Timestamps are stored at millisecond precision; truncate up front so the
/// clustering key, the column value and the cursor all agree.
fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}

fn new_message_id(at: DateTime<Utc>) -> Uuid {
    let ts = uuid::Timestamp::from_unix(
        &*V7_CONTEXT.lock().expect("v7 context poisoned"),
        at.timestamp() as u64,
        at.timestamp_subsec_nanos(),
    );
    Uuid::new_v7(ts)
}

#[derive(Clone)]
pub struct MessageStore {
    storage: Arc<dyn StorageDriver>,
    config: Arc<Config>,
}

impl MessageStore {
    pub fn new(storage: Arc<dyn StorageDriver>, config: Arc<Config>) -> Self {
        Self { storage, config }
    }

    /// Append one message to the conversation partition. Durable within the
    /// partition once this returns; a pure insert, never read-modify-write.
    pub async fn append(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
        client_timestamp: Option<DateTime<Utc>>,
    ) -> AppResult<Message> {
        let created_at = truncate_millis(client_timestamp.unwrap_or_else(Utc::now));
        let id = new_message_id(created_at);
        let columns = Columns::from([
            ("message_id".to_string(), ColumnValue::Uuid(id)),
            ("created_at".to_string(), ColumnValue::Timestamp(created_at)),
            ("sender_id".to_string(), ColumnValue::Uuid(sender_id)),
            ("receiver_id".to_string(), ColumnValue::Uuid(receiver_id)),
            ("content".to_string(), ColumnValue::Text(content.to_string())),
        ]);
        self.storage
            .put(
                Table::Messages,
                conversation_id,
                ClusteringKey::recency(created_at, id),
                columns,
            )
            .await?;
        debug!(%conversation_id, message_id = %id, "message appended");

        Ok(Message {
            id,
            conversation_id,
            sender_id,
            receiver_id,
            content: content.to_string(),
            created_at,
        })
    }

    /// Most-recent-first listing. The cursor resumes strictly after the last
    /// (timestamp, id) pair; `before_timestamp` restricts to strictly older
    /// messages.
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        cursor: Option<&str>,
        limit: usize,
        before_timestamp: Option<DateTime<Utc>>,
    ) -> AppResult<Page<Message>> {
        let limit = limit.clamp(1, self.config.max_page_size);

        let cursor_bound = cursor
            .map(Cursor::decode)
            .transpose()?
            .map(|c| ClusteringKey::recency(c.timestamp, c.id));
        // encode(before, nil-id) excludes every id at `before` under a strict
        // upper bound, which is exactly "strictly older".
        let before_bound = before_timestamp
            .map(|t| ClusteringKey::recency(truncate_millis(t), Uuid::nil()));
        let range = match (cursor_bound, before_bound) {
            (Some(a), Some(b)) => ScanRange::below(a.min(b)),
            (Some(a), None) => ScanRange::below(a),
            (None, Some(b)) => ScanRange::below(b),
            (None, None) => ScanRange::all(),
        };

        let rows = self
            .storage
            .scan(Table::Messages, conversation_id, range, limit)
            .await?;
        let items = rows
            .iter()
            .map(|row| message_from_row(conversation_id, row))
            .collect::<AppResult<Vec<_>>>()?;

        let next_cursor = if items.len() == limit {
            items
                .last()
                .map(|m| Cursor::new(m.created_at, m.id).encode())
        } else {
            None
        };

        Ok(Page { items, next_cursor })
    }
}

fn message_from_row(conversation_id: Uuid, row: &Row) -> AppResult<Message> {
    Ok(Message {
        id: row.uuid("message_id")?,
        conversation_id,
        sender_id: row.uuid("sender_id")?,
        receiver_id: row.uuid("receiver_id")?,
        content: row.text("content")?,
        created_at: row.timestamp("created_at")?,
    })
}
