use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical identity of a conversation: pair-order-independent id plus the
/// participants in (low, high) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRef {
    pub id: Uuid,
    pub low_user_id: Uuid,
    pub high_user_id: Uuid,
}

/// Catalog row: one per conversation, with the cached last-message snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub low_user_id: Uuid,
    pub high_user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_content: Option<String>,
}

/// Directory row: one per (owner, conversation), duplicated on both
/// participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationListEntry {
    pub owner_user_id: Uuid,
    pub conversation_id: Uuid,
    pub other_user_id: Uuid,
    pub last_message_at: DateTime<Utc>,
    pub last_message_content: String,
}
