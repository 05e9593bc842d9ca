pub mod conversation;
pub mod message;

pub use conversation::{Conversation, ConversationListEntry, ConversationRef};
pub use message::Message;

use serde::{Deserialize, Serialize};

/// One page of a most-recent-first listing. `next_cursor` resumes exactly
/// after the last item; `None` means the listing is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}
