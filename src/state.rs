use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{Conversation, ConversationListEntry, Message, Page};
use crate::services::{
    ConversationCatalog, ConversationDirectory, MessageStore, SendOutcome, WriteCoordinator,
};
use crate::storage::StorageDriver;

/// Wired service graph. This is the surface the request-handling layer calls
/// into; reads go straight to the stores, sends go through the coordinator.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn StorageDriver>,
    catalog: ConversationCatalog,
    messages: MessageStore,
    directory: ConversationDirectory,
    coordinator: WriteCoordinator,
}

impl AppState {
    pub fn new(storage: Arc<dyn StorageDriver>, config: Arc<Config>) -> Self {
        let catalog = ConversationCatalog::new(storage.clone());
        let messages = MessageStore::new(storage.clone(), config.clone());
        let directory = ConversationDirectory::new(storage.clone(), config.clone());
        let coordinator = WriteCoordinator::new(
            catalog.clone(),
            messages.clone(),
            directory.clone(),
            config.clone(),
        );
        Self {
            config,
            storage,
            catalog,
            messages,
            directory,
            coordinator,
        }
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> AppResult<SendOutcome> {
        self.coordinator
            .send_message(sender_id, receiver_id, content)
            .await
    }

    pub async fn get_conversation(&self, conversation_id: Uuid) -> AppResult<Conversation> {
        self.catalog.get(conversation_id).await
    }

    pub async fn list_conversations_for_user(
        &self,
        user_id: Uuid,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> AppResult<Page<ConversationListEntry>> {
        let limit = limit.unwrap_or(self.config.default_page_size);
        self.directory.list_conversations(user_id, cursor, limit).await
    }

    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        cursor: Option<&str>,
        limit: Option<usize>,
        before_timestamp: Option<DateTime<Utc>>,
    ) -> AppResult<Page<Message>> {
        let limit = limit.unwrap_or(self.config.default_page_size);
        self.messages
            .list_messages(conversation_id, cursor, limit, before_timestamp)
            .await
    }
}
