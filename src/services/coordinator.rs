//! Send fan-out saga.
//!
//! There is no multi-partition transaction, so a send is four independently
//! retryable writes: resolve/allocate the conversation, append the message
//! (the durability point), refresh the catalog snapshot, and rewrite both
//! directory entries. Steps 3–4 are idempotent and monotonicity-guarded, so
//! they can land in any order or be re-run by a repair pass; once step 2 has
//! committed, the message is sent and is never retracted.

use std::sync::Arc;

use chrono::Utc;
use futures::join;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::Message;
use crate::retry::with_retry;
use crate::services::{
    ConversationCatalog, ConversationDirectory, ConversationIdentity, MessageStore,
};

/// Fan-out view that did not converge before retries ran out. The message is
/// durable regardless; re-running the guarded upserts with the returned
/// message's timestamp repairs the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanoutView {
    Catalog,
    SenderDirectory,
    ReceiverDirectory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FanoutReport {
    pub lagging: Vec<FanoutView>,
}

impl FanoutReport {
    pub fn is_complete(&self) -> bool {
        self.lagging.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub message: Message,
    pub conversation_id: Uuid,
    pub fanout: FanoutReport,
}

#[derive(Clone)]
pub struct WriteCoordinator {
    catalog: ConversationCatalog,
    messages: MessageStore,
    directory: ConversationDirectory,
    config: Arc<Config>,
}

impl WriteCoordinator {
    pub fn new(
        catalog: ConversationCatalog,
        messages: MessageStore,
        directory: ConversationDirectory,
        config: Arc<Config>,
    ) -> Self {
        Self {
            catalog,
            messages,
            directory,
            config,
        }
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> AppResult<SendOutcome> {
        if content.is_empty() {
            return Err(AppError::BadRequest("message content cannot be empty".into()));
        }
        if content.len() > self.config.max_content_bytes {
            return Err(AppError::BadRequest(format!(
                "message content exceeds {} bytes",
                self.config.max_content_bytes
            )));
        }

        // Step 1: canonical identity, allocating the catalog row on first
        // contact. Failures here abort the send before anything is written to
        // the message log.
        let conv = ConversationIdentity::resolve(sender_id, receiver_id)?;
        with_retry(&self.config.fanout_retry, "catalog.create_if_absent", || {
            self.catalog.create_if_absent(&conv, Utc::now())
        })
        .await?;

        // Step 2: the durability point. On exhausted retries the whole send
        // fails and no catalog/directory snapshot writes are attempted.
        let message = with_retry(&self.config.append_retry, "messages.append", || {
            self.messages
                .append(conv.id, sender_id, receiver_id, content, None)
        })
        .await
        .map_err(|e| AppError::SendFailed {
            attempts: self.config.append_retry.max_retries + 1,
            reason: e.to_string(),
        })?;

        // Steps 3–4: guarded, order-independent fan-out. A failure here never
        // fails the send; the lagging view is reported for out-of-band repair.
        let mut fanout = FanoutReport::default();

        let catalog_update = with_retry(&self.config.fanout_retry, "catalog.update_last_message", || {
            self.catalog
                .update_last_message(conv.id, message.created_at, &message.content)
        });
        let sender_entry = with_retry(&self.config.fanout_retry, "directory.upsert_entry", || {
            self.directory.upsert_entry(
                sender_id,
                conv.id,
                receiver_id,
                message.created_at,
                &message.content,
            )
        });
        let receiver_entry = with_retry(&self.config.fanout_retry, "directory.upsert_entry", || {
            self.directory.upsert_entry(
                receiver_id,
                conv.id,
                sender_id,
                message.created_at,
                &message.content,
            )
        });
        let (catalog_res, sender_res, receiver_res) =
            join!(catalog_update, sender_entry, receiver_entry);

        for (view, result) in [
            (FanoutView::Catalog, catalog_res.map(|_| ())),
            (FanoutView::SenderDirectory, sender_res),
            (FanoutView::ReceiverDirectory, receiver_res),
        ] {
            if let Err(e) = result {
                warn!(
                    conversation_id = %conv.id,
                    message_id = %message.id,
                    ?view,
                    error = %e,
                    "fan-out write lagging, left to repair"
                );
                fanout.lagging.push(view);
            }
        }

        Ok(SendOutcome {
            conversation_id: conv.id,
            message,
            fanout,
        })
    }
}
