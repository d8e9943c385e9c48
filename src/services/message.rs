use std::sync::Arc;

use serde::Deserialize;

use crate::crypto::MessageCipher;
use crate::db::models::{NewMessage, UserMessage};
use crate::error::{AppError, AppResult, Validator};
use crate::store::{MessageStore, UserStore};

const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageInput {
    pub to_user_id: String,
    pub content: String,
    #[serde(default, rename = "type")]
    pub message_type: Option<String>,
    #[serde(default)]
    pub related_essay_id: Option<String>,
}

/// Direct messages. Content is encrypted before it reaches the store and
/// decrypted on the way out.
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserStore>,
    cipher: MessageCipher,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserStore>,
        cipher: MessageCipher,
    ) -> Self {
        Self {
            messages,
            users,
            cipher,
        }
    }

    pub async fn list(
        &self,
        target_user_id: &str,
        requesting_user_id: &str,
        unread_only: bool,
    ) -> AppResult<Vec<UserMessage>> {
        if target_user_id != requesting_user_id {
            return Err(AppError::Forbidden(
                "You can only read your own messages".to_string(),
            ));
        }

        let messages = self.messages.list_messages(target_user_id, unread_only).await?;
        Ok(messages.into_iter().map(|m| self.reveal(m)).collect())
    }

    #[tracing::instrument(skip(self, input), fields(to = %input.to_user_id))]
    pub async fn send(&self, from_user_id: &str, input: SendMessageInput) -> AppResult<UserMessage> {
        Validator::new()
            .require("toUserId", &input.to_user_id)
            .require("content", &input.content)
            .max_len("content", &input.content, MAX_MESSAGE_LEN)
            .finish()?;

        if input.to_user_id == from_user_id {
            return Err(AppError::Conflict(
                "You cannot send a message to yourself".to_string(),
            ));
        }
        if self.users.get_user(&input.to_user_id).await?.is_none() {
            return Err(AppError::NotFound("Recipient not found".to_string()));
        }

        let sealed = self
            .cipher
            .encrypt(&input.content)
            .map_err(|e| AppError::Unexpected(e.to_string()))?;

        let mut stored = self
            .messages
            .create_message(NewMessage {
                from_user_id: from_user_id.to_string(),
                to_user_id: input.to_user_id,
                content: sealed,
                message_type: input.message_type.unwrap_or_else(|| "text".to_string()),
                related_essay_id: input.related_essay_id,
            })
            .await?;

        tracing::info!(message_id = %stored.id, "message sent");
        stored.content = input.content;
        Ok(stored)
    }

    /// Only the recipient may mark a message read. Messages the requester is
    /// not party to are reported as missing.
    pub async fn mark_read(&self, id: &str, requesting_user_id: &str) -> AppResult<UserMessage> {
        let message = self
            .messages
            .get_message(id)
            .await?
            .filter(|m| m.from_user_id == requesting_user_id || m.to_user_id == requesting_user_id)
            .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

        if message.to_user_id != requesting_user_id {
            return Err(AppError::Forbidden(
                "Only the recipient can mark a message as read".to_string(),
            ));
        }

        let updated = self
            .messages
            .mark_read(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;
        Ok(self.reveal(updated))
    }

    fn reveal(&self, mut message: UserMessage) -> UserMessage {
        match self.cipher.decrypt(&message.content) {
            Ok(plain) => message.content = plain,
            Err(e) => {
                tracing::warn!(message_id = %message.id, error = %e, "returning message content as stored");
            }
        }
        message
    }
}
