//! Chat DTOs

use crate::entities::{ChatMessage, ChatMessageType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateChatMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,
    pub message_type: Option<ChatMessageType>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct UpdateChatMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,
}

/// Message as broadcast to a room, enriched with the sender's username
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessageDTO {
    pub message_id: i64,
    pub room_id: String,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub message_type: ChatMessageType,
    pub created_at: DateTime<Utc>,
}

impl ChatMessageDTO {
    pub fn from_message(message: ChatMessage, username: String) -> Self {
        Self {
            message_id: message.message_id,
            room_id: message.room_id,
            user_id: message.user_id,
            username,
            content: message.content,
            message_type: message.message_type,
            created_at: message.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ActiveUserDTO {
    pub user_id: i64,
    pub username: String,
}
