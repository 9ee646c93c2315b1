//! Chat message entity, scoped to a room

use super::enums::ChatMessageType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ChatMessage {
    pub message_id: i64,
    pub room_id: String,
    pub user_id: i64,
    pub content: String,
    pub message_type: ChatMessageType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
