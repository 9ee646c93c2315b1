//! WebSocket event DTOs
//!
//! Frames are adjacently tagged: `{"event": "chat-message", "data": {...}}`.
//! The server sends them in batches, as JSON arrays.

use crate::collab::TextOperation;
use crate::dtos::ChatMessageDTO;
use crate::entities::{ChatMessage, CollaboratorRole, Task};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events accepted from a connected client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinRetro(i64),
    JoinSprint(i64),
    JoinDocument(i64),
    LeaveRoom(String),
    ChatMessage {
        room_id: String,
        message: String,
    },
    EditContent {
        room_id: String,
        content: String,
        position: i64,
    },
}

/// Events pushed to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    ChatMessage(ChatMessageDTO),
    ContentUpdate {
        room_id: String,
        user_id: i64,
        content: String,
        position: i64,
    },
    RoomUpdate {
        room_type: String,
        room_id: String,
        user_count: usize,
        timestamp: DateTime<Utc>,
    },
    Notification {
        kind: String,
        message: String,
        link: Option<String>,
        timestamp: DateTime<Utc>,
    },
    Operation {
        document_id: i64,
        user_id: i64,
        version: i64,
        operation: TextOperation,
    },
    CollaboratorAdded {
        document_id: i64,
        user_id: i64,
        role: CollaboratorRole,
    },
    CollaboratorRemoved {
        document_id: i64,
        user_id: i64,
    },
    TaskUpdated(Task),
    MessageUpdated(ChatMessage),
    MessageDeleted {
        message_id: i64,
        room_id: String,
    },
    Error {
        code: u16,
        message: String,
    },
}

impl ServerEvent {
    pub fn notification(kind: &str, message: String, link: Option<String>) -> Self {
        ServerEvent::Notification {
            kind: kind.to_string(),
            message,
            link,
            timestamp: Utc::now(),
        }
    }
}

/// An event on its way to socket writers. `except_user` does not receive it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub except_user: Option<i64>,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn to_all(event: ServerEvent) -> Self {
        Self {
            except_user: None,
            event,
        }
    }

    pub fn except(user_id: i64, event: ServerEvent) -> Self {
        Self {
            except_user: Some(user_id),
            event,
        }
    }

    pub fn is_for(&self, user_id: i64) -> bool {
        self.except_user != Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_use_kebab_case_names() {
        let event: ClientEvent =
            serde_json::from_value(json!({"event": "join-retro", "data": 7})).unwrap();
        assert_eq!(event, ClientEvent::JoinRetro(7));

        let event: ClientEvent = serde_json::from_value(json!({
            "event": "chat-message",
            "data": {"room_id": "sprint:1", "message": "hi"}
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::ChatMessage {
                room_id: "sprint:1".into(),
                message: "hi".into()
            }
        );
    }

    #[test]
    fn unknown_client_event_is_rejected() {
        let parsed = serde_json::from_value::<ClientEvent>(json!({"event": "drop-table", "data": 1}));
        assert!(parsed.is_err());
    }

    #[test]
    fn server_error_serializes_with_code() {
        let value = serde_json::to_value(ServerEvent::Error {
            code: 403,
            message: "nope".into(),
        })
        .unwrap();
        assert_eq!(value, json!({"event": "error", "data": {"code": 403, "message": "nope"}}));
    }

    #[test]
    fn entity_events_compare_by_value() {
        let message = ChatMessage {
            message_id: 1,
            room_id: "sprint:1".into(),
            user_id: 2,
            content: "hi".into(),
            message_type: crate::entities::ChatMessageType::Text,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let updated = ServerEvent::MessageUpdated(message.clone());
        assert_eq!(updated, ServerEvent::MessageUpdated(message.clone()));

        let edited = ChatMessage {
            content: "hello".into(),
            ..message
        };
        assert_ne!(updated, ServerEvent::MessageUpdated(edited));
    }
}
