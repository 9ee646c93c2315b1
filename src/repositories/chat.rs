//! ChatRepository - persisted room messages

use super::{Delete, Read};
use crate::dtos::PageWindow;
use crate::entities::{ChatMessage, ChatMessageType};
use chrono::Utc;
use sqlx::{Error, SqlitePool};

pub struct ChatRepository {
    connection_pool: SqlitePool,
}

impl ChatRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn create(
        &self,
        room_id: &str,
        user_id: i64,
        content: &str,
        message_type: ChatMessageType,
    ) -> Result<ChatMessage, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_messages (room_id, user_id, content, message_type, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .bind(content)
        .bind(message_type)
        .bind(now)
        .bind(now)
        .fetch_one(&self.connection_pool)
        .await
    }

    pub async fn count_in_room(&self, room_id: &str) -> Result<i64, Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE room_id = ?")
            .bind(room_id)
            .fetch_one(&self.connection_pool)
            .await
    }

    /// Page 1 holds the newest messages; each page is returned oldest first
    pub async fn find_page(
        &self,
        room_id: &str,
        window: PageWindow,
    ) -> Result<Vec<ChatMessage>, Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT * FROM (
                SELECT * FROM chat_messages
                WHERE room_id = ?
                ORDER BY created_at DESC, message_id DESC
                LIMIT ? OFFSET ?
            )
            ORDER BY created_at ASC, message_id ASC
            "#,
        )
        .bind(room_id)
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Substring search inside one room, newest first, at most 50 hits
    pub async fn search(&self, room_id: &str, term: &str) -> Result<Vec<ChatMessage>, Error> {
        let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT * FROM chat_messages
            WHERE room_id = ? AND content LIKE ? ESCAPE '\'
            ORDER BY created_at DESC, message_id DESC
            LIMIT 50
            "#,
        )
        .bind(room_id)
        .bind(format!("%{}%", escaped))
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn update_content(&self, id: i64, content: &str) -> Result<ChatMessage, Error> {
        sqlx::query_as::<_, ChatMessage>(
            "UPDATE chat_messages SET content = ?, updated_at = ? WHERE message_id = ? RETURNING *",
        )
        .bind(content)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }
}

impl Read<ChatMessage, i64> for ChatRepository {
    async fn read(&self, id: &i64) -> Result<Option<ChatMessage>, Error> {
        sqlx::query_as::<_, ChatMessage>("SELECT * FROM chat_messages WHERE message_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Delete<i64> for ChatRepository {
    async fn delete(&self, id: &i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE message_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
