//! Forum entities - categories, threads and replies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ForumCategory {
    pub category_id: i64,
    pub name: String,
    pub description: String,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ForumThread {
    pub thread_id: i64,
    pub category_id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub views: i64,
    pub reply_count: i64,
    pub is_sticky: bool,
    pub is_locked: bool,
    pub last_reply_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ForumReply {
    pub reply_id: i64,
    pub thread_id: i64,
    pub content: String,
    pub author_id: i64,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
