//! Learning resource entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Resource {
    pub resource_id: i64,
    pub title: String,
    pub resource_type: String,
    pub category: String,
    pub difficulty: String,
    pub content: Json<serde_json::Value>,
    pub tags: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
