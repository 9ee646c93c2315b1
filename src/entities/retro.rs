//! Retrospective entities - templates, retros, items and action items

use super::enums::RetroStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Column of a retrospective board
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RetroCategory {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl RetroCategory {
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }

    /// Columns used by a retro created without a template
    pub fn defaults() -> Vec<RetroCategory> {
        vec![
            RetroCategory::new("1", "What Went Well", "#28a745"),
            RetroCategory::new("2", "What Could Be Improved", "#ffc107"),
            RetroCategory::new("3", "Action Items", "#007bff"),
        ]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct RetroTemplate {
    pub template_id: String,
    pub name: String,
    pub description: Option<String>,
    pub categories: Json<Vec<RetroCategory>>,
    pub is_custom: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Retro {
    pub retro_id: i64,
    pub sprint_id: Option<i64>,
    pub title: String,
    pub template_id: Option<String>,
    pub status: RetroStatus,
    pub categories: Json<Vec<RetroCategory>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct RetroItem {
    pub item_id: i64,
    pub retro_id: i64,
    pub category_id: String,
    pub content: String,
    pub author_id: i64,
    pub votes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ActionItem {
    pub action_id: i64,
    pub retro_id: i64,
    pub content: String,
    pub assignee: Option<String>,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}
