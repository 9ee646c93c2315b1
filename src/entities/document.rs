//! Collaborative document entities

use super::enums::{CollaboratorRole, DocumentType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Document {
    pub document_id: i64,
    pub title: String,
    pub doc_type: DocumentType,
    pub owner_id: i64,
    pub content: String,
    pub version: i64,
    pub last_modified: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Collaborator {
    pub document_id: i64,
    pub user_id: i64,
    pub role: CollaboratorRole,
}

/// Access rules of a document together with its collaborator list
pub struct DocumentAccess<'a> {
    pub document: &'a Document,
    pub collaborators: &'a [Collaborator],
}

impl DocumentAccess<'_> {
    pub fn can_read(&self, user_id: i64) -> bool {
        self.document.owner_id == user_id
            || self.collaborators.iter().any(|c| c.user_id == user_id)
    }

    pub fn can_edit(&self, user_id: i64) -> bool {
        self.document.owner_id == user_id
            || self
                .collaborators
                .iter()
                .any(|c| c.user_id == user_id && c.role == CollaboratorRole::Editor)
    }
}
