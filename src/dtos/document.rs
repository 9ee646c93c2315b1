//! Collaborative document DTOs

use crate::entities::{Collaborator, CollaboratorRole, Document, DocumentType};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateDocumentDTO {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub doc_type: DocumentType,
    #[serde(default)]
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CollaboratorRoleDTO {
    #[serde(default = "default_collaborator_role")]
    pub role: CollaboratorRole,
}

fn default_collaborator_role() -> CollaboratorRole {
    CollaboratorRole::Editor
}

/// Document as seen by a reader: stored record overlaid with the live session
#[derive(Serialize, Deserialize, Debug)]
pub struct DocumentDTO {
    #[serde(flatten)]
    pub document: Document,
    pub collaborators: Vec<Collaborator>,
}
