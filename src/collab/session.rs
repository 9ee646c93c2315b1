use super::operation::{OperationError, TextOperation};
use crate::entities::{Collaborator, Document, DocumentAccess};
use crate::repositories::{DocumentRepository, Read};
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Pending operations written back to storage at once
pub const FLUSH_THRESHOLD: usize = 10;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AppliedOperation {
    pub operation: TextOperation,
    pub version: i64,
    pub user_id: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub version: i64,
    pub content: String,
    #[serde(skip)]
    pub flushed: bool,
}

/// Document loaded in memory while it is being edited
#[derive(Debug)]
pub struct ActiveDocument {
    pub document: Document,
    pub collaborators: Vec<Collaborator>,
    pub pending: Vec<AppliedOperation>,
}

impl ActiveDocument {
    fn access(&self) -> DocumentAccess<'_> {
        DocumentAccess {
            document: &self.document,
            collaborators: &self.collaborators,
        }
    }

    async fn flush(&mut self, repo: &DocumentRepository) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        repo.save_content(
            self.document.document_id,
            &self.document.content,
            self.document.version,
            now,
        )
        .await?;
        self.document.last_modified = now;
        self.pending.clear();
        Ok(())
    }
}

pub struct DocumentSessions {
    active: DashMap<i64, Arc<Mutex<ActiveDocument>>>,
}

impl DocumentSessions {
    pub fn new() -> Self {
        Self {
            active: DashMap::new(),
        }
    }

    /// Returns the in-memory document, loading it from storage on first use
    #[instrument(skip(self, repo))]
    pub async fn open(
        &self,
        repo: &DocumentRepository,
        document_id: i64,
    ) -> Result<Arc<Mutex<ActiveDocument>>, OperationError> {
        if let Some(entry) = self.active.get(&document_id) {
            return Ok(entry.value().clone());
        }

        let document = repo
            .read(&document_id)
            .await?
            .ok_or(OperationError::DocumentNotFound(document_id))?;
        let collaborators = repo.find_collaborators(document_id).await?;
        debug!(version = document.version, "Document loaded into session");

        let loaded = Arc::new(Mutex::new(ActiveDocument {
            document,
            collaborators,
            pending: Vec::new(),
        }));
        // A concurrent open may have won the race; keep whichever got in first.
        let entry = self.active.entry(document_id).or_insert(loaded);
        Ok(entry.value().clone())
    }

    /// Current state of a document the user may read
    pub async fn snapshot(
        &self,
        repo: &DocumentRepository,
        document_id: i64,
        user_id: i64,
    ) -> Result<(Document, Vec<Collaborator>), OperationError> {
        let session = self.open(repo, document_id).await?;
        let active = session.lock().await;
        if !active.access().can_read(user_id) {
            return Err(OperationError::AccessDenied);
        }
        Ok((active.document.clone(), active.collaborators.clone()))
    }

    /// Fails unless the user may edit the document
    pub async fn check_edit(
        &self,
        repo: &DocumentRepository,
        document_id: i64,
        user_id: i64,
    ) -> Result<(), OperationError> {
        let session = self.open(repo, document_id).await?;
        let active = session.lock().await;
        let access = active.access();
        if !access.can_read(user_id) {
            return Err(OperationError::AccessDenied);
        }
        if !access.can_edit(user_id) {
            return Err(OperationError::EditDenied);
        }
        Ok(())
    }

    #[instrument(skip(self, repo, operation))]
    pub async fn apply(
        &self,
        repo: &DocumentRepository,
        document_id: i64,
        user_id: i64,
        operation: TextOperation,
    ) -> Result<OperationOutcome, OperationError> {
        let session = self.open(repo, document_id).await?;
        let mut active = session.lock().await;

        let access = active.access();
        if !access.can_read(user_id) {
            return Err(OperationError::AccessDenied);
        }
        if !access.can_edit(user_id) {
            return Err(OperationError::EditDenied);
        }

        let content = operation.apply(&active.document.content)?;
        active.document.content = content;
        active.document.version += 1;
        let version = active.document.version;
        active.pending.push(AppliedOperation {
            operation,
            version,
            user_id,
        });

        let flushed = active.pending.len() >= FLUSH_THRESHOLD;
        if flushed {
            active.flush(repo).await?;
            info!(version, "Document flushed after {} operations", FLUSH_THRESHOLD);
        }

        Ok(OperationOutcome {
            version,
            content: active.document.content.clone(),
            flushed,
        })
    }

    /// Writes pending operations to storage right away
    #[instrument(skip(self, repo))]
    pub async fn save(
        &self,
        repo: &DocumentRepository,
        document_id: i64,
        user_id: i64,
    ) -> Result<Document, OperationError> {
        let session = self.open(repo, document_id).await?;
        let mut active = session.lock().await;
        if !active.access().can_edit(user_id) {
            return Err(OperationError::EditDenied);
        }
        active.flush(repo).await?;
        Ok(active.document.clone())
    }

    /// Keeps a loaded document's access list in step with storage
    pub async fn set_collaborators(&self, document_id: i64, collaborators: Vec<Collaborator>) {
        let session = self.active.get(&document_id).map(|e| e.value().clone());
        if let Some(session) = session {
            session.lock().await.collaborators = collaborators;
        }
    }

    pub async fn pending_count(&self, document_id: i64) -> usize {
        let session = self.active.get(&document_id).map(|e| e.value().clone());
        match session {
            Some(session) => session.lock().await.pending.len(),
            None => 0,
        }
    }
}

impl Default for DocumentSessions {
    fn default() -> Self {
        Self::new()
    }
}
