//! DocumentRepository - collaborative documents and their collaborators

use super::Read;
use crate::dtos::CreateDocumentDTO;
use crate::entities::{Collaborator, CollaboratorRole, Document};
use chrono::{DateTime, Utc};
use sqlx::{Error, SqlitePool};

pub struct DocumentRepository {
    connection_pool: SqlitePool,
}

impl DocumentRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn create(&self, owner_id: i64, data: &CreateDocumentDTO) -> Result<Document, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (title, doc_type, owner_id, content, version, last_modified, created_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(data.doc_type)
        .bind(owner_id)
        .bind(&data.content)
        .bind(now)
        .bind(now)
        .fetch_one(&self.connection_pool)
        .await
    }

    pub async fn save_content(
        &self,
        id: i64,
        content: &str,
        version: i64,
        last_modified: DateTime<Utc>,
    ) -> Result<(), Error> {
        let result = sqlx::query(
            "UPDATE documents SET content = ?, version = ?, last_modified = ? WHERE document_id = ?",
        )
        .bind(content)
        .bind(version)
        .bind(last_modified)
        .bind(id)
        .execute(&self.connection_pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RowNotFound);
        }
        Ok(())
    }

    pub async fn find_collaborators(&self, id: i64) -> Result<Vec<Collaborator>, Error> {
        sqlx::query_as::<_, Collaborator>(
            "SELECT * FROM document_collaborators WHERE document_id = ? ORDER BY user_id",
        )
        .bind(id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Adds the collaborator, or changes the role of an existing one
    pub async fn upsert_collaborator(
        &self,
        id: i64,
        user_id: i64,
        role: CollaboratorRole,
    ) -> Result<Collaborator, Error> {
        sqlx::query_as::<_, Collaborator>(
            r#"
            INSERT INTO document_collaborators (document_id, user_id, role)
            VALUES (?, ?, ?)
            ON CONFLICT (document_id, user_id) DO UPDATE SET role = excluded.role
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.connection_pool)
        .await
    }

    pub async fn remove_collaborator(&self, id: i64, user_id: i64) -> Result<bool, Error> {
        let result =
            sqlx::query("DELETE FROM document_collaborators WHERE document_id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .execute(&self.connection_pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Read<Document, i64> for DocumentRepository {
    async fn read(&self, id: &i64) -> Result<Option<Document>, Error> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE document_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}
