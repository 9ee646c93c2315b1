//! RetroTemplateRepository - built-in and custom retrospective templates

use super::Read;
use crate::dtos::{CreateTemplateDTO, UpdateTemplateDTO};
use crate::entities::RetroTemplate;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Error, SqlitePool};
use uuid::Uuid;

pub struct RetroTemplateRepository {
    connection_pool: SqlitePool,
}

impl RetroTemplateRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Built-in templates first, then custom ones by name
    pub async fn find_all(&self) -> Result<Vec<RetroTemplate>, Error> {
        sqlx::query_as::<_, RetroTemplate>(
            "SELECT * FROM retro_templates ORDER BY is_custom, created_at, name",
        )
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Custom templates get a random id
    pub async fn create_custom(&self, data: &CreateTemplateDTO) -> Result<RetroTemplate, Error> {
        sqlx::query_as::<_, RetroTemplate>(
            r#"
            INSERT INTO retro_templates (template_id, name, description, categories, is_custom, created_at)
            VALUES (?, ?, ?, ?, 1, ?)
            RETURNING *
            "#,
        )
        .bind(format!("custom-{}", Uuid::new_v4()))
        .bind(&data.name)
        .bind(&data.description)
        .bind(Json(&data.categories))
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
    }

    /// Returns `None` when no custom template has this id
    pub async fn update_custom(
        &self,
        id: &str,
        data: &UpdateTemplateDTO,
    ) -> Result<Option<RetroTemplate>, Error> {
        sqlx::query_as::<_, RetroTemplate>(
            r#"
            UPDATE retro_templates
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                categories = COALESCE(?, categories),
                updated_at = ?
            WHERE template_id = ? AND is_custom = 1
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.categories.as_ref().map(Json))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    pub async fn delete_custom(&self, id: &str) -> Result<bool, Error> {
        let result =
            sqlx::query("DELETE FROM retro_templates WHERE template_id = ? AND is_custom = 1")
                .bind(id)
                .execute(&self.connection_pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Read<RetroTemplate, String> for RetroTemplateRepository {
    async fn read(&self, id: &String) -> Result<Option<RetroTemplate>, Error> {
        sqlx::query_as::<_, RetroTemplate>("SELECT * FROM retro_templates WHERE template_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RetroCategory;
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn builtin_templates_are_seeded(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = RetroTemplateRepository::new(pool);
        let templates = repo.find_all().await?;
        let ids: Vec<_> = templates.iter().map(|t| t.template_id.as_str()).collect();
        for id in ["standard", "start-stop-continue", "mad-sad-glad", "four-ls", "sailboat"] {
            assert!(ids.contains(&id), "missing template {id}");
        }
        assert!(templates.iter().all(|t| !t.is_custom));
        Ok(())
    }

    #[sqlx::test]
    async fn builtin_templates_cannot_be_deleted(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = RetroTemplateRepository::new(pool);
        assert!(!repo.delete_custom("standard").await?);

        let custom = repo
            .create_custom(&CreateTemplateDTO {
                name: "Hot air balloon".into(),
                description: None,
                categories: vec![RetroCategory::new("fire", "Hot air", "#ff0000")],
            })
            .await?;
        assert!(custom.is_custom);
        assert!(repo.delete_custom(&custom.template_id).await?);
        Ok(())
    }
}
