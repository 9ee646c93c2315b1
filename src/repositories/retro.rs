//! RetroRepository - retrospectives with their items and action items

use super::{Delete, Read};
use crate::dtos::{
    CreateActionItemDTO, CreateRetroItemDTO, UpdateActionItemDTO, UpdateRetroItemDTO,
};
use crate::entities::{ActionItem, Retro, RetroCategory, RetroItem, RetroStatus};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Error, SqlitePool};
use tracing::instrument;

pub struct RetroRepository {
    connection_pool: SqlitePool,
}

/// Fields of a new retro once its columns are resolved
pub struct NewRetro<'a> {
    pub sprint_id: Option<i64>,
    pub title: &'a str,
    pub template_id: Option<&'a str>,
    pub categories: &'a [RetroCategory],
    pub created_by: i64,
}

impl RetroRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn create(&self, data: &NewRetro<'_>) -> Result<Retro, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Retro>(
            r#"
            INSERT INTO retros (sprint_id, title, template_id, status, categories, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(data.sprint_id)
        .bind(data.title)
        .bind(data.template_id)
        .bind(RetroStatus::Active)
        .bind(Json(data.categories))
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.connection_pool)
        .await
    }

    pub async fn find_by_sprint(&self, sprint_id: i64) -> Result<Vec<Retro>, Error> {
        sqlx::query_as::<_, Retro>(
            "SELECT * FROM retros WHERE sprint_id = ? ORDER BY created_at DESC, retro_id DESC",
        )
        .bind(sprint_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn update_status(&self, id: i64, status: RetroStatus) -> Result<Retro, Error> {
        sqlx::query_as::<_, Retro>(
            "UPDATE retros SET status = ?, updated_at = ? WHERE retro_id = ? RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }

    // ---- items ----

    pub async fn create_item(
        &self,
        retro_id: i64,
        author_id: i64,
        data: &CreateRetroItemDTO,
    ) -> Result<RetroItem, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, RetroItem>(
            r#"
            INSERT INTO retro_items (retro_id, category_id, content, author_id, votes, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            RETURNING *
            "#,
        )
        .bind(retro_id)
        .bind(&data.category_id)
        .bind(&data.content)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.connection_pool)
        .await
    }

    /// Most voted first within each category
    pub async fn find_items(&self, retro_id: i64) -> Result<Vec<RetroItem>, Error> {
        sqlx::query_as::<_, RetroItem>(
            "SELECT * FROM retro_items WHERE retro_id = ? ORDER BY category_id, votes DESC, item_id",
        )
        .bind(retro_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn read_item(&self, item_id: i64) -> Result<Option<RetroItem>, Error> {
        sqlx::query_as::<_, RetroItem>("SELECT * FROM retro_items WHERE item_id = ?")
            .bind(item_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    pub async fn update_item(
        &self,
        item_id: i64,
        data: &UpdateRetroItemDTO,
    ) -> Result<RetroItem, Error> {
        sqlx::query_as::<_, RetroItem>(
            r#"
            UPDATE retro_items
            SET category_id = COALESCE(?, category_id),
                content = COALESCE(?, content),
                updated_at = ?
            WHERE item_id = ?
            RETURNING *
            "#,
        )
        .bind(&data.category_id)
        .bind(&data.content)
        .bind(Utc::now())
        .bind(item_id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }

    pub async fn delete_item(&self, item_id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM retro_items WHERE item_id = ?")
            .bind(item_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Adds `delta` votes; the count never drops below zero
    #[instrument(skip(self))]
    pub async fn vote(&self, item_id: i64, delta: i64) -> Result<RetroItem, Error> {
        sqlx::query_as::<_, RetroItem>(
            "UPDATE retro_items SET votes = MAX(votes + ?, 0) WHERE item_id = ? RETURNING *",
        )
        .bind(delta)
        .bind(item_id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }

    // ---- action items ----

    pub async fn create_action(
        &self,
        retro_id: i64,
        data: &CreateActionItemDTO,
    ) -> Result<ActionItem, Error> {
        sqlx::query_as::<_, ActionItem>(
            r#"
            INSERT INTO retro_action_items (retro_id, content, assignee, done, created_at)
            VALUES (?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(retro_id)
        .bind(&data.content)
        .bind(&data.assignee)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
    }

    pub async fn find_actions(&self, retro_id: i64) -> Result<Vec<ActionItem>, Error> {
        sqlx::query_as::<_, ActionItem>(
            "SELECT * FROM retro_action_items WHERE retro_id = ? ORDER BY action_id",
        )
        .bind(retro_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn read_action(&self, action_id: i64) -> Result<Option<ActionItem>, Error> {
        sqlx::query_as::<_, ActionItem>("SELECT * FROM retro_action_items WHERE action_id = ?")
            .bind(action_id)
            .fetch_optional(&self.connection_pool)
            .await
    }

    pub async fn update_action(
        &self,
        action_id: i64,
        data: &UpdateActionItemDTO,
    ) -> Result<ActionItem, Error> {
        sqlx::query_as::<_, ActionItem>(
            r#"
            UPDATE retro_action_items
            SET content = COALESCE(?, content),
                assignee = COALESCE(?, assignee),
                done = COALESCE(?, done)
            WHERE action_id = ?
            RETURNING *
            "#,
        )
        .bind(&data.content)
        .bind(&data.assignee)
        .bind(data.done)
        .bind(action_id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }

    pub async fn delete_action(&self, action_id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM retro_action_items WHERE action_id = ?")
            .bind(action_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Read<Retro, i64> for RetroRepository {
    async fn read(&self, id: &i64) -> Result<Option<Retro>, Error> {
        sqlx::query_as::<_, Retro>("SELECT * FROM retros WHERE retro_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Delete<i64> for RetroRepository {
    /// Items and action items go with it (ON DELETE CASCADE)
    async fn delete(&self, id: &i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM retros WHERE retro_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
