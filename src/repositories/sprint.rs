//! SprintRepository

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateSprintDTO, UpdateSprintDTO};
use crate::entities::{Sprint, SprintStatus};
use chrono::Utc;
use sqlx::{Error, SqlitePool};

pub struct SprintRepository {
    connection_pool: SqlitePool,
}

impl SprintRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Most recent sprints first
    pub async fn find_all(&self) -> Result<Vec<Sprint>, Error> {
        sqlx::query_as::<_, Sprint>("SELECT * FROM sprints ORDER BY start_date DESC, sprint_id DESC")
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Create<Sprint, CreateSprintDTO> for SprintRepository {
    async fn create(&self, data: &CreateSprintDTO) -> Result<Sprint, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Sprint>(
            r#"
            INSERT INTO sprints (name, goal, start_date, end_date, total_story_points, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.goal)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.total_story_points)
        .bind(data.status.unwrap_or(SprintStatus::Active))
        .bind(now)
        .bind(now)
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<Sprint, i64> for SprintRepository {
    async fn read(&self, id: &i64) -> Result<Option<Sprint>, Error> {
        sqlx::query_as::<_, Sprint>("SELECT * FROM sprints WHERE sprint_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Sprint, UpdateSprintDTO, i64> for SprintRepository {
    async fn update(&self, id: &i64, data: &UpdateSprintDTO) -> Result<Sprint, Error> {
        sqlx::query_as::<_, Sprint>(
            r#"
            UPDATE sprints
            SET name = COALESCE(?, name),
                goal = COALESCE(?, goal),
                start_date = COALESCE(?, start_date),
                end_date = COALESCE(?, end_date),
                total_story_points = COALESCE(?, total_story_points),
                status = COALESCE(?, status),
                updated_at = ?
            WHERE sprint_id = ?
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.goal)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.total_story_points)
        .bind(data.status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for SprintRepository {
    async fn delete(&self, id: &i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM sprints WHERE sprint_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
