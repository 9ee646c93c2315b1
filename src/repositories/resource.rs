//! ResourceRepository - the learning library

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateResourceDTO, ResourceFilter, UpdateResourceDTO};
use crate::entities::Resource;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};

pub struct ResourceRepository {
    connection_pool: SqlitePool,
}

impl ResourceRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// All filters are exact matches; `tag` matches any element of `tags`
    pub async fn find_filtered(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM resources WHERE 1 = 1");
        if let Some(category) = &filter.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(difficulty) = &filter.difficulty {
            builder.push(" AND difficulty = ").push_bind(difficulty.clone());
        }
        if let Some(resource_type) = &filter.resource_type {
            builder.push(" AND resource_type = ").push_bind(resource_type.clone());
        }
        if let Some(tag) = &filter.tag {
            builder
                .push(" AND EXISTS (SELECT 1 FROM json_each(resources.tags) WHERE json_each.value = ")
                .push_bind(tag.clone())
                .push(")");
        }
        builder.push(" ORDER BY title");
        builder
            .build_query_as::<Resource>()
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Resources carrying at least one of `tags`
    pub async fn find_by_any_tag(&self, tags: &[String]) -> Result<Vec<Resource>, Error> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT * FROM resources WHERE EXISTS (SELECT 1 FROM json_each(resources.tags) WHERE json_each.value IN (",
        );
        let mut separated = builder.separated(", ");
        for tag in tags {
            separated.push_bind(tag.clone());
        }
        separated.push_unseparated("))");
        builder.push(" ORDER BY title");
        builder
            .build_query_as::<Resource>()
            .fetch_all(&self.connection_pool)
            .await
    }
}

impl Create<Resource, CreateResourceDTO> for ResourceRepository {
    async fn create(&self, data: &CreateResourceDTO) -> Result<Resource, Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Resource>(
            r#"
            INSERT INTO resources (title, resource_type, category, difficulty, content, tags, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.resource_type)
        .bind(&data.category)
        .bind(&data.difficulty)
        .bind(Json(&data.content))
        .bind(Json(&data.tags))
        .bind(now)
        .bind(now)
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<Resource, i64> for ResourceRepository {
    async fn read(&self, id: &i64) -> Result<Option<Resource>, Error> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE resource_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Resource, UpdateResourceDTO, i64> for ResourceRepository {
    async fn update(&self, id: &i64, data: &UpdateResourceDTO) -> Result<Resource, Error> {
        sqlx::query_as::<_, Resource>(
            r#"
            UPDATE resources
            SET title = COALESCE(?, title),
                resource_type = COALESCE(?, resource_type),
                category = COALESCE(?, category),
                difficulty = COALESCE(?, difficulty),
                content = COALESCE(?, content),
                tags = COALESCE(?, tags),
                updated_at = ?
            WHERE resource_id = ?
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.resource_type)
        .bind(&data.category)
        .bind(&data.difficulty)
        .bind(data.content.as_ref().map(Json))
        .bind(data.tags.as_ref().map(Json))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for ResourceRepository {
    async fn delete(&self, id: &i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM resources WHERE resource_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
