//! TaskRepository - tasks and the filters behind the board and burndown

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateTaskDTO, TaskQuery, UpdateTaskDTO};
use crate::entities::{Task, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

pub struct TaskRepository {
    connection_pool: SqlitePool,
}

/// `completed_at` follows the status: set when a task first reaches DONE,
/// cleared when it leaves DONE.
fn completion_time(
    current: Option<DateTime<Utc>>,
    status: TaskStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match status {
        TaskStatus::Done => current.or(Some(now)),
        _ => None,
    }
}

impl TaskRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_filtered(&self, filter: &TaskQuery) -> Result<Vec<Task>, Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM tasks WHERE 1 = 1");
        if let Some(sprint_id) = filter.sprint_id {
            builder.push(" AND sprint_id = ").push_bind(sprint_id);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(assignee_id) = filter.assignee_id {
            builder.push(" AND assignee_id = ").push_bind(assignee_id);
        }
        builder.push(" ORDER BY created_at, task_id");
        builder
            .build_query_as::<Task>()
            .fetch_all(&self.connection_pool)
            .await
    }

    pub async fn find_by_sprint(&self, sprint_id: i64) -> Result<Vec<Task>, Error> {
        self.find_filtered(&TaskQuery {
            sprint_id: Some(sprint_id),
            ..Default::default()
        })
        .await
    }

    pub async fn update_status(&self, id: i64, status: TaskStatus) -> Result<Task, Error> {
        self.update(
            &id,
            &UpdateTaskDTO {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }
}

impl Create<Task, CreateTaskDTO> for TaskRepository {
    async fn create(&self, data: &CreateTaskDTO) -> Result<Task, Error> {
        let now = Utc::now();
        let status = data.status.unwrap_or(TaskStatus::Todo);
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (sprint_id, title, description, status, priority, assignee_id,
                               story_points, completed_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(data.sprint_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(status)
        .bind(data.priority.unwrap_or(TaskPriority::Medium))
        .bind(data.assignee_id)
        .bind(data.story_points.unwrap_or(0))
        .bind(completion_time(None, status, now))
        .bind(now)
        .bind(now)
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<Task, i64> for TaskRepository {
    async fn read(&self, id: &i64) -> Result<Option<Task>, Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE task_id = ?")
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Task, UpdateTaskDTO, i64> for TaskRepository {
    async fn update(&self, id: &i64, data: &UpdateTaskDTO) -> Result<Task, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;
        let now = Utc::now();
        let status = data.status.unwrap_or(current.status);

        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET sprint_id = COALESCE(?, sprint_id),
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                status = ?,
                priority = COALESCE(?, priority),
                assignee_id = COALESCE(?, assignee_id),
                story_points = COALESCE(?, story_points),
                completed_at = ?,
                updated_at = ?
            WHERE task_id = ?
            RETURNING *
            "#,
        )
        .bind(data.sprint_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(status)
        .bind(data.priority)
        .bind(data.assignee_id)
        .bind(data.story_points)
        .bind(completion_time(current.completed_at, status, now))
        .bind(now)
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for TaskRepository {
    async fn delete(&self, id: &i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE task_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
