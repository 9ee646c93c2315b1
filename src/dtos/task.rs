//! Task and Kanban board DTOs

use crate::entities::{Sprint, Task, TaskPriority, TaskStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateTaskDTO {
    pub sprint_id: Option<i64>,
    #[validate(length(min = 1, max = 200, message = "Task title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<i64>,
    #[validate(range(min = 0, max = 10000, message = "Story points must be between 0 and 10000"))]
    pub story_points: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateTaskDTO {
    pub sprint_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<i64>,
    #[validate(range(min = 0, max = 10000, message = "Story points must be between 0 and 10000"))]
    pub story_points: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateTaskStatusDTO {
    pub status: TaskStatus,
}

/// Filters accepted by `GET /api/tasks`
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct TaskQuery {
    pub sprint_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BoardColumnDTO {
    pub status: TaskStatus,
    pub story_points: i64,
    pub tasks: Vec<Task>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BoardDTO {
    pub sprint: Sprint,
    pub columns: Vec<BoardColumnDTO>,
}

impl BoardDTO {
    /// Groups tasks into the four status columns, keeping their order
    pub fn build(sprint: Sprint, tasks: Vec<Task>) -> Self {
        let mut columns: Vec<BoardColumnDTO> = TaskStatus::ALL
            .iter()
            .map(|status| BoardColumnDTO {
                status: *status,
                story_points: 0,
                tasks: Vec::new(),
            })
            .collect();

        for task in tasks {
            if let Some(column) = columns.iter_mut().find(|c| c.status == task.status) {
                column.story_points = column.story_points.saturating_add(task.story_points);
                column.tasks.push(task);
            }
        }

        Self { sprint, columns }
    }
}
