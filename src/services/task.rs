//! Task services - CRUD, status moves and the Kanban board

use crate::core::{AppError, AppState};
use crate::dtos::{
    BoardDTO, CreateTaskDTO, Outbound, ServerEvent, TaskQuery, UpdateTaskDTO, UpdateTaskStatusDTO,
};
use crate::entities::{Task, User};
use crate::repositories::{Create, Delete, Read, Update};
use crate::ws::{broadcast_to_room, notify_user, roommap::sprint_room};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

/// Sprint and assignee referenced by a task must exist
async fn check_references(
    state: &AppState,
    sprint_id: Option<i64>,
    assignee_id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(sprint_id) = sprint_id {
        if state.sprint.read(&sprint_id).await?.is_none() {
            return Err(AppError::not_found("Sprint not found"));
        }
    }
    if let Some(assignee_id) = assignee_id {
        if state.user.read(&assignee_id).await?.is_none() {
            return Err(AppError::not_found("Assignee not found"));
        }
    }
    Ok(())
}

/// Pushes a changed task to its sprint room and drops the stale burndown
fn publish_task(state: &AppState, task: &Task) {
    if let Some(sprint_id) = task.sprint_id {
        state.burndown.invalidate(sprint_id);
        broadcast_to_room(
            state,
            &sprint_room(sprint_id),
            Outbound::to_all(ServerEvent::TaskUpdated(task.clone())),
        );
    }
}

/// Tells a newly assigned user about the task, unless they assigned themselves
fn notify_assignee(state: &AppState, actor: &User, previous: Option<i64>, task: &Task) {
    match task.assignee_id {
        Some(assignee) if assignee != actor.user_id && previous != Some(assignee) => {
            let link = task.sprint_id.map(|id| format!("/sprints/{}/board", id));
            let sent = notify_user(
                state,
                assignee,
                ServerEvent::notification(
                    "task-assigned",
                    format!("{} assigned you to \"{}\"", actor.username, task.title),
                    link,
                ),
            );
            debug!(assignee, delivered = sent, "Assignment notification");
        }
        _ => {}
    }
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    Ok(Json(state.task.find_filtered(&filter).await?))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateTaskDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    check_references(&state, body.sprint_id, body.assignee_id).await?;

    let task = state.task.create(&body).await?;
    info!(task_id = task.task_id, "Task created");
    publish_task(&state, &task);
    notify_assignee(&state, &current_user, None, &task);
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    state
        .task
        .read(&task_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Task not found"))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(task_id): Path<i64>,
    Json(body): Json<UpdateTaskDTO>,
) -> Result<Json<Task>, AppError> {
    body.validate()?;
    let current = state
        .task
        .read(&task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    check_references(&state, body.sprint_id, body.assignee_id).await?;

    let task = state.task.update(&task_id, &body).await?;
    if current.sprint_id != task.sprint_id {
        if let Some(old_sprint) = current.sprint_id {
            state.burndown.invalidate(old_sprint);
        }
    }
    publish_task(&state, &task);
    notify_assignee(&state, &current_user, current.assignee_id, &task);
    Ok(Json(task))
}

#[instrument(skip(state, body))]
pub async fn update_task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
    Json(body): Json<UpdateTaskStatusDTO>,
) -> Result<Json<Task>, AppError> {
    let task = state.task.update_status(task_id, body.status).await?;
    info!(status = task.status.as_str(), "Task moved");
    publish_task(&state, &task);
    Ok(Json(task))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let task = state
        .task
        .read(&task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    state.task.delete(&task_id).await?;
    if let Some(sprint_id) = task.sprint_id {
        state.burndown.invalidate(sprint_id);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_board(
    State(state): State<Arc<AppState>>,
    Path(sprint_id): Path<i64>,
) -> Result<Json<BoardDTO>, AppError> {
    let sprint = state
        .sprint
        .read(&sprint_id)
        .await?
        .ok_or_else(|| AppError::not_found("Sprint not found"))?;
    let tasks = state.task.find_by_sprint(sprint_id).await?;
    Ok(Json(BoardDTO::build(sprint, tasks)))
}
