//! Sprint services

use crate::core::{AppError, AppState};
use crate::dtos::{CreateSprintDTO, UpdateSprintDTO, sprint::check_window};
use crate::entities::{Sprint, User};
use crate::repositories::{Create, Delete, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

pub async fn list_sprints(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Sprint>>, AppError> {
    Ok(Json(state.sprint.find_all().await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn create_sprint(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateSprintDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let sprint = state.sprint.create(&body).await?;
    info!(sprint_id = sprint.sprint_id, "Sprint created");
    Ok((StatusCode::CREATED, Json(sprint)))
}

pub async fn get_sprint(
    State(state): State<Arc<AppState>>,
    Path(sprint_id): Path<i64>,
) -> Result<Json<Sprint>, AppError> {
    state
        .sprint
        .read(&sprint_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Sprint not found"))
}

#[instrument(skip(state, body))]
pub async fn update_sprint(
    State(state): State<Arc<AppState>>,
    Path(sprint_id): Path<i64>,
    Json(body): Json<UpdateSprintDTO>,
) -> Result<Json<Sprint>, AppError> {
    body.validate()?;
    let current = state
        .sprint
        .read(&sprint_id)
        .await?
        .ok_or_else(|| AppError::not_found("Sprint not found"))?;

    let start = body.start_date.unwrap_or(current.start_date);
    let end = body.end_date.unwrap_or(current.end_date);
    check_window(&start, &end).map_err(|err| {
        AppError::bad_request("Validation error")
            .with_details(err.message.unwrap_or_default().into_owned())
    })?;

    let sprint = state.sprint.update(&sprint_id, &body).await?;
    state.burndown.invalidate(sprint_id);
    Ok(Json(sprint))
}

#[instrument(skip(state))]
pub async fn delete_sprint(
    State(state): State<Arc<AppState>>,
    Path(sprint_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.sprint.delete(&sprint_id).await? {
        return Err(AppError::not_found("Sprint not found"));
    }
    state.burndown.invalidate(sprint_id);
    info!("Sprint deleted");
    Ok(StatusCode::NO_CONTENT)
}
