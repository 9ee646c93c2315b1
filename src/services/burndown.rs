//! Burndown services

use crate::burndown::{self, BurndownData};
use crate::core::{AppError, AppState};
use crate::repositories::Read;
use axum::extract::{Json, Path, State};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Computes the chart of a sprint from its current tasks and caches it
async fn recompute(state: &AppState, sprint_id: i64) -> Result<BurndownData, AppError> {
    let sprint = state
        .sprint
        .read(&sprint_id)
        .await?
        .ok_or_else(|| AppError::not_found("Sprint not found"))?;
    let tasks = state.task.find_by_sprint(sprint_id).await?;
    let data = burndown::compute(&sprint, &tasks)?;
    state.burndown.store(data.clone());
    debug!(points = data.actual_burndown.len(), "Burndown computed");
    Ok(data)
}

#[instrument(skip(state))]
pub async fn get_sprint_burndown(
    State(state): State<Arc<AppState>>,
    Path(sprint_id): Path<i64>,
) -> Result<Json<BurndownData>, AppError> {
    Ok(Json(recompute(&state, sprint_id).await?))
}

/// Refreshes the cached chart after a task of the sprint changed
#[instrument(skip(state))]
pub async fn refresh_after_task(
    State(state): State<Arc<AppState>>,
    Path((sprint_id, task_id)): Path<(i64, i64)>,
) -> Result<Json<BurndownData>, AppError> {
    if state.task.read(&task_id).await?.is_none() {
        return Err(AppError::not_found("Task not found"));
    }
    Ok(Json(recompute(&state, sprint_id).await?))
}
