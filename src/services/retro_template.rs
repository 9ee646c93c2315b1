//! Retro template services. Built-in templates are read-only.

use crate::core::{AppError, AppState};
use crate::dtos::{CreateTemplateDTO, UpdateTemplateDTO};
use crate::entities::RetroTemplate;
use crate::repositories::Read;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// 403 for a built-in template, 404 when nothing has this id
async fn missing_custom(state: &AppState, template_id: &String) -> Result<AppError, AppError> {
    Ok(match state.retro_template.read(template_id).await? {
        Some(_) => AppError::forbidden("Built-in templates cannot be modified"),
        None => AppError::not_found("Template not found"),
    })
}

pub async fn list_templates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RetroTemplate>>, AppError> {
    Ok(Json(state.retro_template.find_all().await?))
}

pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(template_id): Path<String>,
) -> Result<Json<RetroTemplate>, AppError> {
    state
        .retro_template
        .read(&template_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Template not found"))
}

#[instrument(skip(state, body), fields(name = %body.name))]
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTemplateDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let template = state.retro_template.create_custom(&body).await?;
    info!(template_id = %template.template_id, "Custom template created");
    Ok((StatusCode::CREATED, Json(template)))
}

#[instrument(skip(state, body))]
pub async fn update_template(
    State(state): State<Arc<AppState>>,
    Path(template_id): Path<String>,
    Json(body): Json<UpdateTemplateDTO>,
) -> Result<Json<RetroTemplate>, AppError> {
    body.validate()?;
    match state.retro_template.update_custom(&template_id, &body).await? {
        Some(template) => Ok(Json(template)),
        None => Err(missing_custom(&state, &template_id).await?),
    }
}

#[instrument(skip(state))]
pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(template_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if state.retro_template.delete_custom(&template_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(missing_custom(&state, &template_id).await?)
    }
}
