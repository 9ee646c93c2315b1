//! Learning resources - catalog reads and plain CRUD

use crate::core::{AppError, AppState};
use crate::dtos::{CreateResourceDTO, ResourceFilter, TagsQuery, UpdateResourceDTO};
use crate::entities::{Resource, User};
use crate::repositories::{Create, Delete, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[instrument(skip(state))]
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ResourceFilter>,
) -> Result<Json<Vec<Resource>>, AppError> {
    Ok(Json(state.resource.find_filtered(&filter).await?))
}

pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<i64>,
) -> Result<Json<Resource>, AppError> {
    state
        .resource
        .read(&resource_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Resource not found"))
}

pub async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Resource>>, AppError> {
    let filter = ResourceFilter {
        category: Some(category),
        ..Default::default()
    };
    Ok(Json(state.resource.find_filtered(&filter).await?))
}

pub async fn list_by_difficulty(
    State(state): State<Arc<AppState>>,
    Path(level): Path<String>,
) -> Result<Json<Vec<Resource>>, AppError> {
    let filter = ResourceFilter {
        difficulty: Some(level),
        ..Default::default()
    };
    Ok(Json(state.resource.find_filtered(&filter).await?))
}

/// Resources tagged with any of `?tags=a,b`
#[instrument(skip(state), fields(tags = %params.tags))]
pub async fn search_by_tags(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TagsQuery>,
) -> Result<Json<Vec<Resource>>, AppError> {
    let tags = params.tag_list();
    if tags.is_empty() {
        return Err(AppError::bad_request("At least one tag is required"));
    }
    Ok(Json(state.resource.find_by_any_tag(&tags).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateResourceDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let resource = state.resource.create(&body).await?;
    info!(resource_id = resource.resource_id, "Resource created");
    Ok((StatusCode::CREATED, Json(resource)))
}

#[instrument(skip(state, body))]
pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<i64>,
    Json(body): Json<UpdateResourceDTO>,
) -> Result<Json<Resource>, AppError> {
    body.validate()?;
    Ok(Json(state.resource.update(&resource_id, &body).await?))
}

#[instrument(skip(state))]
pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if state.resource.delete(&resource_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Resource not found"))
    }
}
