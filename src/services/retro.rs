//! Retrospective services - retros, items, votes and action items

use crate::core::{AppError, AppState};
use crate::dtos::{
    CreateActionItemDTO, CreateRetroDTO, CreateRetroItemDTO, RetroDetailsDTO, UpdateActionItemDTO,
    UpdateRetroItemDTO, UpdateRetroStatusDTO,
};
use crate::entities::{ActionItem, Retro, RetroCategory, RetroItem, User, UserRole};
use crate::repositories::{Delete, Read, retro::NewRetro};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

async fn find_retro(state: &AppState, retro_id: i64) -> Result<Retro, AppError> {
    state
        .retro
        .read(&retro_id)
        .await?
        .ok_or_else(|| AppError::not_found("Retro not found"))
}

async fn find_item(state: &AppState, item_id: i64) -> Result<RetroItem, AppError> {
    state
        .retro
        .read_item(item_id)
        .await?
        .ok_or_else(|| AppError::not_found("Retro item not found"))
}

/// Returns the retro an action item belongs to, checking the caller may manage it
async fn managed_action_retro(
    state: &AppState,
    user: &User,
    action_id: i64,
) -> Result<Retro, AppError> {
    let action = state
        .retro
        .read_action(action_id)
        .await?
        .ok_or_else(|| AppError::not_found("Action item not found"))?;
    let retro = find_retro(state, action.retro_id).await?;
    check_owner(user, retro.created_by)?;
    Ok(retro)
}

/// Authors manage their own content; moderators manage everyone's
fn check_owner(user: &User, author_id: i64) -> Result<(), AppError> {
    if user.user_id == author_id || user.has_role(UserRole::Moderator) {
        Ok(())
    } else {
        warn!(user_id = user.user_id, author_id, "Not the author");
        Err(AppError::forbidden("Only the author or a moderator can do this"))
    }
}

/// Loads everything shown on a retro page
pub async fn load_details(state: &AppState, retro_id: i64) -> Result<RetroDetailsDTO, AppError> {
    let retro = find_retro(state, retro_id).await?;
    let items = state.retro.find_items(retro_id).await?;
    let action_items = state.retro.find_actions(retro_id).await?;
    let template = match &retro.template_id {
        Some(id) => state.retro_template.read(id).await?,
        None => None,
    };
    Ok(RetroDetailsDTO {
        retro,
        items,
        template,
        action_items,
    })
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn create_retro(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateRetroDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    if let Some(sprint_id) = body.sprint_id {
        if state.sprint.read(&sprint_id).await?.is_none() {
            return Err(AppError::not_found("Sprint not found"));
        }
    }

    // Columns are copied so later template edits leave existing retros alone
    let categories: Vec<RetroCategory> = match &body.template_id {
        Some(template_id) => {
            state
                .retro_template
                .read(template_id)
                .await?
                .ok_or_else(|| AppError::not_found("Template not found"))?
                .categories
                .0
        }
        None => RetroCategory::defaults(),
    };

    let retro = state
        .retro
        .create(&NewRetro {
            sprint_id: body.sprint_id,
            title: &body.title,
            template_id: body.template_id.as_deref(),
            categories: &categories,
            created_by: current_user.user_id,
        })
        .await?;
    info!(retro_id = retro.retro_id, "Retro created");
    Ok((StatusCode::CREATED, Json(retro)))
}

pub async fn get_retro(
    State(state): State<Arc<AppState>>,
    Path(retro_id): Path<i64>,
) -> Result<Json<RetroDetailsDTO>, AppError> {
    Ok(Json(load_details(&state, retro_id).await?))
}

pub async fn list_sprint_retros(
    State(state): State<Arc<AppState>>,
    Path(sprint_id): Path<i64>,
) -> Result<Json<Vec<Retro>>, AppError> {
    Ok(Json(state.retro.find_by_sprint(sprint_id).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn update_retro_status(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(retro_id): Path<i64>,
    Json(body): Json<UpdateRetroStatusDTO>,
) -> Result<Json<Retro>, AppError> {
    let retro = find_retro(&state, retro_id).await?;
    check_owner(&current_user, retro.created_by)?;
    let retro = state.retro.update_status(retro_id, body.status).await?;
    info!(status = ?retro.status, "Retro status changed");
    Ok(Json(retro))
}

#[instrument(skip(state, current_user), fields(user_id = current_user.user_id))]
pub async fn delete_retro(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(retro_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let retro = find_retro(&state, retro_id).await?;
    check_owner(&current_user, retro.created_by)?;
    state.retro.delete(&retro_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- items ----

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(retro_id): Path<i64>,
    Json(body): Json<CreateRetroItemDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let retro = find_retro(&state, retro_id).await?;
    if !retro.categories.0.iter().any(|c| c.id == body.category_id) {
        return Err(AppError::bad_request("Unknown category for this retro"));
    }

    let item = state
        .retro
        .create_item(retro_id, current_user.user_id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Path(retro_id): Path<i64>,
) -> Result<Json<Vec<RetroItem>>, AppError> {
    find_retro(&state, retro_id).await?;
    Ok(Json(state.retro.find_items(retro_id).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(item_id): Path<i64>,
    Json(body): Json<UpdateRetroItemDTO>,
) -> Result<Json<RetroItem>, AppError> {
    body.validate()?;
    let item = find_item(&state, item_id).await?;
    check_owner(&current_user, item.author_id)?;
    Ok(Json(state.retro.update_item(item_id, &body).await?))
}

#[instrument(skip(state, current_user), fields(user_id = current_user.user_id))]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let item = find_item(&state, item_id).await?;
    check_owner(&current_user, item.author_id)?;
    state.retro.delete_item(item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
) -> Result<Json<RetroItem>, AppError> {
    Ok(Json(state.retro.vote(item_id, 1).await?))
}

pub async fn unvote_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
) -> Result<Json<RetroItem>, AppError> {
    Ok(Json(state.retro.vote(item_id, -1).await?))
}

// ---- action items ----

pub async fn add_action(
    State(state): State<Arc<AppState>>,
    Path(retro_id): Path<i64>,
    Json(body): Json<CreateActionItemDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    find_retro(&state, retro_id).await?;
    let action = state.retro.create_action(retro_id, &body).await?;
    Ok((StatusCode::CREATED, Json(action)))
}

pub async fn list_actions(
    State(state): State<Arc<AppState>>,
    Path(retro_id): Path<i64>,
) -> Result<Json<Vec<ActionItem>>, AppError> {
    find_retro(&state, retro_id).await?;
    Ok(Json(state.retro.find_actions(retro_id).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn update_action(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(action_id): Path<i64>,
    Json(body): Json<UpdateActionItemDTO>,
) -> Result<Json<ActionItem>, AppError> {
    body.validate()?;
    managed_action_retro(&state, &current_user, action_id).await?;
    Ok(Json(state.retro.update_action(action_id, &body).await?))
}

#[instrument(skip(state, current_user), fields(user_id = current_user.user_id))]
pub async fn delete_action(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(action_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    managed_action_retro(&state, &current_user, action_id).await?;
    if !state.retro.delete_action(action_id).await? {
        return Err(AppError::not_found("Action item not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
