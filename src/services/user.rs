//! User services - lookup, administration and account removal

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{UpdateRoleDTO, UserDTO, UserSearchQuery};
use crate::entities::{User, UserRole};
use crate::repositories::{Delete, Read};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(state), fields(search = %params.search))]
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    let users = state
        .user
        .search_by_username_prefix(params.search.trim())
        .await?;
    debug!("Found {} users matching search", users.len());
    Ok(Json(users.into_iter().map(UserDTO::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserDTO>, AppError> {
    let user = state.user.read(&user_id).await?.ok_or_else(|| {
        warn!("User not found");
        AppError::not_found("User not found")
    })?;
    Ok(Json(UserDTO::from(user)))
}

#[instrument(skip(state, current_user, body), fields(admin_id = current_user.user_id))]
pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(user_id): Path<i64>,
    Json(body): Json<UpdateRoleDTO>,
) -> Result<Json<UserDTO>, AppError> {
    require_role(&current_user, UserRole::Admin)?;
    let updated = state.user.update_role(user_id, body.role).await?;
    info!(user_id, role = ?body.role, "User role changed");
    Ok(Json(UserDTO::from(updated)))
}

#[instrument(skip(state, current_user), fields(user_id = current_user.user_id))]
pub async fn delete_my_account(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    state.user.delete(&current_user.user_id).await?;
    info!("User account anonymised");
    Ok(StatusCode::NO_CONTENT)
}
