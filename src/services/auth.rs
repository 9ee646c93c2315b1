//! Auth services - registration, login and the current user's account

use crate::core::{AppError, AppState, auth::TOKEN_COOKIE, encode_jwt};
use crate::dtos::{
    AuthResponseDTO, ChangePasswordDTO, CreateUserDTO, LoginDTO, MessageResponseDTO,
    UpdateProfileDTO, UserDTO,
};
use crate::entities::User;
use crate::repositories::Create;
use axum::{
    Extension,
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// `Authorization` and `Set-Cookie` headers carrying a fresh token
fn token_headers(token: &str, lifetime_hours: i64) -> Result<HeaderMap, AppError> {
    let cookie_value = format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        TOKEN_COOKIE,
        token,
        lifetime_hours * 60 * 60
    );
    let invalid = |_| AppError::internal_server_error("Failed to build auth headers");

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie_value).map_err(invalid)?);
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(invalid)?,
    );
    Ok(headers)
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    Ok(encode_jwt(
        user.username.clone(),
        user.user_id,
        &state.jwt_secret,
        state.jwt_expiry_hours,
    )?)
}

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    if state.user.find_by_username(&body.username).await?.is_some() {
        warn!("Username already taken");
        return Err(AppError::conflict("Username already exists"));
    }
    if state.user.find_by_email(&body.email).await?.is_some() {
        warn!("Email already registered");
        return Err(AppError::conflict("Email already registered"));
    }

    let new_user = CreateUserDTO {
        password: User::hash_password(&body.password)?,
        ..body
    };
    let created = state.user.create(&new_user).await?;
    info!(user_id = created.user_id, "User registered");

    let token = issue_token(&state, &created)?;
    let headers = token_headers(&token, state.jwt_expiry_hours)?;
    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponseDTO {
            token,
            user: UserDTO::from(created),
        }),
    ))
}

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>,
) -> Result<impl IntoResponse, AppError> {
    let user = match state.user.find_by_email(&body.email).await? {
        // soft-deleted accounts have an empty password
        Some(user) if !user.password.is_empty() => user,
        _ => {
            warn!("Login attempt for unknown email");
            return Err(AppError::unauthorized("Invalid email or password"));
        }
    };

    if !user.verify_password(&body.password) {
        warn!(user_id = user.user_id, "Wrong password");
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    state.user.touch_last_login(user.user_id).await?;
    let token = issue_token(&state, &user)?;
    let headers = token_headers(&token, state.jwt_expiry_hours)?;
    info!(user_id = user.user_id, "User logged in");

    Ok((
        StatusCode::OK,
        headers,
        Json(AuthResponseDTO {
            token,
            user: UserDTO::from(user),
        }),
    ))
}

pub async fn get_me(Extension(current_user): Extension<User>) -> Json<UserDTO> {
    Json(UserDTO::from(current_user))
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateProfileDTO>,
) -> Result<Json<UserDTO>, AppError> {
    body.validate()?;
    let updated = state.user.update_profile(current_user.user_id, &body).await?;
    debug!("Profile updated");
    Ok(Json(UserDTO::from(updated)))
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<ChangePasswordDTO>,
) -> Result<Json<MessageResponseDTO>, AppError> {
    body.validate()?;

    if !current_user.verify_password(&body.current_password) {
        warn!("Wrong current password");
        return Err(AppError::bad_request("Current password is incorrect"));
    }

    let hash = User::hash_password(&body.new_password)?;
    state.user.update_password(current_user.user_id, &hash).await?;
    info!("Password changed");

    Ok(Json(MessageResponseDTO {
        message: "Password updated successfully".to_string(),
    }))
}
