//! Chat services - room history over HTTP; live delivery goes through the room channels

use crate::core::{AppError, AppState};
use crate::dtos::{
    ActiveUserDTO, ChatMessageDTO, CreateChatMessageDTO, Outbound, PageQuery, Paginated,
    SearchQuery, ServerEvent, UpdateChatMessageDTO,
};
use crate::entities::{ChatMessage, ChatMessageType, User};
use crate::repositories::{Delete, Read, ReadMany};
use crate::ws::broadcast_to_room;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use validator::Validate;

/// Chat history pages are larger than the other lists
pub const CHAT_PAGE_SIZE: i64 = 50;

/// Only the sender may change a message, and only a text one
async fn own_text_message(
    state: &AppState,
    user: &User,
    message_id: i64,
) -> Result<ChatMessage, AppError> {
    let message = state
        .chat
        .read(&message_id)
        .await?
        .ok_or_else(|| AppError::not_found("Message not found"))?;
    if message.user_id != user.user_id {
        warn!(message_id, "Message belongs to another user");
        return Err(AppError::forbidden("You can only change your own messages"));
    }
    if message.message_type != ChatMessageType::Text {
        return Err(AppError::forbidden("Only text messages can be changed"));
    }
    Ok(message)
}

#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Paginated<ChatMessage>>, AppError> {
    let window = params.window(CHAT_PAGE_SIZE);
    let total = state.chat.count_in_room(&room_id).await?;
    let messages = state.chat.find_page(&room_id, window).await?;
    Ok(Json(Paginated::new(messages, total, window)))
}

#[instrument(skip(state), fields(q = %params.q))]
pub async fn search_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let term = params.q.trim();
    if term.is_empty() {
        return Err(AppError::bad_request("Search query is required"));
    }
    Ok(Json(state.chat.search(&room_id, term).await?))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(room_id): Path<String>,
    Json(body): Json<CreateChatMessageDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let message_type = body.message_type.unwrap_or(ChatMessageType::Text);
    let message = state
        .chat
        .create(&room_id, current_user.user_id, &body.content, message_type)
        .await?;

    let dto = ChatMessageDTO::from_message(message, current_user.username.clone());
    let sent = broadcast_to_room(
        &state,
        &room_id,
        Outbound::to_all(ServerEvent::ChatMessage(dto.clone())),
    );
    debug!(sent, "Chat message posted");
    Ok((StatusCode::CREATED, Json(dto)))
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn update_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(message_id): Path<i64>,
    Json(body): Json<UpdateChatMessageDTO>,
) -> Result<Json<ChatMessage>, AppError> {
    body.validate()?;
    own_text_message(&state, &current_user, message_id).await?;
    let updated = state.chat.update_content(message_id, &body.content).await?;
    broadcast_to_room(
        &state,
        &updated.room_id,
        Outbound::to_all(ServerEvent::MessageUpdated(updated.clone())),
    );
    Ok(Json(updated))
}

#[instrument(skip(state, current_user), fields(user_id = current_user.user_id))]
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(message_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let message = own_text_message(&state, &current_user, message_id).await?;
    state.chat.delete(&message_id).await?;
    broadcast_to_room(
        &state,
        &message.room_id,
        Outbound::to_all(ServerEvent::MessageDeleted {
            message_id,
            room_id: message.room_id.clone(),
        }),
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Users currently joined to a room through a socket
pub async fn active_users(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<ActiveUserDTO>>, AppError> {
    Ok(Json(room_members(&state, &room_id).await?))
}

pub(crate) async fn room_members(
    state: &AppState,
    room: &str,
) -> Result<Vec<ActiveUserDTO>, AppError> {
    let ids = state.rooms.members(room);
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let users = state.user.read_many(&ids).await?;
    Ok(users
        .into_iter()
        .map(|u| ActiveUserDTO {
            user_id: u.user_id,
            username: u.username,
        })
        .collect())
}
