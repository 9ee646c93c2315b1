//! Dispatch of events received from a client socket

use crate::core::{AppError, AppState};
use crate::dtos::{ChatMessageDTO, ClientEvent, Outbound, ServerEvent};
use crate::entities::{ChatMessageType, User};
use crate::repositories::Read;
use crate::ws::roommap::{document_id_of, document_room, retro_room, room_type, sprint_room};
use crate::ws::usermap::InternalSignal;
use crate::ws::utils::{announce_room, broadcast_to_room, send_error};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument, warn};

const MAX_CHAT_MESSAGE_CHARS: usize = 5000;

/// Handles one client event. Failures are reported to this connection as
/// an `error` event and never close the socket.
#[instrument(skip(state, user, internal_tx), fields(user_id = user.user_id))]
pub async fn process_event(
    state: &AppState,
    user: &User,
    internal_tx: &UnboundedSender<InternalSignal>,
    event: ClientEvent,
) {
    let result = match event {
        ClientEvent::JoinRetro(retro_id) => {
            match state.retro.read(&retro_id).await {
                Ok(Some(_)) => join_room(state, user.user_id, internal_tx, retro_room(retro_id)),
                Ok(None) => Err(AppError::not_found("Retro not found")),
                Err(e) => Err(e.into()),
            }
        }
        ClientEvent::JoinSprint(sprint_id) => {
            match state.sprint.read(&sprint_id).await {
                Ok(Some(_)) => join_room(state, user.user_id, internal_tx, sprint_room(sprint_id)),
                Ok(None) => Err(AppError::not_found("Sprint not found")),
                Err(e) => Err(e.into()),
            }
        }
        ClientEvent::JoinDocument(document_id) => {
            match state
                .documents
                .snapshot(&state.document, document_id, user.user_id)
                .await
            {
                Ok(_) => join_room(state, user.user_id, internal_tx, document_room(document_id)),
                Err(e) => Err(e.into()),
            }
        }
        ClientEvent::LeaveRoom(room) => internal_tx
            .send(InternalSignal::LeaveRoom(room))
            .map_err(|_| AppError::internal_server_error("Connection closed")),
        ClientEvent::ChatMessage { room_id, message } => {
            chat_message(state, user, room_id, message).await
        }
        ClientEvent::EditContent {
            room_id,
            content,
            position,
        } => edit_content(state, user, room_id, content, position).await,
    };

    if let Err(err) = result {
        warn!("Client event failed: {:?}", err);
        send_error(internal_tx, &err);
    }
}

/// Subscribes this connection to `room` and tells the room about it
fn join_room(
    state: &AppState,
    user_id: i64,
    internal_tx: &UnboundedSender<InternalSignal>,
    room: String,
) -> Result<(), AppError> {
    let rx = state.rooms.join(&room, user_id);
    if internal_tx
        .send(InternalSignal::JoinRoom(room.clone(), rx))
        .is_err()
    {
        state.rooms.leave(&room, user_id);
        return Err(AppError::internal_server_error("Connection closed"));
    }
    debug!(room = %room, "Joined room");
    announce_room(state, &room);
    Ok(())
}

/// Only users subscribed to a room may publish to it
fn ensure_member(state: &AppState, user_id: i64, room: &str) -> Result<(), AppError> {
    if state.rooms.is_member(room, user_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("Join the room before sending to it"))
    }
}

/// Stores the message, then sends it to everyone in the room
async fn chat_message(
    state: &AppState,
    user: &User,
    room_id: String,
    message: String,
) -> Result<(), AppError> {
    ensure_member(state, user.user_id, &room_id)?;
    let length = message.trim().chars().count();
    if length == 0 || length > MAX_CHAT_MESSAGE_CHARS {
        return Err(AppError::bad_request(
            "Message content must be between 1 and 5000 characters",
        ));
    }

    let stored = state
        .chat
        .create(&room_id, user.user_id, &message, ChatMessageType::Text)
        .await?;
    let dto = ChatMessageDTO::from_message(stored, user.username.clone());
    broadcast_to_room(state, &room_id, Outbound::to_all(ServerEvent::ChatMessage(dto)));
    Ok(())
}

/// Relays a live edit to the other members of the room. In a document room
/// the sender needs edit rights.
async fn edit_content(
    state: &AppState,
    user: &User,
    room_id: String,
    content: String,
    position: i64,
) -> Result<(), AppError> {
    ensure_member(state, user.user_id, &room_id)?;
    if room_type(&room_id) == "doc" {
        let document_id =
            document_id_of(&room_id).ok_or_else(|| AppError::bad_request("Invalid room"))?;
        state
            .documents
            .check_edit(&state.document, document_id, user.user_id)
            .await?;
    }

    let event = ServerEvent::ContentUpdate {
        room_id: room_id.clone(),
        user_id: user.user_id,
        content,
        position,
    };
    broadcast_to_room(state, &room_id, Outbound::except(user.user_id, event));
    Ok(())
}
