//! Helpers to push events to rooms and users from anywhere in the server

use crate::core::{AppError, AppState};
use crate::dtos::{Outbound, ServerEvent};
use crate::ws::roommap::room_type;
use crate::ws::usermap::InternalSignal;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Sends `outbound` to everyone subscribed to `room`
pub fn broadcast_to_room(state: &AppState, room: &str, outbound: Outbound) -> usize {
    let sent = state.rooms.send(room, Arc::new(outbound));
    debug!(room, receivers = sent, "Event broadcast to room");
    sent
}

/// Tells a room how many users it holds now
pub fn announce_room(state: &AppState, room: &str) {
    let event = ServerEvent::RoomUpdate {
        room_type: room_type(room).to_string(),
        room_id: room.to_string(),
        user_count: state.rooms.user_count(room),
        timestamp: Utc::now(),
    };
    broadcast_to_room(state, room, Outbound::to_all(event));
}

/// Delivers an event to a single user if they have a socket open
pub fn notify_user(state: &AppState, user_id: i64, event: ServerEvent) -> bool {
    state
        .users_online
        .send_server_message_if_online(user_id, InternalSignal::event(event))
}

/// Reports a failed client event back to its connection only
pub fn send_error(internal_tx: &UnboundedSender<InternalSignal>, err: &AppError) {
    let event = ServerEvent::Error {
        code: err.status().as_u16(),
        message: err.message().to_string(),
    };
    if internal_tx.send(InternalSignal::event(event)).is_err() {
        debug!("Connection closed before the error could be reported");
    }
}
