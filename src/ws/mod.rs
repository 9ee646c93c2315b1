//! WebSocket module - real-time rooms, notifications and collaborative edits
//!
//! Every socket gets a reader task (`listen_ws`) and a writer task
//! (`write_ws`) joined by an unbounded channel of `InternalSignal`s.
//! Rooms are tokio broadcast channels kept in `RoomMap`; the writer
//! multiplexes the rooms it joined with a `StreamMap`.

pub mod connection;
pub mod event_handlers;
pub mod roommap;
pub mod usermap;
pub mod utils;

pub use connection::handle_socket;
pub use event_handlers::process_event;
pub use utils::{announce_room, broadcast_to_room, notify_user};

use crate::{core::AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

pub const BROADCAST_CHANNEL_CAPACITY: usize = 100;
/// Writer flush period, in milliseconds
pub const BATCH_INTERVAL: u64 = 100;
pub const BATCH_MAX_SIZE: usize = 10;
/// Minimum gap between two frames read from a client
pub const RATE_LIMITER_MILLIS: u64 = 10;
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;

/// Upgrades an authenticated request to a WebSocket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, current_user))
}
