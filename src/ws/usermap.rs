use crate::dtos::{Outbound, ServerEvent};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Messages from the rest of the server to a connection's writer task
pub enum InternalSignal {
    Shutdown,
    /// Start forwarding a room; the receiver is created by the caller so
    /// the room's user count already includes this connection.
    JoinRoom(String, Receiver<Arc<Outbound>>),
    LeaveRoom(String),
    Event(Arc<Outbound>),
}

impl InternalSignal {
    pub fn event(event: ServerEvent) -> Self {
        InternalSignal::Event(Arc::new(Outbound::to_all(event)))
    }
}

pub struct UserMap {
    users_online: DashMap<i64, UnboundedSender<InternalSignal>>,
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users_online: DashMap::new(),
        }
    }

    /// A second connection of the same user replaces the first one
    #[instrument(skip(self, tx))]
    pub fn register_online(&self, user_id: i64, tx: UnboundedSender<InternalSignal>) {
        info!("Registering user {} as online", user_id);
        self.users_online.insert(user_id, tx);
        debug!("Total online users: {}", self.users_online.len());
    }

    /// Removes the user only if `tx` is still their current connection
    #[instrument(skip(self, tx))]
    pub fn remove_from_online(&self, user_id: i64, tx: &UnboundedSender<InternalSignal>) {
        if self
            .users_online
            .remove_if(&user_id, |_, current| current.same_channel(tx))
            .is_some()
        {
            info!("Removed user from online");
        }
    }

    #[instrument(skip(self, message))]
    pub fn send_server_message_if_online(&self, user_id: i64, message: InternalSignal) -> bool {
        match self.users_online.get(&user_id) {
            Some(entry) => {
                if entry.value().send(message).is_err() {
                    warn!("Writer of user {} is gone, message dropped", user_id);
                    false
                } else {
                    true
                }
            }
            None => {
                debug!("User {} not online, message not sent", user_id);
                false
            }
        }
    }

    pub fn online_count(&self) -> usize {
        self.users_online.len()
    }

    pub fn is_user_online(&self, user_id: i64) -> bool {
        self.users_online.contains_key(&user_id)
    }

    pub fn online_user_ids(&self) -> Vec<i64> {
        self.users_online.iter().map(|entry| *entry.key()).collect()
    }
}

impl Default for UserMap {
    fn default() -> Self {
        Self::new()
    }
}
