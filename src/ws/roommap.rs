use crate::dtos::Outbound;
use crate::ws::BROADCAST_CHANNEL_CAPACITY;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::{Receiver, Sender};
use tracing::{debug, info, instrument};

pub fn retro_room(retro_id: i64) -> String {
    format!("retro:{}", retro_id)
}

pub fn sprint_room(sprint_id: i64) -> String {
    format!("sprint:{}", sprint_id)
}

pub fn document_room(document_id: i64) -> String {
    format!("doc:{}", document_id)
}

/// Document id of a `doc:{id}` room
pub fn document_id_of(room: &str) -> Option<i64> {
    room.strip_prefix("doc:")?.parse().ok()
}

/// `retro`, `sprint`, `doc`, or `chat` for free-form room names
pub fn room_type(room: &str) -> &str {
    match room.split_once(':') {
        Some((kind @ ("retro" | "sprint" | "doc"), _)) => kind,
        _ => "chat",
    }
}

pub struct RoomMap {
    /// Sending half of each room's broadcast channel, by room name
    channels: DashMap<String, Sender<Arc<Outbound>>>,
    /// Users in each room with their number of open subscriptions
    members: DashMap<String, HashMap<i64, usize>>,
}

impl RoomMap {
    pub fn new() -> Self {
        RoomMap {
            channels: DashMap::new(),
            members: DashMap::new(),
        }
    }

    #[instrument(skip(self))]
    pub fn join(&self, room: &str, user_id: i64) -> Receiver<Arc<Outbound>> {
        // entry() holds the shard lock, so two first subscribers share one channel
        let rx = self
            .channels
            .entry(room.to_string())
            .or_insert_with(|| {
                info!("Creating new broadcast channel for room");
                broadcast::channel::<Arc<Outbound>>(BROADCAST_CHANNEL_CAPACITY).0
            })
            .subscribe();
        *self
            .members
            .entry(room.to_string())
            .or_default()
            .entry(user_id)
            .or_insert(0) += 1;
        rx
    }

    /// Call after the receiver obtained from `join` has been dropped
    #[instrument(skip(self))]
    pub fn leave(&self, room: &str, user_id: i64) {
        if let Some(mut users) = self.members.get_mut(room) {
            if let Some(count) = users.get_mut(&user_id) {
                *count -= 1;
                if *count == 0 {
                    users.remove(&user_id);
                }
            }
        }
        self.members.remove_if(room, |_, users| users.is_empty());
        self.prune(room);
    }

    /// Returns how many subscribers got the event
    #[instrument(skip(self, outbound))]
    pub fn send(&self, room: &str, outbound: Arc<Outbound>) -> usize {
        match self.channels.get(room) {
            Some(channel) => channel.send(outbound).unwrap_or(0),
            None => {
                debug!("No channel for room, event dropped");
                0
            }
        }
    }

    /// Distinct users currently in the room
    pub fn user_count(&self, room: &str) -> usize {
        self.members.get(room).map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_member(&self, room: &str, user_id: i64) -> bool {
        self.members
            .get(room)
            .is_some_and(|users| users.contains_key(&user_id))
    }

    pub fn members(&self, room: &str) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .members
            .get(room)
            .map(|users| users.keys().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Drops the channel of a room nobody listens to
    fn prune(&self, room: &str) {
        if self
            .channels
            .remove_if(room, |_, channel| channel.receiver_count() == 0)
            .is_some()
        {
            debug!(room, "Removed empty room");
        }
    }

    pub fn room_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for RoomMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_types_follow_prefix() {
        assert_eq!(room_type(&retro_room(3)), "retro");
        assert_eq!(room_type(&sprint_room(3)), "sprint");
        assert_eq!(room_type(&document_room(3)), "doc");
        assert_eq!(room_type("general"), "chat");
        assert_eq!(room_type("team:backend"), "chat");
    }

    #[test]
    fn members_are_counted_once_per_user() {
        let rooms = RoomMap::new();
        let a1 = rooms.join("retro:1", 1);
        let a2 = rooms.join("retro:1", 1);
        let b = rooms.join("retro:1", 2);
        assert_eq!(rooms.user_count("retro:1"), 2);
        assert_eq!(rooms.members("retro:1"), vec![1, 2]);

        drop(a1);
        rooms.leave("retro:1", 1);
        assert_eq!(rooms.user_count("retro:1"), 2);

        drop(a2);
        rooms.leave("retro:1", 1);
        drop(b);
        rooms.leave("retro:1", 2);
        assert_eq!(rooms.user_count("retro:1"), 0);
        assert_eq!(rooms.room_count(), 0);
    }
}
