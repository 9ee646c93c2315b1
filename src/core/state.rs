//! Application state shared by every route, middleware and socket task

use crate::burndown::BurndownCache;
use crate::collab::DocumentSessions;
use crate::repositories::{
    ChatRepository, DocumentRepository, ForumRepository, ResourceRepository, RetroRepository,
    RetroTemplateRepository, SprintRepository, TaskRepository, UserRepository,
};
use crate::ws::roommap::RoomMap;
use crate::ws::usermap::UserMap;
use sqlx::SqlitePool;

pub struct AppState {
    pub user: UserRepository,
    pub sprint: SprintRepository,
    pub task: TaskRepository,
    pub retro: RetroRepository,
    pub retro_template: RetroTemplateRepository,
    pub forum: ForumRepository,
    pub resource: ResourceRepository,
    pub chat: ChatRepository,
    pub document: DocumentRepository,

    /// Secret key for JWT signing
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,

    /// Connected users and the channel feeding their socket writer
    pub users_online: UserMap,

    /// Broadcast channel of every room with at least one listener
    pub rooms: RoomMap,

    pub burndown: BurndownCache,

    /// Documents currently being edited
    pub documents: DocumentSessions,
}

impl AppState {
    /// Builds every repository on top of the shared pool.
    pub fn new(pool: SqlitePool, jwt_secret: String, jwt_expiry_hours: i64) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            sprint: SprintRepository::new(pool.clone()),
            task: TaskRepository::new(pool.clone()),
            retro: RetroRepository::new(pool.clone()),
            retro_template: RetroTemplateRepository::new(pool.clone()),
            forum: ForumRepository::new(pool.clone()),
            resource: ResourceRepository::new(pool.clone()),
            chat: ChatRepository::new(pool.clone()),
            document: DocumentRepository::new(pool),
            jwt_secret,
            jwt_expiry_hours,
            users_online: UserMap::new(),
            rooms: RoomMap::new(),
            burndown: BurndownCache::new(),
            documents: DocumentSessions::new(),
        }
    }
}
