//! Entities module - domain records persisted in the database
//!
//! Each entity maps one table and derives `sqlx::FromRow`.

pub mod chat;
pub mod document;
pub mod enums;
pub mod forum;
pub mod resource;
pub mod retro;
pub mod sprint;
pub mod task;
pub mod user;

// Re-exports
pub use chat::ChatMessage;
pub use document::{Collaborator, Document, DocumentAccess};
pub use enums::{
    ChatMessageType, CollaboratorRole, DocumentType, RetroStatus, SprintStatus, TaskPriority,
    TaskStatus, UserRole,
};
pub use forum::{ForumCategory, ForumReply, ForumThread};
pub use resource::Resource;
pub use retro::{ActionItem, Retro, RetroCategory, RetroItem, RetroTemplate};
pub use sprint::Sprint;
pub use task::Task;
pub use user::User;
