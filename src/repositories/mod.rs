//! Repositories module - database access for every entity
//!
//! Each repository owns a clone of the SQLite pool and exposes the generic
//! CRUD traits plus its own queries.
//!
//! Queries are checked at runtime (`sqlx::query_as::<_, T>` with
//! `#[derive(FromRow)]`), so the crate builds without a live database.
//! Every method propagates `sqlx::Error` with `?`; services map it to an
//! HTTP status through `AppError`.

pub mod chat;
pub mod document;
pub mod forum;
pub mod resource;
pub mod retro;
pub mod retro_template;
pub mod sprint;
pub mod task;
pub mod traits;
pub mod user;

// Re-export traits
pub use traits::{Create, Delete, Read, ReadMany, Update};

// Re-export repositories
pub use chat::ChatRepository;
pub use document::DocumentRepository;
pub use forum::ForumRepository;
pub use resource::ResourceRepository;
pub use retro::RetroRepository;
pub use retro_template::RetroTemplateRepository;
pub use sprint::SprintRepository;
pub use task::TaskRepository;
pub use user::UserRepository;
