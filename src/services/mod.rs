//! Services module - HTTP handlers grouped by feature
//!
//! Handlers extract what they need, call the repositories through
//! `AppState` and push real-time side effects to the ws layer.

pub mod auth;
pub mod burndown;
pub mod chat;
pub mod document;
pub mod export;
pub mod forum;
pub mod resource;
pub mod retro;
pub mod retro_template;
pub mod sprint;
pub mod task;
pub mod user;

pub use auth::{change_password, get_me, login_user, register_user, update_profile};
pub use burndown::{get_sprint_burndown, refresh_after_task};
pub use chat::{
    active_users, delete_message, list_messages, post_message, search_messages, update_message,
};
pub use document::{
    apply_operation, create_document, document_active_users, get_document, put_collaborator,
    remove_collaborator, save_document,
};
pub use export::export_retro;
pub use forum::{
    create_category, create_reply, create_thread, delete_reply, delete_thread, get_category,
    get_thread, list_categories, list_category_threads, list_replies, search_threads,
    update_reply, update_thread,
};
pub use resource::{
    create_resource, delete_resource, get_resource, list_by_category, list_by_difficulty,
    list_resources, search_by_tags, update_resource,
};
pub use retro::{
    add_action, add_item, create_retro, delete_action, delete_item, delete_retro, get_retro,
    list_actions, list_items, list_sprint_retros, unvote_item, update_action, update_item,
    update_retro_status, vote_item,
};
pub use retro_template::{
    create_template, delete_template, get_template, list_templates, update_template,
};
pub use sprint::{create_sprint, delete_sprint, get_sprint, list_sprints, update_sprint};
pub use task::{
    create_task, delete_task, get_board, get_task, list_tasks, update_task, update_task_status,
};
pub use user::{delete_my_account, get_user_by_id, search_users, update_user_role};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
