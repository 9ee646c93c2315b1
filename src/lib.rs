//! Scrumboard server library - exposes the modules for the binary and the tests

pub mod burndown;
pub mod collab;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod ws;

pub use core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{any, delete, get, patch, post, put},
};
use std::sync::Arc;

/// Builds the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    use core::authentication_middleware;

    let protected = Router::new()
        .nest("/api/auth", configure_account_routes())
        .nest("/api/users", configure_user_routes())
        .nest("/api/sprints", configure_sprint_routes())
        .nest("/api/tasks", configure_task_routes())
        .route("/api/boards/{sprint_id}", get(services::get_board))
        .nest("/api/burndown", configure_burndown_routes())
        .nest("/api/retros", configure_retro_routes())
        .nest("/api/retro-templates", configure_template_routes())
        .nest("/api/forum", configure_forum_routes())
        .nest("/api/resources", configure_resource_routes())
        .nest("/api/chat", configure_chat_routes())
        .nest("/api/documents", configure_document_routes())
        .route(
            "/api/export/retro/{retro_id}/{format}",
            get(services::export_retro),
        )
        .route("/ws", any(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    Router::new()
        .route("/", get(services::root))
        .merge(configure_auth_routes())
        .merge(protected)
        .with_state(state)
}

/// Login and registration, reachable without a token
fn configure_auth_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/api/auth/login", post(login_user))
        .route("/api/auth/register", post(register_user))
}

fn configure_account_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/me", get(get_me))
        .route("/profile", put(update_profile))
        .route("/change-password", put(change_password))
}

fn configure_user_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/", get(search_users))
        .route("/me", delete(delete_my_account))
        .route("/{user_id}", get(get_user_by_id))
        .route("/{user_id}/role", put(update_user_role))
}

fn configure_sprint_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/", get(list_sprints).post(create_sprint))
        .route(
            "/{sprint_id}",
            get(get_sprint).put(update_sprint).delete(delete_sprint),
        )
}

fn configure_task_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route(
            "/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/{task_id}/status", patch(update_task_status))
}

fn configure_burndown_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/sprint/{sprint_id}", get(get_sprint_burndown))
        .route(
            "/sprint/{sprint_id}/task/{task_id}",
            post(refresh_after_task),
        )
}

fn configure_retro_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/", post(create_retro))
        .route("/sprint/{sprint_id}", get(list_sprint_retros))
        .route("/{retro_id}", get(get_retro).delete(delete_retro))
        .route("/{retro_id}/status", patch(update_retro_status))
        .route("/{retro_id}/items", get(list_items).post(add_item))
        .route("/{retro_id}/actions", get(list_actions).post(add_action))
        .route("/items/{item_id}", put(update_item).delete(delete_item))
        .route("/items/{item_id}/vote", post(vote_item).delete(unvote_item))
        .route(
            "/actions/{action_id}",
            patch(update_action).delete(delete_action),
        )
}

fn configure_template_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route(
            "/{template_id}",
            get(get_template)
                .put(update_template)
                .delete(delete_template),
        )
}

fn configure_forum_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{category_id}", get(get_category))
        .route(
            "/categories/{category_id}/threads",
            get(list_category_threads),
        )
        .route("/threads", post(create_thread))
        .route(
            "/threads/{thread_id}",
            get(get_thread).put(update_thread).delete(delete_thread),
        )
        .route(
            "/threads/{thread_id}/replies",
            get(list_replies).post(create_reply),
        )
        .route("/replies/{reply_id}", put(update_reply).delete(delete_reply))
        .route("/search", get(search_threads))
}

fn configure_resource_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/", get(list_resources).post(create_resource))
        .route("/search/tags", get(search_by_tags))
        .route("/category/{category}", get(list_by_category))
        .route("/difficulty/{level}", get(list_by_difficulty))
        .route(
            "/{resource_id}",
            get(get_resource)
                .put(update_resource)
                .delete(delete_resource),
        )
}

fn configure_chat_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route(
            "/messages/{message_id}",
            put(update_message).delete(delete_message),
        )
        .route(
            "/{room_id}/messages",
            get(list_messages).post(post_message),
        )
        .route("/{room_id}/search", get(search_messages))
        .route("/{room_id}/active-users", get(active_users))
}

fn configure_document_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/", post(create_document))
        .route("/{document_id}", get(get_document))
        .route("/{document_id}/operations", post(apply_operation))
        .route("/{document_id}/save", post(save_document))
        .route(
            "/{document_id}/collaborators/{user_id}",
            put(put_collaborator).delete(remove_collaborator),
        )
        .route("/{document_id}/active-users", get(document_active_users))
}
