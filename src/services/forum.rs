//! Forum services - categories, threads, replies and search

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{
    CreateCategoryDTO, CreateReplyDTO, CreateThreadDTO, DEFAULT_PAGE_SIZE, Paginated, SearchQuery,
    ServerEvent, ThreadDetailsDTO, ThreadListQuery, UpdateReplyDTO, UpdateThreadDTO,
};
use crate::entities::{ForumCategory, ForumReply, ForumThread, User, UserRole};
use crate::repositories::Create;
use crate::ws::notify_user;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

async fn find_thread(state: &AppState, thread_id: i64) -> Result<ForumThread, AppError> {
    state
        .forum
        .read_thread(thread_id)
        .await?
        .ok_or_else(|| AppError::not_found("Thread not found"))
}

async fn find_reply(state: &AppState, reply_id: i64) -> Result<ForumReply, AppError> {
    state
        .forum
        .read_reply(reply_id)
        .await?
        .ok_or_else(|| AppError::not_found("Reply not found"))
}

fn check_author(user: &User, author_id: i64) -> Result<(), AppError> {
    if user.user_id == author_id || user.has_role(UserRole::Moderator) {
        Ok(())
    } else {
        warn!(user_id = user.user_id, author_id, "Not the author");
        Err(AppError::forbidden("Only the author or a moderator can do this"))
    }
}

// ---- categories ----

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ForumCategory>>, AppError> {
    Ok(Json(state.forum.find_categories().await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateCategoryDTO>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&current_user, UserRole::Moderator)?;
    body.validate()?;
    let category = state.forum.create(&body).await?;
    info!(category_id = category.category_id, "Forum category created");
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
) -> Result<Json<ForumCategory>, AppError> {
    state
        .forum
        .read_category(category_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Category not found"))
}

#[instrument(skip(state))]
pub async fn list_category_threads(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
    Query(params): Query<ThreadListQuery>,
) -> Result<Json<Paginated<ForumThread>>, AppError> {
    if state.forum.read_category(category_id).await?.is_none() {
        return Err(AppError::not_found("Category not found"));
    }
    let window = params.page_query().window(DEFAULT_PAGE_SIZE);
    let total = state.forum.count_threads(category_id).await?;
    let threads = state
        .forum
        .find_threads(category_id, params.sort, window)
        .await?;
    Ok(Json(Paginated::new(threads, total, window)))
}

// ---- threads ----

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateThreadDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    if state.forum.read_category(body.category_id).await?.is_none() {
        return Err(AppError::not_found("Category not found"));
    }
    let thread = state.forum.create_thread(current_user.user_id, &body).await?;
    info!(thread_id = thread.thread_id, "Thread created");
    Ok((StatusCode::CREATED, Json(thread)))
}

/// Counts a view on every read
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<i64>,
) -> Result<Json<ThreadDetailsDTO>, AppError> {
    let thread = state
        .forum
        .view_thread(thread_id)
        .await?
        .ok_or_else(|| AppError::not_found("Thread not found"))?;
    let replies = state.forum.find_replies(thread_id).await?;
    Ok(Json(ThreadDetailsDTO { thread, replies }))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(thread_id): Path<i64>,
    Json(body): Json<UpdateThreadDTO>,
) -> Result<Json<ForumThread>, AppError> {
    body.validate()?;
    let thread = find_thread(&state, thread_id).await?;
    check_author(&current_user, thread.author_id)?;
    if body.is_sticky.is_some() || body.is_locked.is_some() {
        require_role(&current_user, UserRole::Moderator)?;
    }
    Ok(Json(state.forum.update_thread(thread_id, &body).await?))
}

#[instrument(skip(state, current_user), fields(user_id = current_user.user_id))]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(thread_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let thread = find_thread(&state, thread_id).await?;
    check_author(&current_user, thread.author_id)?;
    state.forum.delete_thread(thread_id).await?;
    info!("Thread deleted with its replies");
    Ok(StatusCode::NO_CONTENT)
}

// ---- replies ----

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn create_reply(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(thread_id): Path<i64>,
    Json(body): Json<CreateReplyDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let thread = find_thread(&state, thread_id).await?;
    if thread.is_locked {
        return Err(AppError::forbidden("Thread is locked"));
    }

    let reply = state
        .forum
        .create_reply(thread_id, current_user.user_id, &body)
        .await?;

    if thread.author_id != current_user.user_id {
        let delivered = notify_user(
            &state,
            thread.author_id,
            ServerEvent::notification(
                "forum-reply",
                format!("{} replied to \"{}\"", current_user.username, thread.title),
                Some(format!("/forum/threads/{}", thread_id)),
            ),
        );
        debug!(delivered, "Reply notification");
    }
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn list_replies(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<i64>,
) -> Result<Json<Vec<ForumReply>>, AppError> {
    find_thread(&state, thread_id).await?;
    Ok(Json(state.forum.find_replies(thread_id).await?))
}

/// Content belongs to the reply's author; acceptance to the thread's author
#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn update_reply(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(reply_id): Path<i64>,
    Json(body): Json<UpdateReplyDTO>,
) -> Result<Json<ForumReply>, AppError> {
    body.validate()?;
    let reply = find_reply(&state, reply_id).await?;
    if body.content.is_some() {
        check_author(&current_user, reply.author_id)?;
    }
    if body.is_accepted.is_some() {
        let thread = find_thread(&state, reply.thread_id).await?;
        check_author(&current_user, thread.author_id)?;
    }
    Ok(Json(state.forum.update_reply(reply_id, &body).await?))
}

#[instrument(skip(state, current_user), fields(user_id = current_user.user_id))]
pub async fn delete_reply(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(reply_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let reply = find_reply(&state, reply_id).await?;
    check_author(&current_user, reply.author_id)?;
    state.forum.delete_reply(&reply).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state), fields(q = %params.q))]
pub async fn search_threads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Paginated<ForumThread>>, AppError> {
    let term = params.q.trim();
    if term.is_empty() {
        return Err(AppError::bad_request("Search query is required"));
    }
    let window = params.page_query().window(DEFAULT_PAGE_SIZE);
    let total = state.forum.count_search(term).await?;
    let threads = state.forum.search_threads(term, window).await?;
    Ok(Json(Paginated::new(threads, total, window)))
}
