//! Collaborative documents over HTTP
//!
//! Reads and edits go through `DocumentSessions`, so a document being edited
//! is served from memory and written back in batches. Every applied
//! operation is relayed to the document's room.

use crate::collab::{OperationOutcome, TextOperation};
use crate::core::{AppError, AppState};
use crate::dtos::{
    ActiveUserDTO, CollaboratorRoleDTO, CreateDocumentDTO, DocumentDTO, Outbound, ServerEvent,
};
use crate::entities::{Collaborator, Document, User};
use crate::repositories::Read;
use crate::services::chat::room_members;
use crate::ws::{broadcast_to_room, notify_user, roommap::document_room};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Loads the stored document and checks that `user` owns it
async fn owned_document(
    state: &AppState,
    user: &User,
    document_id: i64,
) -> Result<Document, AppError> {
    let document = state
        .document
        .read(&document_id)
        .await?
        .ok_or_else(|| AppError::not_found("Document not found"))?;
    if document.owner_id != user.user_id {
        warn!(document_id, "Collaborator change by non-owner");
        return Err(AppError::forbidden("Only the owner can manage collaborators"));
    }
    Ok(document)
}

async fn refresh_collaborators(state: &AppState, document_id: i64) -> Result<(), AppError> {
    let collaborators = state.document.find_collaborators(document_id).await?;
    state
        .documents
        .set_collaborators(document_id, collaborators)
        .await;
    Ok(())
}

#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateDocumentDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let document = state.document.create(current_user.user_id, &body).await?;
    info!(document_id = document.document_id, "Document created");
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(document_id): Path<i64>,
) -> Result<Json<DocumentDTO>, AppError> {
    let (document, collaborators) = state
        .documents
        .snapshot(&state.document, document_id, current_user.user_id)
        .await?;
    Ok(Json(DocumentDTO {
        document,
        collaborators,
    }))
}

#[debug_handler]
#[instrument(skip(state, current_user, operation), fields(user_id = current_user.user_id))]
pub async fn apply_operation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(document_id): Path<i64>,
    Json(operation): Json<TextOperation>,
) -> Result<Json<OperationOutcome>, AppError> {
    let outcome = state
        .documents
        .apply(
            &state.document,
            document_id,
            current_user.user_id,
            operation.clone(),
        )
        .await?;

    let event = ServerEvent::Operation {
        document_id,
        user_id: current_user.user_id,
        version: outcome.version,
        operation,
    };
    let sent = broadcast_to_room(
        &state,
        &document_room(document_id),
        Outbound::except(current_user.user_id, event),
    );
    debug!(version = outcome.version, sent, "Operation applied");
    Ok(Json(outcome))
}

#[instrument(skip(state, current_user), fields(user_id = current_user.user_id))]
pub async fn save_document(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(document_id): Path<i64>,
) -> Result<Json<Document>, AppError> {
    let document = state
        .documents
        .save(&state.document, document_id, current_user.user_id)
        .await?;
    info!(version = document.version, "Document saved");
    Ok(Json(document))
}

/// Adds a collaborator, or changes the role of an existing one
#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = current_user.user_id))]
pub async fn put_collaborator(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path((document_id, user_id)): Path<(i64, i64)>,
    Json(body): Json<CollaboratorRoleDTO>,
) -> Result<Json<Collaborator>, AppError> {
    let document = owned_document(&state, &current_user, document_id).await?;
    if user_id == document.owner_id {
        return Err(AppError::bad_request("The owner is not a collaborator"));
    }
    if state.user.read(&user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    let collaborator = state
        .document
        .upsert_collaborator(document_id, user_id, body.role)
        .await?;
    refresh_collaborators(&state, document_id).await?;

    broadcast_to_room(
        &state,
        &document_room(document_id),
        Outbound::to_all(ServerEvent::CollaboratorAdded {
            document_id,
            user_id,
            role: collaborator.role,
        }),
    );
    notify_user(
        &state,
        user_id,
        ServerEvent::notification(
            "collaborator-added",
            format!(
                "{} shared \"{}\" with you",
                current_user.username, document.title
            ),
            Some(format!("/documents/{}", document_id)),
        ),
    );
    info!(collaborator_id = user_id, "Collaborator set");
    Ok(Json(collaborator))
}

#[instrument(skip(state, current_user), fields(user_id = current_user.user_id))]
pub async fn remove_collaborator(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path((document_id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    owned_document(&state, &current_user, document_id).await?;
    if !state.document.remove_collaborator(document_id, user_id).await? {
        return Err(AppError::not_found("Collaborator not found"));
    }
    refresh_collaborators(&state, document_id).await?;

    broadcast_to_room(
        &state,
        &document_room(document_id),
        Outbound::to_all(ServerEvent::CollaboratorRemoved {
            document_id,
            user_id,
        }),
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Users with the document open in a socket
pub async fn document_active_users(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(document_id): Path<i64>,
) -> Result<Json<Vec<ActiveUserDTO>>, AppError> {
    state
        .documents
        .snapshot(&state.document, document_id, current_user.user_id)
        .await?;
    Ok(Json(
        room_members(&state, &document_room(document_id)).await?,
    ))
}
