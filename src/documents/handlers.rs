use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        CreateDocumentRequest, DeletedResponse, DocumentResponse, SearchQuery, ShareRequest,
        ShareResponse, SharedWith, UpdateDocumentRequest,
    },
    services,
};
use crate::{auth::extractors::CurrentUser, error::AppError, state::AppState};

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/documents", post(create_document).get(list_documents))
        .route("/documents/search", get(search_documents))
        .route("/documents/public/:id", get(get_public_document))
        .route("/documents/:id", put(update_document).delete(delete_document))
        .route("/documents/:id/shares", post(share_document).get(list_shares))
}

#[instrument(skip(state, user, payload))]
pub async fn create_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let created = services::create(state.store.as_ref(), &user, payload.into_fields()).await?;
    Ok(Json(DocumentResponse::with_shares(
        created.document,
        created.shares,
    )))
}

#[instrument(skip(state, user))]
pub async fn list_documents(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let docs = services::list_visible(state.store.as_ref(), &user).await?;
    Ok(Json(docs.into_iter().map(DocumentResponse::from).collect()))
}

#[instrument(skip(state, user))]
pub async fn search_documents(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    let docs = services::search(state.store.as_ref(), &user, &query.q).await?;
    Ok(Json(docs.into_iter().map(DocumentResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_public_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let found = services::get_public(state.store.as_ref(), id).await?;
    Ok(Json(DocumentResponse::with_shares(found.document, found.shares)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let updated =
        services::update(state.store.as_ref(), &user, id, payload.into_fields()).await?;
    Ok(Json(DocumentResponse::with_shares(
        updated.document,
        updated.shares,
    )))
}

#[instrument(skip(state, user))]
pub async fn delete_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    services::delete(state.store.as_ref(), &user, id).await?;
    Ok(Json(DeletedResponse {
        detail: "Document deleted".into(),
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn share_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<ShareResponse>, AppError> {
    let share = services::share(
        state.store.as_ref(),
        &user,
        id,
        &payload.username,
        payload.can_edit,
    )
    .await?;
    Ok(Json(share.into()))
}

#[instrument(skip(state, user))]
pub async fn list_shares(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SharedWith>>, AppError> {
    let shares = services::list_shares(state.store.as_ref(), &user, id).await?;
    Ok(Json(
        shares
            .into_iter()
            .map(|(share, with)| SharedWith {
                user_id: with.id,
                username: with.username,
                can_edit: share.can_edit,
            })
            .collect(),
    ))
}
