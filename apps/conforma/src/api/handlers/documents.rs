//! Evidence documents and their review workflow.

use crate::api::{
    AppState,
    types::{ApiResult, Created, MessageResponse, created},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use conforma_core::{Actor, Document, DocumentFilter, DocumentReview, DocumentUpdate, NewDocument};

/// `GET /api/documentos-evidencia`
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<DocumentFilter>,
) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(state.store.lock().await.list_documents(&actor, &filter)?))
}

/// `POST /api/documentos-evidencia`
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewDocument>,
) -> Created<Document> {
    created(state.store.lock().await.create_document(&actor, &input)?)
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Document>> {
    Ok(Json(state.store.lock().await.document(&actor, id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(update): Json<DocumentUpdate>,
) -> ApiResult<Json<Document>> {
    Ok(Json(
        state.store.lock().await.update_document(&actor, id, &update)?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.store.lock().await.delete_document(&actor, id)?;
    Ok(Json(MessageResponse::new("Documento excluido com sucesso.")))
}

/// `POST .../submeter` - send to review.
pub async fn submit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Document>> {
    Ok(Json(state.store.lock().await.submit_document(&actor, id)?))
}

/// `POST .../revisar` - approve or reject.
pub async fn review(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(review): Json<DocumentReview>,
) -> ApiResult<Json<Document>> {
    Ok(Json(
        state.store.lock().await.review_document(&actor, id, &review)?,
    ))
}

/// `POST .../reabrir` - start a new version of an approved document.
pub async fn reopen(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Document>> {
    Ok(Json(state.store.lock().await.reopen_document(&actor, id)?))
}
