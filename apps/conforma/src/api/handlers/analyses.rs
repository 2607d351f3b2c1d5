//! Non-conformance analyses (5 whys + SWOT).

use crate::api::{
    AppState,
    types::{ApiResult, Created, MessageResponse, created},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use conforma_core::{Actor, Analysis, AnalysisFilter, AnalysisUpdate, NewAnalysis};

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<AnalysisFilter>,
) -> ApiResult<Json<Vec<Analysis>>> {
    Ok(Json(state.store.lock().await.list_analyses(&actor, &filter)?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewAnalysis>,
) -> Created<Analysis> {
    created(state.store.lock().await.create_analysis(&actor, &input)?)
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Analysis>> {
    Ok(Json(state.store.lock().await.analysis(&actor, id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(update): Json<AnalysisUpdate>,
) -> ApiResult<Json<Analysis>> {
    Ok(Json(
        state.store.lock().await.update_analysis(&actor, id, &update)?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.store.lock().await.delete_analysis(&actor, id)?;
    Ok(Json(MessageResponse::new("Analise excluida com sucesso.")))
}
