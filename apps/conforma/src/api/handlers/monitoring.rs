//! Monthly criterion monitoring.
//!
//! Creating or updating a record with a worse status raises (or escalates)
//! a notification inside the same transaction.

use crate::api::{
    AppState,
    types::{ApiResult, Created, MessageResponse, created},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use conforma_core::{Actor, Monitoring, MonitoringFilter, MonitoringUpdate, NewMonitoring};

pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<MonitoringFilter>,
) -> ApiResult<Json<Vec<Monitoring>>> {
    Ok(Json(state.store.lock().await.list_monitorings(&filter)?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewMonitoring>,
) -> Created<Monitoring> {
    created(state.store.lock().await.create_monitoring(&actor, &input)?)
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Monitoring>> {
    Ok(Json(state.store.lock().await.monitoring(id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(update): Json<MonitoringUpdate>,
) -> ApiResult<Json<Monitoring>> {
    Ok(Json(
        state.store.lock().await.update_monitoring(&actor, id, &update)?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.store.lock().await.delete_monitoring(&actor, id)?;
    Ok(Json(MessageResponse::new(
        "Monitoramento excluido com sucesso.",
    )))
}
