//! Monitoring notifications and their resolutions.

use crate::api::{
    AppState,
    types::{ApiResult, Created, StatusChange, created},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use conforma_core::{
    Actor, NewNotification, NewResolution, Notification, NotificationFilter, NotificationStatus,
    NotificationUpdate, Resolution,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<NotificationFilter>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(
        state.store.lock().await.list_notifications(&actor, &filter)?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewNotification>,
) -> Created<Notification> {
    created(state.store.lock().await.create_notification(&actor, &input)?)
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(state.store.lock().await.notification(&actor, id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(update): Json<NotificationUpdate>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(
        state
            .store
            .lock()
            .await
            .update_notification(&actor, id, &update)?,
    ))
}

/// `PATCH /api/notificacoes/{id}/status`
pub async fn change_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(body): Json<StatusChange<NotificationStatus>>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(
        state
            .store
            .lock()
            .await
            .change_notification_status(&actor, id, body.status)?,
    ))
}

pub async fn list_resolutions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Resolution>>> {
    Ok(Json(state.store.lock().await.list_resolutions(&actor, id)?))
}

/// `POST /api/notificacoes/{id}/resolucoes` - `"resolver": true` also
/// closes the notification.
pub async fn create_resolution(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(input): Json<NewResolution>,
) -> Created<Resolution> {
    let store = state.store.lock().await;
    created(store.create_resolution(&actor, id, &input)?)
}
