//! Remediation projects, their tasks and task activities.

use crate::api::{
    AppState,
    types::{ApiResult, Created, MessageResponse, StatusChange, created},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use conforma_core::{
    Activity, ActivityFilter, ActivityStatus, ActivityUpdate, Actor, NewActivity, NewProject,
    NewTask, Project, ProjectFilter, ProjectStatus, ProjectUpdate, Task, TaskFilter, TaskStatus,
    TaskUpdate,
};

// =============================================================================
// PROJECTS
// =============================================================================

pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.store.lock().await.list_projects(&actor, &filter)?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewProject>,
) -> Created<Project> {
    created(state.store.lock().await.create_project(&actor, &input)?)
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.store.lock().await.project(&actor, id)?))
}

/// `PUT /api/projetos/{id}` - only the sent fields change.
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(update): Json<ProjectUpdate>,
) -> ApiResult<Json<Project>> {
    Ok(Json(
        state.store.lock().await.update_project(&actor, id, &update)?,
    ))
}

pub async fn change_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(body): Json<StatusChange<ProjectStatus>>,
) -> ApiResult<Json<Project>> {
    Ok(Json(
        state
            .store
            .lock()
            .await
            .change_project_status(&actor, id, body.status)?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.store.lock().await.delete_project(&actor, id)?;
    Ok(Json(MessageResponse::new("Projeto excluido com sucesso.")))
}

// =============================================================================
// TASKS
// =============================================================================

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(
        state.store.lock().await.list_tasks(&actor, id, &filter)?,
    ))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(input): Json<NewTask>,
) -> Created<Task> {
    created(state.store.lock().await.create_task(&actor, id, &input)?)
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        state.store.lock().await.update_task(&actor, id, &update)?,
    ))
}

pub async fn change_task_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(body): Json<StatusChange<TaskStatus>>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        state
            .store
            .lock()
            .await
            .change_task_status(&actor, id, body.status)?,
    ))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.store.lock().await.delete_task(&actor, id)?;
    Ok(Json(MessageResponse::new("Tarefa excluida com sucesso.")))
}

// =============================================================================
// ACTIVITIES
// =============================================================================

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Query(filter): Query<ActivityFilter>,
) -> ApiResult<Json<Vec<Activity>>> {
    Ok(Json(
        state.store.lock().await.list_activities(&actor, id, &filter)?,
    ))
}

pub async fn create_activity(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(input): Json<NewActivity>,
) -> Created<Activity> {
    let store = state.store.lock().await;
    created(store.create_activity(&actor, id, &input)?)
}

pub async fn update_activity(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(update): Json<ActivityUpdate>,
) -> ApiResult<Json<Activity>> {
    Ok(Json(
        state.store.lock().await.update_activity(&actor, id, &update)?,
    ))
}

pub async fn change_activity_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(body): Json<StatusChange<ActivityStatus>>,
) -> ApiResult<Json<Activity>> {
    Ok(Json(
        state
            .store
            .lock()
            .await
            .change_activity_status(&actor, id, body.status)?,
    ))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.store.lock().await.delete_activity(&actor, id)?;
    Ok(Json(MessageResponse::new("Atividade excluida com sucesso.")))
}
