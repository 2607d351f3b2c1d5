//! Certification programs, audit years, criteria, evidences, evaluations
//! and demands.

use crate::api::{
    AppState,
    types::{ApiResult, Created, created},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use conforma_core::{
    Actor, AuditScope, AuditYear, Criterion, Demand, Evaluation, Evidence, NewAuditYear,
    NewCriterion, NewDemand, NewEvaluation, NewEvidence, NewProgram, Program,
};

// =============================================================================
// PROGRAMS
// =============================================================================

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Program>>> {
    Ok(Json(state.store.lock().await.list_programs()?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewProgram>,
) -> Created<Program> {
    created(state.store.lock().await.create_program(&actor, &input)?)
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Program>> {
    Ok(Json(state.store.lock().await.program(id)?))
}

pub async fn list_audit_years(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<AuditYear>>> {
    Ok(Json(state.store.lock().await.list_audit_years(id)?))
}

pub async fn create_audit_year(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(input): Json<NewAuditYear>,
) -> Created<AuditYear> {
    let store = state.store.lock().await;
    created(store.create_audit_year(&actor, id, &input)?)
}

pub async fn list_criteria(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Criterion>>> {
    Ok(Json(state.store.lock().await.list_criteria(id)?))
}

pub async fn create_criterion(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(input): Json<NewCriterion>,
) -> Created<Criterion> {
    let store = state.store.lock().await;
    created(store.create_criterion(&actor, id, &input)?)
}

// =============================================================================
// EVIDENCES, EVALUATIONS, DEMANDS
// =============================================================================

pub async fn list_evidences(
    State(state): State<AppState>,
    Query(scope): Query<AuditScope>,
) -> ApiResult<Json<Vec<Evidence>>> {
    Ok(Json(state.store.lock().await.list_evidences(&scope)?))
}

pub async fn create_evidence(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewEvidence>,
) -> Created<Evidence> {
    created(state.store.lock().await.create_evidence(&actor, &input)?)
}

pub async fn get_evidence(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Evidence>> {
    Ok(Json(state.store.lock().await.evidence(id)?))
}

pub async fn list_evaluations(
    State(state): State<AppState>,
    Query(scope): Query<AuditScope>,
) -> ApiResult<Json<Vec<Evaluation>>> {
    Ok(Json(state.store.lock().await.list_evaluations(&scope)?))
}

pub async fn create_evaluation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewEvaluation>,
) -> Created<Evaluation> {
    created(state.store.lock().await.create_evaluation(&actor, &input)?)
}

pub async fn get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Evaluation>> {
    Ok(Json(state.store.lock().await.evaluation(id)?))
}

pub async fn list_demands(
    State(state): State<AppState>,
    Query(scope): Query<AuditScope>,
) -> ApiResult<Json<Vec<Demand>>> {
    Ok(Json(state.store.lock().await.list_demands(&scope)?))
}

pub async fn create_demand(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewDemand>,
) -> Created<Demand> {
    created(state.store.lock().await.create_demand(&actor, &input)?)
}

pub async fn get_demand(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Demand>> {
    Ok(Json(state.store.lock().await.demand(id)?))
}
