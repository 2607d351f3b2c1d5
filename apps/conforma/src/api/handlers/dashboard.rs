//! Summary dashboards.

use crate::api::{AppState, types::ApiResult};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use conforma_core::{Actor, ComplianceDashboard, ComplianceScope, ProjectsDashboard};

/// `GET /api/projetos-dashboard/resumo`
pub async fn projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<ProjectsDashboard>> {
    Ok(Json(state.store.lock().await.projects_dashboard(&actor)?))
}

/// `GET /api/conformidade-dashboard/resumo?programa_id=&auditoria_ano_id=`
pub async fn compliance(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(scope): Query<ComplianceScope>,
) -> ApiResult<Json<ComplianceDashboard>> {
    Ok(Json(
        state.store.lock().await.compliance_dashboard(&actor, &scope)?,
    ))
}
