//! # Conforma HTTP API Module
//!
//! REST API served with axum. Every route lives under `/api` and requires a
//! bearer token, except `GET /health`.
//!
//! ## Resources
//!
//! - `/api/auth/*`, `/api/usuarios` - users and tokens
//! - `/api/programas`, `/api/evidencias`, `/api/avaliacoes`, `/api/demandas`
//! - `/api/documentos-evidencia` - evidence documents and their review
//! - `/api/monitoramentos`, `/api/notificacoes` - criterion monitoring
//! - `/api/analises-nc` - non-conformance analyses
//! - `/api/projetos`, `/api/tarefas`, `/api/atividades` - remediation tracker
//! - `/api/projetos-dashboard/resumo`, `/api/conformidade-dashboard/resumo`
//!
//! Security settings (CORS origins, rate limit) come from
//! [`SecuritySettings`](crate::config::SecuritySettings).

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::bearer_token;
pub use middleware::create_rate_limiter;
pub use types::{ApiError, ErrorResponse, HealthResponse, MessageResponse, StatusChange};

use crate::config::{CorsPolicy, SecuritySettings};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use conforma_core::{ConformaError, Store};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the single SQLite-backed store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

fn build_cors_layer(policy: &CorsPolicy) -> CorsLayer {
    match policy {
        CorsPolicy::Any => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        CorsPolicy::Origins(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();
            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        CorsPolicy::LocalhostOnly => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

fn api_routes() -> Router<AppState> {
    use handlers::{analyses, dashboard, documents, monitoring, notifications, programs, projects, users};

    Router::new()
        // Users
        .route("/auth/register", post(users::register))
        .route("/auth/me", get(users::me))
        .route("/auth/token", post(users::rotate_token))
        .route("/usuarios", get(users::list))
        // Audit structure
        .route("/programas", get(programs::list).post(programs::create))
        .route("/programas/{id}", get(programs::get_one))
        .route(
            "/programas/{id}/auditorias",
            get(programs::list_audit_years).post(programs::create_audit_year),
        )
        .route(
            "/programas/{id}/criterios",
            get(programs::list_criteria).post(programs::create_criterion),
        )
        .route(
            "/evidencias",
            get(programs::list_evidences).post(programs::create_evidence),
        )
        .route("/evidencias/{id}", get(programs::get_evidence))
        .route(
            "/avaliacoes",
            get(programs::list_evaluations).post(programs::create_evaluation),
        )
        .route("/avaliacoes/{id}", get(programs::get_evaluation))
        .route(
            "/demandas",
            get(programs::list_demands).post(programs::create_demand),
        )
        .route("/demandas/{id}", get(programs::get_demand))
        // Evidence documents
        .route(
            "/documentos-evidencia",
            get(documents::list).post(documents::create),
        )
        .route(
            "/documentos-evidencia/{id}",
            get(documents::get_one)
                .patch(documents::update)
                .delete(documents::delete),
        )
        .route("/documentos-evidencia/{id}/submeter", post(documents::submit))
        .route("/documentos-evidencia/{id}/revisar", post(documents::review))
        .route("/documentos-evidencia/{id}/reabrir", post(documents::reopen))
        // Monitoring and notifications
        .route(
            "/monitoramentos",
            get(monitoring::list).post(monitoring::create),
        )
        .route(
            "/monitoramentos/{id}",
            get(monitoring::get_one)
                .patch(monitoring::update)
                .delete(monitoring::delete),
        )
        .route(
            "/notificacoes",
            get(notifications::list).post(notifications::create),
        )
        .route(
            "/notificacoes/{id}",
            get(notifications::get_one).patch(notifications::update),
        )
        .route("/notificacoes/{id}/status", patch(notifications::change_status))
        .route(
            "/notificacoes/{id}/resolucoes",
            get(notifications::list_resolutions).post(notifications::create_resolution),
        )
        // Non-conformance analyses
        .route("/analises-nc", get(analyses::list).post(analyses::create))
        .route(
            "/analises-nc/{id}",
            get(analyses::get_one)
                .patch(analyses::update)
                .delete(analyses::delete),
        )
        // Projects, tasks, activities
        .route("/projetos", get(projects::list).post(projects::create))
        .route(
            "/projetos/{id}",
            get(projects::get_one)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/projetos/{id}/status", patch(projects::change_status))
        .route(
            "/projetos/{id}/tarefas",
            get(projects::list_tasks).post(projects::create_task),
        )
        .route(
            "/tarefas/{id}",
            patch(projects::update_task).delete(projects::delete_task),
        )
        .route("/tarefas/{id}/status", patch(projects::change_task_status))
        .route(
            "/tarefas/{id}/atividades",
            get(projects::list_activities).post(projects::create_activity),
        )
        .route(
            "/atividades/{id}",
            patch(projects::update_activity).delete(projects::delete_activity),
        )
        .route(
            "/atividades/{id}/status",
            patch(projects::change_activity_status),
        )
        // Dashboards
        .route("/projetos-dashboard/resumo", get(dashboard::projects))
        .route("/conformidade-dashboard/resumo", get(dashboard::compliance))
}

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication - on `/api` only
pub fn create_router(state: AppState, security: &SecuritySettings) -> Router {
    let api = api_routes().route_layer(axum_middleware::from_fn_with_state(
        state.clone(),
        auth::require_actor,
    ));

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api);

    match create_rate_limiter(security.rate_limit) {
        Some(limiter) => {
            tracing::info!("Rate limiting enabled: {} requests/second", security.rate_limit);
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(&security.cors))
                .layer(axum::extract::DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the API on `addr` until Ctrl+C.
pub async fn run_server(
    addr: &str,
    store: Store,
    security: &SecuritySettings,
) -> Result<(), ConformaError> {
    let router = create_router(AppState::new(store), security);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ConformaError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Conforma HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConformaError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
