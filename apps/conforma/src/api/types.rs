//! # API Request/Response Types
//!
//! Envelopes shared by the handlers. Domain records are serialized as-is
//! from `conforma-core`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use conforma_core::ConformaError;
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// SMALL BODIES
// =============================================================================

/// Confirmation returned by delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub mensagem: String,
}

impl MessageResponse {
    pub fn new(mensagem: impl Into<String>) -> Self {
        Self {
            mensagem: mensagem.into(),
        }
    }
}

/// Body of the `.../status` endpoints: `{"status": "<value>"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange<S> {
    pub status: S,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body: `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

/// A core error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ConformaError);

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result of a create endpoint: `201 Created` with the new record.
pub type Created<T> = ApiResult<(StatusCode, Json<T>)>;

/// Wrap a freshly created record.
pub fn created<T>(value: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(value)))
}

impl From<ConformaError> for ApiError {
    fn from(err: ConformaError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ConformaError::NotFound(_) => StatusCode::NOT_FOUND,
            ConformaError::Forbidden(_) => StatusCode::FORBIDDEN,
            ConformaError::Unauthorized => StatusCode::UNAUTHORIZED,
            ConformaError::Validation(_) => StatusCode::BAD_REQUEST,
            ConformaError::Conflict(_) => StatusCode::CONFLICT,
            ConformaError::Storage(_)
            | ConformaError::Migration { .. }
            | ConformaError::Config(_)
            | ConformaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(event = "internal_error", error = %self.0, "request failed");
            "Erro interno do servidor.".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
