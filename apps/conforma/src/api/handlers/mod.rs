//! # API Endpoint Handlers
//!
//! One submodule per resource. Handlers lock the store, call the matching
//! `conforma-core` operation with the authenticated [`Actor`] and serialize
//! the result; core errors become HTTP errors through `ApiError`.
//!
//! [`Actor`]: conforma_core::Actor

pub mod analyses;
pub mod dashboard;
pub mod documents;
pub mod monitoring;
pub mod notifications;
pub mod programs;
pub mod projects;
pub mod users;

use super::types::HealthResponse;
use axum::{Json, response::IntoResponse};

/// Health check endpoint. Unauthenticated.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::default())
}
