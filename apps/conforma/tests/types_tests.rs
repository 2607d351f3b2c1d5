//! Unit tests for API envelopes and error mapping.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum::response::IntoResponse;
use conforma::api::{ApiError, ErrorResponse, HealthResponse, MessageResponse, StatusChange};
use conforma_core::{ConformaError, DocumentStatus, ProjectStatus};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.3.0".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.3.0\""));
}

// =============================================================================
// SMALL BODIES
// =============================================================================

#[test]
fn test_message_response_serialization() {
    let json = serde_json::to_string(&MessageResponse::new("Projeto excluido com sucesso.")).unwrap();
    assert_eq!(json, r#"{"mensagem":"Projeto excluido com sucesso."}"#);
}

#[test]
fn test_status_change_parses_wire_values() {
    let change: StatusChange<ProjectStatus> =
        serde_json::from_str(r#"{"status":"em_andamento"}"#).unwrap();
    assert_eq!(change.status, ProjectStatus::EmAndamento);

    let change: StatusChange<DocumentStatus> =
        serde_json::from_str(r#"{"status":"aprovado"}"#).unwrap();
    assert_eq!(change.status, DocumentStatus::Aprovado);
}

#[test]
fn test_status_change_rejects_unknown_value() {
    let result = serde_json::from_str::<StatusChange<ProjectStatus>>(r#"{"status":"arquivado"}"#);
    assert!(result.is_err());

    let result = serde_json::from_str::<StatusChange<ProjectStatus>>("{}");
    assert!(result.is_err());
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

#[test]
fn test_error_response_shape() {
    let json = serde_json::to_string(&ErrorResponse::new("Credenciais invalidas.")).unwrap();
    assert_eq!(json, r#"{"success":false,"error":"Credenciais invalidas."}"#);
}

#[test]
fn test_error_status_mapping() {
    let cases = [
        (ConformaError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (ConformaError::Forbidden("x".into()), StatusCode::FORBIDDEN),
        (ConformaError::Unauthorized, StatusCode::UNAUTHORIZED),
        (ConformaError::Validation("x".into()), StatusCode::BAD_REQUEST),
        (ConformaError::Conflict("x".into()), StatusCode::CONFLICT),
        (ConformaError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (ConformaError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (ConformaError::Io("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        (
            ConformaError::Migration {
                version: 2,
                message: "x".into(),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];
    for (err, expected) in cases {
        assert_eq!(ApiError(err).status(), expected);
    }
}

async fn body_of(err: ConformaError) -> (StatusCode, serde_json::Value) {
    let response = ApiError(err).into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_client_errors_carry_message() {
    let (status, body) = body_of(ConformaError::Validation(
        "Nenhum campo informado para atualizacao.".into(),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Nenhum campo informado para atualizacao.");
}

#[tokio::test]
async fn test_internal_errors_are_masked() {
    let (status, body) = body_of(ConformaError::Storage("disk I/O error".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Erro interno do servidor.");
}
