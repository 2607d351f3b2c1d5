//! Integration tests for the Conforma HTTP API.
//!
//! Uses axum-test to exercise the router against an in-memory store
//! without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::{TestResponse, TestServer};
use conforma::api::{AppState, HealthResponse, create_router};
use conforma::config::SecuritySettings;
use conforma_core::{NewUser, ProjectStatus, Role, Store, TaskStatus};
use serde_json::{Value, json};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// A server plus one token per role.
struct Fixture {
    server: TestServer,
    admin: String,
    auditor: String,
    owner: String,
    other: String,
}

fn bearer(token: &str) -> HeaderValue {
    format!("Bearer {}", token).parse::<HeaderValue>().unwrap()
}

fn no_rate_limit() -> SecuritySettings {
    SecuritySettings {
        rate_limit: 0,
        ..SecuritySettings::default()
    }
}

fn create_fixture() -> Fixture {
    let store = Store::open_in_memory().unwrap();
    let token = |email: &str, role: Role| {
        store
            .bootstrap_user(&NewUser {
                nome: format!("Usuario {}", role),
                email: email.to_string(),
                role,
            })
            .unwrap()
            .token
    };
    let admin = token("admin@example.com", Role::Admin);
    let auditor = token("auditor@example.com", Role::Auditor);
    let owner = token("dono@example.com", Role::Responsavel);
    let other = token("outro@example.com", Role::Responsavel);

    let router = create_router(AppState::new(store), &no_rate_limit());
    Fixture {
        server: TestServer::new(router).unwrap(),
        admin,
        auditor,
        owner,
        other,
    }
}

impl Fixture {
    async fn get(&self, token: &str, path: &str) -> TestResponse {
        self.server
            .get(path)
            .add_header(header::AUTHORIZATION, bearer(token))
            .await
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> TestResponse {
        self.server
            .post(path)
            .add_header(header::AUTHORIZATION, bearer(token))
            .json(&body)
            .await
    }

    async fn patch(&self, token: &str, path: &str, body: Value) -> TestResponse {
        self.server
            .patch(path)
            .add_header(header::AUTHORIZATION, bearer(token))
            .json(&body)
            .await
    }

    async fn put(&self, token: &str, path: &str, body: Value) -> TestResponse {
        self.server
            .put(path)
            .add_header(header::AUTHORIZATION, bearer(token))
            .json(&body)
            .await
    }

    async fn delete(&self, token: &str, path: &str) -> TestResponse {
        self.server
            .delete(path)
            .add_header(header::AUTHORIZATION, bearer(token))
            .await
    }

    /// Program, audit year, criterion and evidence; returns their ids.
    async fn audit_setup(&self) -> (i64, i64, i64, i64) {
        let program = self
            .post(
                &self.admin,
                "/api/programas",
                json!({"codigo": "FSC-FM", "nome": "Manejo Florestal"}),
            )
            .await;
        program.assert_status(StatusCode::CREATED);
        let programa_id = id_of(&program);

        let audit = self
            .post(
                &self.admin,
                &format!("/api/programas/{}/auditorias", programa_id),
                json!({"ano": 2026}),
            )
            .await;
        audit.assert_status(StatusCode::CREATED);
        let auditoria_ano_id = id_of(&audit);

        let criterion = self
            .post(
                &self.auditor,
                &format!("/api/programas/{}/criterios", programa_id),
                json!({"codigo": "6.1", "titulo": "Valores ambientais"}),
            )
            .await;
        criterion.assert_status(StatusCode::CREATED);
        let criterio_id = id_of(&criterion);

        let evidence = self
            .post(
                &self.auditor,
                "/api/evidencias",
                json!({
                    "programa_id": programa_id,
                    "auditoria_ano_id": auditoria_ano_id,
                    "criterio_id": criterio_id,
                    "titulo": "Relatorio de fauna"
                }),
            )
            .await;
        evidence.assert_status(StatusCode::CREATED);

        (programa_id, auditoria_ano_id, criterio_id, id_of(&evidence))
    }
}

fn id_of(response: &TestResponse) -> i64 {
    response.json::<Value>()["id"].as_i64().unwrap()
}

fn error_of(response: &TestResponse) -> String {
    let body: Value = response.json();
    assert_eq!(body["success"], json!(false));
    body["error"].as_str().unwrap().to_string()
}

// =============================================================================
// HEALTH & AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let fx = create_fixture();

    let response = fx.server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_api_requires_token() {
    let fx = create_fixture();

    let response = fx.server.get("/api/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(&response), "Credenciais invalidas.");

    let response = fx
        .server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, bearer("cfm_1_not-the-secret"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    // Raw tokens without the Bearer scheme are not accepted.
    let response = fx
        .server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, fx.admin.parse::<HeaderValue>().unwrap())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_current_user() {
    let fx = create_fixture();

    let response = fx.get(&fx.auditor, "/api/auth/me").await;

    response.assert_status_ok();
    let me: Value = response.json();
    assert_eq!(me["email"], "auditor@example.com");
    assert_eq!(me["role"], "AUDITOR");
    assert!(me.get("token_digest").is_none());
}

#[tokio::test]
async fn test_register_is_admin_only() {
    let fx = create_fixture();
    let body = json!({"nome": "Gestora Nova", "email": "gestora@example.com", "role": "GESTOR"});

    let response = fx.post(&fx.auditor, "/api/auth/register", body.clone()).await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = fx.post(&fx.admin, "/api/auth/register", body.clone()).await;
    response.assert_status(StatusCode::CREATED);
    let issued: Value = response.json();
    let token = issued["token"].as_str().unwrap().to_string();
    assert!(token.starts_with("cfm_"));

    let me = fx.get(&token, "/api/auth/me").await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["role"], "GESTOR");

    let duplicate = fx
        .post(
            &fx.admin,
            "/api/auth/register",
            json!({"nome": "Outra Pessoa", "email": "GESTORA@example.com", "role": "AUDITOR"}),
        )
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_rotated_token_replaces_old_one() {
    let fx = create_fixture();

    let response = fx.post(&fx.owner, "/api/auth/token", json!({})).await;
    response.assert_status_ok();
    let fresh = response.json::<Value>()["token"].as_str().unwrap().to_string();

    fx.get(&fx.owner, "/api/auth/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    fx.get(&fresh, "/api/auth/me").await.assert_status_ok();
}

#[tokio::test]
async fn test_user_listing_excludes_responsible() {
    let fx = create_fixture();

    fx.get(&fx.owner, "/api/usuarios")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = fx.get(&fx.auditor, "/api/usuarios").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 4);
}

// =============================================================================
// PROGRAMS
// =============================================================================

#[tokio::test]
async fn test_program_codes_are_unique() {
    let fx = create_fixture();
    let (programa_id, ..) = fx.audit_setup().await;

    let duplicate = fx
        .post(
            &fx.admin,
            "/api/programas",
            json!({"codigo": "fsc-fm", "nome": "Outro programa"}),
        )
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);

    let listed = fx.get(&fx.owner, "/api/programas").await;
    listed.assert_status_ok();
    assert_eq!(listed.json::<Value>()[0]["id"], json!(programa_id));

    fx.get(&fx.admin, "/api/programas/999")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let criteria = fx
        .get(&fx.owner, &format!("/api/programas/{}/criterios", programa_id))
        .await;
    assert_eq!(criteria.json::<Value>()[0]["codigo"], "6.1");
}

#[tokio::test]
async fn test_evidences_filter_by_program() {
    let fx = create_fixture();
    let (programa_id, _, _, evidencia_id) = fx.audit_setup().await;

    let listed = fx
        .get(&fx.auditor, &format!("/api/evidencias?programa_id={}", programa_id))
        .await;
    listed.assert_status_ok();
    assert_eq!(listed.json::<Value>().as_array().unwrap().len(), 1);

    let empty = fx.get(&fx.auditor, "/api/evidencias?programa_id=999").await;
    assert!(empty.json::<Value>().as_array().unwrap().is_empty());

    fx.get(&fx.auditor, &format!("/api/evidencias/{}", evidencia_id))
        .await
        .assert_status_ok();
}

// =============================================================================
// DOCUMENTS
// =============================================================================

#[tokio::test]
async fn test_document_review_over_http() {
    let fx = create_fixture();
    let (programa_id, auditoria_ano_id, _, evidencia_id) = fx.audit_setup().await;

    let created = fx
        .post(
            &fx.owner,
            "/api/documentos-evidencia",
            json!({
                "programa_id": programa_id,
                "auditoria_ano_id": auditoria_ano_id,
                "evidencia_id": evidencia_id,
                "titulo": "Inventario de fauna",
                "conteudo": "rascunho"
            }),
        )
        .await;
    created.assert_status(StatusCode::CREATED);
    let doc: Value = created.json();
    assert_eq!(doc["status_documento"], "em_construcao");
    assert_eq!(doc["versao"], 1);
    let path = format!("/api/documentos-evidencia/{}", doc["id"]);

    fx.get(&fx.other, &path)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let submitted = fx.post(&fx.owner, &format!("{}/submeter", path), json!({})).await;
    submitted.assert_status_ok();
    assert_eq!(submitted.json::<Value>()["status_documento"], "em_revisao");

    let missing_notes = fx
        .post(&fx.auditor, &format!("{}/revisar", path), json!({"status": "reprovado"}))
        .await;
    missing_notes.assert_status(StatusCode::BAD_REQUEST);

    let rejected = fx
        .post(
            &fx.auditor,
            &format!("{}/revisar", path),
            json!({"status": "reprovado", "observacoes": "Falta o mapa"}),
        )
        .await;
    rejected.assert_status_ok();

    let edited = fx.patch(&fx.owner, &path, json!({"conteudo": "com mapa"})).await;
    edited.assert_status_ok();
    let edited: Value = edited.json();
    assert_eq!(edited["status_documento"], "em_construcao");
    assert_eq!(edited["versao"], 2);

    fx.delete(&fx.owner, &path)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    let deleted = fx.delete(&fx.admin, &path).await;
    deleted.assert_status_ok();
    assert!(deleted.json::<Value>()["mensagem"].is_string());
    fx.get(&fx.admin, &path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// MONITORING & NOTIFICATIONS
// =============================================================================

#[tokio::test]
async fn test_monitoring_alert_raises_notification() {
    let fx = create_fixture();
    let (programa_id, auditoria_ano_id, criterio_id, _) = fx.audit_setup().await;

    let monitoring = fx
        .post(
            &fx.auditor,
            "/api/monitoramentos",
            json!({
                "programa_id": programa_id,
                "auditoria_ano_id": auditoria_ano_id,
                "criterio_id": criterio_id,
                "mes_referencia": "2026-04-18",
                "status_monitoramento": "alerta"
            }),
        )
        .await;
    monitoring.assert_status(StatusCode::CREATED);
    assert_eq!(monitoring.json::<Value>()["mes_referencia"], "2026-04-01");

    let same_month = fx
        .post(
            &fx.auditor,
            "/api/monitoramentos",
            json!({
                "programa_id": programa_id,
                "auditoria_ano_id": auditoria_ano_id,
                "criterio_id": criterio_id,
                "mes_referencia": "2026-04-02"
            }),
        )
        .await;
    same_month.assert_status(StatusCode::CONFLICT);

    let notifications = fx.get(&fx.admin, "/api/notificacoes").await;
    notifications.assert_status_ok();
    let notifications: Value = notifications.json();
    assert_eq!(notifications.as_array().unwrap().len(), 1);
    assert_eq!(notifications[0]["severidade"], "alta");
    assert_eq!(notifications[0]["status_notificacao"], "aberta");
    let path = format!("/api/notificacoes/{}", notifications[0]["id"]);

    let early = fx
        .patch(&fx.admin, &format!("{}/status", path), json!({"status": "resolvida"}))
        .await;
    early.assert_status(StatusCode::BAD_REQUEST);

    let resolution = fx
        .post(
            &fx.auditor,
            &format!("{}/resolucoes", path),
            json!({"descricao": "Cerca reparada", "resolver": true}),
        )
        .await;
    resolution.assert_status(StatusCode::CREATED);

    let resolved = fx.get(&fx.admin, &path).await;
    assert_eq!(resolved.json::<Value>()["status_notificacao"], "resolvida");

    let listed = fx.get(&fx.admin, &format!("{}/resolucoes", path)).await;
    assert_eq!(listed.json::<Value>().as_array().unwrap().len(), 1);

    // Responsible users only see notifications assigned to them.
    let hidden = fx.get(&fx.owner, "/api/notificacoes").await;
    assert!(hidden.json::<Value>().as_array().unwrap().is_empty());
}

// =============================================================================
// ANALYSES
// =============================================================================

#[tokio::test]
async fn test_analysis_requires_contiguous_whys() {
    let fx = create_fixture();
    let (programa_id, auditoria_ano_id, criterio_id, _) = fx.audit_setup().await;

    let evaluation = fx
        .post(
            &fx.auditor,
            "/api/avaliacoes",
            json!({
                "programa_id": programa_id,
                "auditoria_ano_id": auditoria_ano_id,
                "criterio_id": criterio_id,
                "resultado": "nao_conforme"
            }),
        )
        .await;
    evaluation.assert_status(StatusCode::CREATED);
    let avaliacao_id = id_of(&evaluation);

    let gap = fx
        .post(
            &fx.auditor,
            "/api/analises-nc",
            json!({
                "programa_id": programa_id,
                "auditoria_ano_id": auditoria_ano_id,
                "avaliacao_id": avaliacao_id,
                "titulo_problema": "Trilha sem sinalizacao",
                "porque_1": "placas roubadas",
                "porque_3": "sem vigilancia"
            }),
        )
        .await;
    gap.assert_status(StatusCode::BAD_REQUEST);

    let created = fx
        .post(
            &fx.auditor,
            "/api/analises-nc",
            json!({
                "programa_id": programa_id,
                "auditoria_ano_id": auditoria_ano_id,
                "avaliacao_id": avaliacao_id,
                "titulo_problema": "Trilha sem sinalizacao",
                "porque_1": "placas roubadas"
            }),
        )
        .await;
    created.assert_status(StatusCode::CREATED);
    let analysis: Value = created.json();
    assert_eq!(analysis["status_analise"], "aberta");
    let path = format!("/api/analises-nc/{}", analysis["id"]);

    let premature = fx
        .patch(&fx.auditor, &path, json!({"status_analise": "concluida"}))
        .await;
    premature.assert_status(StatusCode::BAD_REQUEST);

    fx.delete(&fx.auditor, &path)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    fx.delete(&fx.admin, &path).await.assert_status_ok();
}

// =============================================================================
// PROJECTS, TASKS, ACTIVITIES
// =============================================================================

#[tokio::test]
async fn test_project_lifecycle() {
    let fx = create_fixture();

    let created = fx
        .post(
            &fx.admin,
            "/api/projetos",
            json!({
                "codigo": "PRJ-01",
                "nome": "Recuperacao de APP",
                "data_inicio": "2026-01-01",
                "data_fim_prevista": "2026-06-30"
            }),
        )
        .await;
    created.assert_status(StatusCode::CREATED);
    let project: Value = created.json();
    assert_eq!(project["status"], "planejamento");
    assert_eq!(project["prioridade"], "media");
    let path = format!("/api/projetos/{}", project["id"]);

    fx.put(&fx.admin, &path, json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let backwards = fx
        .put(&fx.admin, &path, json!({"data_fim_prevista": "2025-12-01"}))
        .await;
    backwards.assert_status(StatusCode::BAD_REQUEST);

    let concluded = fx
        .patch(&fx.admin, &format!("{}/status", path), json!({"status": "concluido"}))
        .await;
    concluded.assert_status_ok();
    assert!(concluded.json::<Value>()["data_fim_real"].is_string());

    let reopened = fx
        .patch(&fx.admin, &format!("{}/status", path), json!({"status": "em_andamento"}))
        .await;
    assert!(reopened.json::<Value>()["data_fim_real"].is_null());

    fx.patch(&fx.auditor, &format!("{}/status", path), json!({"status": "pausado"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let deleted = fx.delete(&fx.admin, &path).await;
    deleted.assert_status_ok();
    assert_eq!(deleted.json::<Value>()["mensagem"], "Projeto excluido com sucesso.");
}

#[tokio::test]
async fn test_responsible_sees_assigned_work_only() {
    let fx = create_fixture();
    let owner_id = fx.get(&fx.owner, "/api/auth/me").await.json::<Value>()["id"].clone();

    let project = fx
        .post(&fx.admin, "/api/projetos", json!({"codigo": "PRJ-A", "nome": "Plantio"}))
        .await;
    let projeto_id = id_of(&project);
    fx.post(&fx.admin, "/api/projetos", json!({"codigo": "PRJ-B", "nome": "Cercamento"}))
        .await
        .assert_status(StatusCode::CREATED);

    let task = fx
        .post(
            &fx.auditor,
            &format!("/api/projetos/{}/tarefas", projeto_id),
            json!({"titulo": "Plantio de mudas", "responsavel_id": owner_id}),
        )
        .await;
    task.assert_status(StatusCode::CREATED);
    let tarefa_id = id_of(&task);

    let visible = fx.get(&fx.owner, "/api/projetos").await;
    let visible: Value = visible.json();
    assert_eq!(visible.as_array().unwrap().len(), 1);
    assert_eq!(visible[0]["codigo"], "PRJ-A");

    fx.get(&fx.other, &format!("/api/projetos/{}", projeto_id))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let retitle = fx
        .patch(&fx.owner, &format!("/api/tarefas/{}", tarefa_id), json!({"titulo": "Novo"}))
        .await;
    retitle.assert_status(StatusCode::FORBIDDEN);

    let done = fx
        .patch(
            &fx.owner,
            &format!("/api/tarefas/{}/status", tarefa_id),
            json!({"status": "concluida"}),
        )
        .await;
    done.assert_status_ok();
    assert!(done.json::<Value>()["completed_at"].is_string());

    let activity = fx
        .post(
            &fx.owner,
            &format!("/api/tarefas/{}/atividades", tarefa_id),
            json!({"titulo": "Comprar mudas"}),
        )
        .await;
    activity.assert_status(StatusCode::CREATED);
    let atividade_id = id_of(&activity);

    let ticked = fx
        .patch(
            &fx.owner,
            &format!("/api/atividades/{}/status", atividade_id),
            json!({"status": "concluida"}),
        )
        .await;
    ticked.assert_status_ok();
    assert_eq!(ticked.json::<Value>()["status"], "concluida");

    fx.delete(&fx.other, &format!("/api/atividades/{}", atividade_id))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    fx.delete(&fx.owner, &format!("/api/atividades/{}", atividade_id))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_overdue_filters_via_query_string() {
    let fx = create_fixture();
    let codes = |response: TestResponse, key: &str| -> Vec<String> {
        response
            .json::<Value>()
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item[key].as_str().unwrap().to_string())
            .collect()
    };

    for (codigo, prevista, status) in [
        ("PRJ-SEM", Value::Null, "em_andamento"),
        ("PRJ-ATR", json!("2020-01-01"), "em_andamento"),
        ("PRJ-FIM", json!("2019-01-01"), "concluido"),
        ("PRJ-FUT", json!("2099-01-01"), "planejamento"),
    ] {
        fx.post(
            &fx.admin,
            "/api/projetos",
            json!({"codigo": codigo, "nome": "Projeto", "status": status, "data_fim_prevista": prevista}),
        )
        .await
        .assert_status(StatusCode::CREATED);
    }

    let all = fx.get(&fx.admin, "/api/projetos").await;
    assert_eq!(codes(all, "codigo"), ["PRJ-FIM", "PRJ-ATR", "PRJ-FUT", "PRJ-SEM"]);
    let late = fx.get(&fx.admin, "/api/projetos?atrasados=true").await;
    late.assert_status_ok();
    assert_eq!(codes(late, "codigo"), ["PRJ-ATR"]);

    let projeto_id = fx.get(&fx.admin, "/api/projetos?atrasados=true").await.json::<Value>()[0]["id"]
        .as_i64()
        .unwrap();
    for (titulo, due, status) in [
        ("Tarefa vencida", json!("2020-01-01"), "a_fazer"),
        ("Tarefa feita", json!("2020-01-01"), "concluida"),
        ("Tarefa sem prazo", Value::Null, "a_fazer"),
    ] {
        fx.post(
            &fx.auditor,
            &format!("/api/projetos/{}/tarefas", projeto_id),
            json!({"titulo": titulo, "due_date": due, "status": status}),
        )
        .await
        .assert_status(StatusCode::CREATED);
    }

    let late_tasks = fx
        .get(&fx.admin, &format!("/api/projetos/{}/tarefas?atrasadas=true", projeto_id))
        .await;
    late_tasks.assert_status_ok();
    assert_eq!(codes(late_tasks, "titulo"), ["Tarefa vencida"]);

    let overdue = fx.get(&fx.admin, "/api/notificacoes?vencidas=true").await;
    overdue.assert_status_ok();
    assert!(overdue.json::<Value>().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_projects_dashboard_lists_every_status() {
    let fx = create_fixture();
    fx.post(&fx.admin, "/api/projetos", json!({"codigo": "PRJ-D", "nome": "Painel"}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = fx.get(&fx.admin, "/api/projetos-dashboard/resumo").await;
    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["total_projetos"], 1);
    assert_eq!(
        summary["projetos_por_status"].as_array().unwrap().len(),
        ProjectStatus::ALL.len()
    );
    assert_eq!(
        summary["tarefas_por_status"].as_array().unwrap().len(),
        TaskStatus::ALL.len()
    );
    assert_eq!(summary["projetos_por_status"][0]["status"], "planejamento");
    assert_eq!(summary["projetos_por_status"][0]["quantidade"], 1);

    let compliance = fx.get(&fx.auditor, "/api/conformidade-dashboard/resumo").await;
    compliance.assert_status_ok();
    assert!(compliance.json::<Value>()["documentos_por_status"].is_array());
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let fx = create_fixture();

    let response = fx
        .server
        .post("/api/projetos")
        .add_header(header::AUTHORIZATION, bearer(&fx.admin))
        .json(&json!({"codigo": 42}))
        .await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let store = Store::open_in_memory().unwrap();
    let settings = SecuritySettings {
        rate_limit: 1,
        ..SecuritySettings::default()
    };
    let server = TestServer::new(create_router(AppState::new(store), &settings)).unwrap();

    server.get("/health").await.assert_status_ok();
    let limited = server.get("/health").await;
    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.json::<Value>()["success"], json!(false));
}
