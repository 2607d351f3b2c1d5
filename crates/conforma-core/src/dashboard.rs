//! # Dashboards
//!
//! Grouped counts for the project tracker and for the compliance records.
//! Every status appears in declaration order, zeros included. Visibility
//! rules of the underlying listings apply.

use crate::projects::RESPONSIBLE_PROJECTS;
use crate::storage::{Filter, Store, today};
use crate::{
    Actor, AnalysisStatus, DocumentStatus, MonitoringStatus, NotificationStatus, ProjectStatus,
    Result, TaskStatus,
};
use rusqlite::types::FromSql;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Count of records in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount<S> {
    pub status: S,
    pub label: &'static str,
    pub quantidade: i64,
}

/// Summary of the project tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectsDashboard {
    pub total_projetos: i64,
    pub projetos_atrasados: i64,
    pub tarefas_atrasadas: i64,
    pub projetos_por_status: Vec<StatusCount<ProjectStatus>>,
    pub tarefas_por_status: Vec<StatusCount<TaskStatus>>,
}

/// Summary of documents, monitoring, notifications and analyses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceDashboard {
    pub documentos_por_status: Vec<StatusCount<DocumentStatus>>,
    pub documentos_vencidos: i64,
    pub monitoramentos_por_status: Vec<StatusCount<MonitoringStatus>>,
    pub notificacoes_por_status: Vec<StatusCount<NotificationStatus>>,
    pub notificacoes_vencidas: i64,
    pub analises_por_status: Vec<StatusCount<AnalysisStatus>>,
}

/// Optional program/audit scope of the compliance dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplianceScope {
    pub programa_id: Option<i64>,
    pub auditoria_ano_id: Option<i64>,
}

impl ComplianceScope {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        filter.eq("programa_id", self.programa_id);
        filter.eq("auditoria_ano_id", self.auditoria_ano_id);
        filter
    }
}

fn breakdown<S: Copy + Eq + Hash>(
    all: &[S],
    counts: &HashMap<S, i64>,
    label: impl Fn(S) -> &'static str,
) -> Vec<StatusCount<S>> {
    all.iter()
        .map(|status| StatusCount {
            status: *status,
            label: label(*status),
            quantidade: counts.get(status).copied().unwrap_or(0),
        })
        .collect()
}

impl Store {
    /// Project tracker summary for the actor.
    pub fn projects_dashboard(&self, actor: &Actor) -> Result<ProjectsDashboard> {
        let today = today();

        let mut projects = Filter::new();
        let mut tasks = Filter::new();
        if actor.is_responsible() {
            projects.push_each(RESPONSIBLE_PROJECTS, [actor.id, actor.id]);
            tasks.push("responsavel_id = ?", actor.id);
        }

        let project_counts: HashMap<ProjectStatus, i64> = self.grouped_counts(
            &format!(
                "SELECT status, COUNT(*) FROM projetos{} GROUP BY status",
                projects.where_sql()
            ),
            &projects,
        )?;
        let task_counts: HashMap<TaskStatus, i64> = self.grouped_counts(
            &format!(
                "SELECT status, COUNT(*) FROM tarefas_projeto{} GROUP BY status",
                tasks.where_sql()
            ),
            &tasks,
        )?;

        projects.push("data_fim_prevista IS NOT NULL AND data_fim_prevista < ?", today);
        projects.raw("status NOT IN ('concluido', 'cancelado')");
        let projetos_atrasados = self.count(
            &format!("SELECT COUNT(*) FROM projetos{}", projects.where_sql()),
            &projects,
        )?;

        tasks.push("due_date IS NOT NULL AND due_date < ?", today);
        tasks.raw("status <> 'concluida'");
        let tarefas_atrasadas = self.count(
            &format!("SELECT COUNT(*) FROM tarefas_projeto{}", tasks.where_sql()),
            &tasks,
        )?;

        Ok(ProjectsDashboard {
            total_projetos: project_counts.values().sum(),
            projetos_atrasados,
            tarefas_atrasadas,
            projetos_por_status: breakdown(ProjectStatus::ALL, &project_counts, |s| s.label()),
            tarefas_por_status: breakdown(TaskStatus::ALL, &task_counts, |s| s.label()),
        })
    }

    /// Compliance summary for the actor, optionally scoped to a program/audit.
    pub fn compliance_dashboard(
        &self,
        actor: &Actor,
        scope: &ComplianceScope,
    ) -> Result<ComplianceDashboard> {
        let today = today();

        let mut documents = scope.filter();
        let mut notifications = scope.filter();
        let mut analyses = scope.filter();
        let monitorings = scope.filter();
        if actor.is_responsible() {
            documents.push("? IN (responsavel_id, created_by)", actor.id);
            notifications.push("responsavel_id = ?", actor.id);
            analyses.push("responsavel_id = ?", actor.id);
        }

        let document_counts = self.status_counts::<DocumentStatus>(
            "documentos_evidencia",
            "status_documento",
            &documents,
        )?;
        let monitoring_counts = self.status_counts::<MonitoringStatus>(
            "monitoramentos_criterio",
            "status_monitoramento",
            &monitorings,
        )?;
        let notification_counts = self.status_counts::<NotificationStatus>(
            "notificacoes_monitoramento",
            "status_notificacao",
            &notifications,
        )?;
        let analysis_counts = self.status_counts::<AnalysisStatus>(
            "analises_nao_conformidade",
            "status_analise",
            &analyses,
        )?;

        documents.push("data_limite IS NOT NULL AND data_limite < ?", today);
        documents.raw("status_documento <> 'aprovado'");
        let documentos_vencidos = self.count(
            &format!(
                "SELECT COUNT(*) FROM documentos_evidencia{}",
                documents.where_sql()
            ),
            &documents,
        )?;

        notifications.push("prazo IS NOT NULL AND prazo < ?", today);
        notifications.raw("status_notificacao IN ('aberta', 'em_tratamento')");
        let notificacoes_vencidas = self.count(
            &format!(
                "SELECT COUNT(*) FROM notificacoes_monitoramento{}",
                notifications.where_sql()
            ),
            &notifications,
        )?;

        Ok(ComplianceDashboard {
            documentos_por_status: breakdown(DocumentStatus::ALL, &document_counts, |s| s.label()),
            documentos_vencidos,
            monitoramentos_por_status: breakdown(MonitoringStatus::ALL, &monitoring_counts, |s| {
                s.label()
            }),
            notificacoes_por_status: breakdown(NotificationStatus::ALL, &notification_counts, |s| {
                s.label()
            }),
            notificacoes_vencidas,
            analises_por_status: breakdown(AnalysisStatus::ALL, &analysis_counts, |s| s.label()),
        })
    }

    fn status_counts<S: FromSql + Eq + Hash>(
        &self,
        table: &str,
        column: &str,
        filter: &Filter,
    ) -> Result<HashMap<S, i64>> {
        self.grouped_counts(
            &format!(
                "SELECT {column}, COUNT(*) FROM {table}{} GROUP BY {column}",
                filter.where_sql()
            ),
            filter,
        )
    }
}
