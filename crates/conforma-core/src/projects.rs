//! # Remediation Projects
//!
//! Projects group the tasks used to track corrective actions. A
//! RESPONSAVEL sees a project when they manage it or hold one of its tasks.

use crate::access::{MANAGERS, ensure, require_roles};
use crate::primitives::{NAME_LEN, PROGRESS_RANGE, PROJECT_CODE_LEN, check_len, check_range};
use crate::rules::{ProjectSchedule, settle_project_schedule};
use crate::storage::{Filter, Store, now, today};
use crate::{Actor, ConformaError, Priority, ProjectStatus, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Row, params};
use serde::{Deserialize, Serialize};

/// A remediation project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i64,
    pub codigo: String,
    pub nome: String,
    pub descricao: Option<String>,
    pub status: ProjectStatus,
    pub prioridade: Priority,
    pub progresso: i64,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim_prevista: Option<NaiveDate>,
    pub data_fim_real: Option<NaiveDate>,
    pub gerente_id: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            codigo: row.get("codigo")?,
            nome: row.get("nome")?,
            descricao: row.get("descricao")?,
            status: row.get("status")?,
            prioridade: row.get("prioridade")?,
            progresso: row.get("progresso")?,
            data_inicio: row.get("data_inicio")?,
            data_fim_prevista: row.get("data_fim_prevista")?,
            data_fim_real: row.get("data_fim_real")?,
            gerente_id: row.get("gerente_id")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn schedule(&self) -> ProjectSchedule {
        ProjectSchedule {
            status: self.status,
            data_inicio: self.data_inicio,
            data_fim_prevista: self.data_fim_prevista,
            data_fim_real: self.data_fim_real,
        }
    }

    fn set_schedule(&mut self, schedule: ProjectSchedule) {
        self.status = schedule.status;
        self.data_inicio = schedule.data_inicio;
        self.data_fim_prevista = schedule.data_fim_prevista;
        self.data_fim_real = schedule.data_fim_real;
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub codigo: String,
    pub nome: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub prioridade: Priority,
    #[serde(default)]
    pub progresso: i64,
    #[serde(default)]
    pub data_inicio: Option<NaiveDate>,
    #[serde(default)]
    pub data_fim_prevista: Option<NaiveDate>,
    #[serde(default)]
    pub gerente_id: Option<i64>,
}

/// Full-replace style update where only the sent fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub codigo: Option<String>,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub descricao: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub prioridade: Option<Priority>,
    #[serde(default)]
    pub progresso: Option<i64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub data_inicio: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub data_fim_prevista: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub data_fim_real: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub gerente_id: Option<Option<i64>>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.codigo.is_none()
            && self.nome.is_none()
            && self.descricao.is_none()
            && self.status.is_none()
            && self.prioridade.is_none()
            && self.progresso.is_none()
            && self.data_inicio.is_none()
            && self.data_fim_prevista.is_none()
            && self.data_fim_real.is_none()
            && self.gerente_id.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub status_projeto: Option<ProjectStatus>,
    pub prioridade: Option<Priority>,
    pub gerente_id: Option<i64>,
    pub atrasados: Option<bool>,
}

/// Projects a RESPONSAVEL may see: managed by them or holding their tasks.
pub(crate) const RESPONSIBLE_PROJECTS: &str =
    "(gerente_id = ? OR id IN (SELECT projeto_id FROM tarefas_projeto WHERE responsavel_id = ?))";

const ORDER_BY_DEADLINE: &str = " ORDER BY data_fim_prevista ASC NULLS LAST, created_at DESC";

impl Store {
    /// Projects visible to the actor, nearest planned end first.
    pub fn list_projects(&self, actor: &Actor, query: &ProjectFilter) -> Result<Vec<Project>> {
        let mut filter = self.visible_projects(actor);
        filter.eq("status", query.status_projeto);
        filter.eq("prioridade", query.prioridade);
        filter.eq("gerente_id", query.gerente_id);
        if query.atrasados == Some(true) {
            filter.push("data_fim_prevista IS NOT NULL AND data_fim_prevista < ?", today());
            filter.raw("status NOT IN ('concluido', 'cancelado')");
        }
        self.query_list(
            &format!("SELECT * FROM projetos{}{}", filter.where_sql(), ORDER_BY_DEADLINE),
            filter.params(),
            Project::from_row,
        )
    }

    /// Create a project. ADMIN/GESTOR.
    pub fn create_project(&self, actor: &Actor, input: &NewProject) -> Result<Project> {
        require_roles(actor, MANAGERS)?;
        check_len("codigo", &input.codigo, PROJECT_CODE_LEN)?;
        check_len("nome", &input.nome, NAME_LEN)?;
        check_range("progresso", input.progresso, PROGRESS_RANGE)?;
        if let Some(gerente) = input.gerente_id {
            self.require_user(gerente)?;
        }
        self.check_project_code_free(&input.codigo, None)?;

        let mut schedule = ProjectSchedule {
            status: input.status,
            data_inicio: input.data_inicio,
            data_fim_prevista: input.data_fim_prevista,
            data_fim_real: None,
        };
        settle_project_schedule(&mut schedule, false, false, today())?;

        let ts = now();
        self.conn().execute(
            "INSERT INTO projetos
                (codigo, nome, descricao, status, prioridade, progresso, data_inicio,
                 data_fim_prevista, data_fim_real, gerente_id, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                input.codigo,
                input.nome,
                input.descricao,
                schedule.status,
                input.prioridade,
                input.progresso,
                schedule.data_inicio,
                schedule.data_fim_prevista,
                schedule.data_fim_real,
                input.gerente_id,
                actor.id,
                ts
            ],
        )?;
        let project = self.load_project(self.last_id())?;
        tracing::info!(event = "project_created", project = project.id, codigo = %project.codigo);
        Ok(project)
    }

    /// One project, subject to visibility.
    pub fn project(&self, actor: &Actor, id: i64) -> Result<Project> {
        let project = self.load_project(id)?;
        self.check_project_access(actor, &project)?;
        Ok(project)
    }

    /// Update the sent fields. ADMIN/GESTOR.
    pub fn update_project(
        &self,
        actor: &Actor,
        id: i64,
        update: &ProjectUpdate,
    ) -> Result<Project> {
        require_roles(actor, MANAGERS)?;
        let mut project = self.load_project(id)?;
        if update.is_empty() {
            return Err(ConformaError::Validation(
                "Nenhum campo informado para atualizacao.".to_string(),
            ));
        }
        if let Some(codigo) = &update.codigo {
            check_len("codigo", codigo, PROJECT_CODE_LEN)?;
            self.check_project_code_free(codigo, Some(id))?;
            project.codigo = codigo.clone();
        }
        if let Some(Some(gerente)) = update.gerente_id {
            self.require_user(gerente)?;
        }
        if let Some(nome) = &update.nome {
            check_len("nome", nome, NAME_LEN)?;
            project.nome = nome.clone();
        }
        if let Some(progresso) = update.progresso {
            check_range("progresso", progresso, PROGRESS_RANGE)?;
            project.progresso = progresso;
        }
        if let Some(descricao) = &update.descricao {
            project.descricao = descricao.clone();
        }
        if let Some(prioridade) = update.prioridade {
            project.prioridade = prioridade;
        }
        if let Some(gerente_id) = update.gerente_id {
            project.gerente_id = gerente_id;
        }

        let mut schedule = project.schedule();
        if let Some(status) = update.status {
            schedule.status = status;
        }
        if let Some(data_inicio) = update.data_inicio {
            schedule.data_inicio = data_inicio;
        }
        if let Some(data_fim_prevista) = update.data_fim_prevista {
            schedule.data_fim_prevista = data_fim_prevista;
        }
        if let Some(data_fim_real) = update.data_fim_real {
            schedule.data_fim_real = data_fim_real;
        }
        settle_project_schedule(
            &mut schedule,
            update.status.is_some(),
            update.data_fim_real.is_some(),
            today(),
        )?;
        project.set_schedule(schedule);

        self.save_project(&project)
    }

    /// Change only the status, applying the end-date side effects. ADMIN/GESTOR.
    pub fn change_project_status(
        &self,
        actor: &Actor,
        id: i64,
        status: ProjectStatus,
    ) -> Result<Project> {
        require_roles(actor, MANAGERS)?;
        let mut project = self.load_project(id)?;
        let mut schedule = project.schedule();
        schedule.status = status;
        settle_project_schedule(&mut schedule, true, false, today())?;
        project.set_schedule(schedule);
        self.save_project(&project)
    }

    /// Delete a project and its tasks. ADMIN/GESTOR.
    pub fn delete_project(&self, actor: &Actor, id: i64) -> Result<()> {
        require_roles(actor, MANAGERS)?;
        self.load_project(id)?;
        self.conn().execute("DELETE FROM projetos WHERE id = ?1", [id])?;
        tracing::info!(event = "project_deleted", project = id, actor = actor.id);
        Ok(())
    }

    /// Visibility filter over `projetos` for the actor.
    pub(crate) fn visible_projects(&self, actor: &Actor) -> Filter {
        let mut filter = Filter::new();
        if actor.is_responsible() {
            filter.push_each(RESPONSIBLE_PROJECTS, [actor.id, actor.id]);
        }
        filter
    }

    /// RESPONSAVEL must manage the project or hold one of its tasks.
    pub(crate) fn check_project_access(&self, actor: &Actor, project: &Project) -> Result<()> {
        if !actor.is_responsible() || project.gerente_id == Some(actor.id) {
            return Ok(());
        }
        let has_task = self.exists(
            "SELECT 1 FROM tarefas_projeto WHERE projeto_id = ?1 AND responsavel_id = ?2 LIMIT 1",
            [project.id, actor.id],
        )?;
        ensure(has_task, "Voce so pode acessar projetos atribuidos a voce.")
    }

    pub(crate) fn load_project(&self, id: i64) -> Result<Project> {
        self.query_one(
            "SELECT * FROM projetos WHERE id = ?1",
            [id],
            Project::from_row,
            "Projeto nao encontrado.",
        )
    }

    fn check_project_code_free(&self, codigo: &str, except: Option<i64>) -> Result<()> {
        let taken = self.exists(
            "SELECT 1 FROM projetos WHERE lower(codigo) = lower(?1) AND id <> ?2 LIMIT 1",
            params![codigo, except.unwrap_or(0)],
        )?;
        if taken {
            return Err(ConformaError::Conflict(
                "Ja existe um projeto com este codigo.".to_string(),
            ));
        }
        Ok(())
    }

    fn save_project(&self, project: &Project) -> Result<Project> {
        self.conn().execute(
            "UPDATE projetos SET
                codigo = ?1, nome = ?2, descricao = ?3, status = ?4, prioridade = ?5,
                progresso = ?6, data_inicio = ?7, data_fim_prevista = ?8, data_fim_real = ?9,
                gerente_id = ?10, updated_at = ?11
             WHERE id = ?12",
            params![
                project.codigo,
                project.nome,
                project.descricao,
                project.status,
                project.prioridade,
                project.progresso,
                project.data_inicio,
                project.data_fim_prevista,
                project.data_fim_real,
                project.gerente_id,
                now(),
                project.id
            ],
        )?;
        self.load_project(project.id)
    }
}
