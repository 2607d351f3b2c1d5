//! # Project Tasks
//!
//! Tasks belong to a project. A RESPONSAVEL works only on tasks assigned to
//! them and may change just their status and logged hours.

use crate::access::{ANY_ROLE, CURATORS, ensure, require_roles};
use crate::primitives::{TITLE_LEN, check_len, check_non_negative};
use crate::rules::{TaskSchedule, settle_task_schedule};
use crate::storage::{Filter, Store, now, today};
use crate::{Actor, ConformaError, Priority, Result, TaskStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Row, params};
use serde::{Deserialize, Serialize};

/// A unit of work inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: i64,
    pub projeto_id: i64,
    pub titulo: String,
    pub descricao: Option<String>,
    pub status: TaskStatus,
    pub prioridade: Priority,
    pub responsavel_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<NaiveDate>,
    pub estimativa_horas: Option<i64>,
    pub horas_registradas: i64,
    pub ordem: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            projeto_id: row.get("projeto_id")?,
            titulo: row.get("titulo")?,
            descricao: row.get("descricao")?,
            status: row.get("status")?,
            prioridade: row.get("prioridade")?,
            responsavel_id: row.get("responsavel_id")?,
            start_date: row.get("start_date")?,
            due_date: row.get("due_date")?,
            completed_at: row.get("completed_at")?,
            estimativa_horas: row.get("estimativa_horas")?,
            horas_registradas: row.get("horas_registradas")?,
            ordem: row.get("ordem")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub(crate) fn is_assigned_to(&self, user_id: i64) -> bool {
        self.responsavel_id == Some(user_id)
    }

    fn schedule(&self) -> TaskSchedule {
        TaskSchedule {
            status: self.status,
            start_date: self.start_date,
            due_date: self.due_date,
            completed_at: self.completed_at,
        }
    }

    fn set_schedule(&mut self, schedule: TaskSchedule) {
        self.status = schedule.status;
        self.start_date = schedule.start_date;
        self.due_date = schedule.due_date;
        self.completed_at = schedule.completed_at;
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub titulo: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub prioridade: Priority,
    #[serde(default)]
    pub responsavel_id: Option<i64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub estimativa_horas: Option<i64>,
    #[serde(default)]
    pub horas_registradas: i64,
    #[serde(default)]
    pub ordem: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub descricao: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub prioridade: Option<Priority>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub responsavel_id: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub completed_at: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub estimativa_horas: Option<Option<i64>>,
    #[serde(default)]
    pub horas_registradas: Option<i64>,
    #[serde(default)]
    pub ordem: Option<i64>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.horas_registradas.is_none() && !self.touches_planning()
    }

    /// Anything beyond status and logged hours.
    fn touches_planning(&self) -> bool {
        self.titulo.is_some()
            || self.descricao.is_some()
            || self.prioridade.is_some()
            || self.responsavel_id.is_some()
            || self.start_date.is_some()
            || self.due_date.is_some()
            || self.completed_at.is_some()
            || self.estimativa_horas.is_some()
            || self.ordem.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub status_tarefa: Option<TaskStatus>,
    pub responsavel_id: Option<i64>,
    pub atrasadas: Option<bool>,
}

impl Store {
    /// Tasks of a visible project, in board order.
    pub fn list_tasks(&self, actor: &Actor, projeto_id: i64, query: &TaskFilter) -> Result<Vec<Task>> {
        let project = self.load_project(projeto_id)?;
        self.check_project_access(actor, &project)?;

        let mut filter = Filter::new();
        filter.push("projeto_id = ?", projeto_id);
        filter.eq("status", query.status_tarefa);
        filter.eq("responsavel_id", query.responsavel_id);
        if query.atrasadas == Some(true) {
            filter.push("due_date IS NOT NULL AND due_date < ?", today());
            filter.raw("status <> 'concluida'");
        }
        if actor.is_responsible() {
            filter.push("responsavel_id = ?", actor.id);
        }
        self.query_list(
            &format!(
                "SELECT * FROM tarefas_projeto{} ORDER BY ordem ASC, due_date ASC NULLS LAST, id DESC",
                filter.where_sql()
            ),
            filter.params(),
            Task::from_row,
        )
    }

    /// Add a task to a project. ADMIN/GESTOR/AUDITOR.
    pub fn create_task(&self, actor: &Actor, projeto_id: i64, input: &NewTask) -> Result<Task> {
        require_roles(actor, CURATORS)?;
        self.load_project(projeto_id)?;
        if let Some(user) = input.responsavel_id {
            self.require_user(user)?;
        }
        check_len("titulo", &input.titulo, TITLE_LEN)?;
        check_non_negative("estimativa_horas", input.estimativa_horas)?;
        check_non_negative("horas_registradas", Some(input.horas_registradas))?;
        check_non_negative("ordem", Some(input.ordem))?;

        let mut schedule = TaskSchedule {
            status: input.status,
            start_date: input.start_date,
            due_date: input.due_date,
            completed_at: None,
        };
        settle_task_schedule(&mut schedule, false, false, today())?;

        let ts = now();
        self.conn().execute(
            "INSERT INTO tarefas_projeto
                (projeto_id, titulo, descricao, status, prioridade, responsavel_id, start_date,
                 due_date, completed_at, estimativa_horas, horas_registradas, ordem,
                 created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
            params![
                projeto_id,
                input.titulo,
                input.descricao,
                schedule.status,
                input.prioridade,
                input.responsavel_id,
                schedule.start_date,
                schedule.due_date,
                schedule.completed_at,
                input.estimativa_horas,
                input.horas_registradas,
                input.ordem,
                actor.id,
                ts
            ],
        )?;
        self.load_task(self.last_id())
    }

    /// Update the sent fields.
    ///
    /// ADMIN/GESTOR/AUDITOR may change anything; a RESPONSAVEL only the
    /// status and logged hours of their own tasks.
    pub fn update_task(&self, actor: &Actor, id: i64, update: &TaskUpdate) -> Result<Task> {
        let mut task = self.load_task(id)?;
        if update.is_empty() {
            return Err(ConformaError::Validation(
                "Nenhum campo informado para atualizacao.".to_string(),
            ));
        }

        if actor.is_responsible() {
            ensure(
                task.is_assigned_to(actor.id),
                "Voce so pode atualizar tarefas atribuidas a voce.",
            )?;
            ensure(
                !update.touches_planning(),
                "Responsavel so pode atualizar status e horas registradas.",
            )?;
        } else {
            require_roles(actor, CURATORS)?;
        }

        if let Some(Some(user)) = update.responsavel_id {
            self.require_user(user)?;
        }
        if let Some(titulo) = &update.titulo {
            check_len("titulo", titulo, TITLE_LEN)?;
            task.titulo = titulo.clone();
        }
        if let Some(estimativa) = update.estimativa_horas {
            check_non_negative("estimativa_horas", estimativa)?;
            task.estimativa_horas = estimativa;
        }
        if let Some(horas) = update.horas_registradas {
            check_non_negative("horas_registradas", Some(horas))?;
            task.horas_registradas = horas;
        }
        if let Some(ordem) = update.ordem {
            check_non_negative("ordem", Some(ordem))?;
            task.ordem = ordem;
        }
        if let Some(descricao) = &update.descricao {
            task.descricao = descricao.clone();
        }
        if let Some(prioridade) = update.prioridade {
            task.prioridade = prioridade;
        }
        if let Some(responsavel_id) = update.responsavel_id {
            task.responsavel_id = responsavel_id;
        }

        let mut schedule = task.schedule();
        if let Some(status) = update.status {
            schedule.status = status;
        }
        if let Some(start_date) = update.start_date {
            schedule.start_date = start_date;
        }
        if let Some(due_date) = update.due_date {
            schedule.due_date = due_date;
        }
        if let Some(completed_at) = update.completed_at {
            schedule.completed_at = completed_at;
        }
        settle_task_schedule(
            &mut schedule,
            update.status.is_some(),
            update.completed_at.is_some(),
            today(),
        )?;
        task.set_schedule(schedule);

        self.save_task(&task)
    }

    /// Change only the status. Any role; RESPONSAVEL only on their own tasks.
    pub fn change_task_status(&self, actor: &Actor, id: i64, status: TaskStatus) -> Result<Task> {
        let mut task = self.load_task(id)?;
        if actor.is_responsible() {
            ensure(
                task.is_assigned_to(actor.id),
                "Voce so pode atualizar status de tarefas atribuidas a voce.",
            )?;
        }
        require_roles(actor, ANY_ROLE)?;

        let mut schedule = task.schedule();
        schedule.status = status;
        settle_task_schedule(&mut schedule, true, false, today())?;
        task.set_schedule(schedule);
        self.save_task(&task)
    }

    /// Delete a task. ADMIN/GESTOR/AUDITOR.
    pub fn delete_task(&self, actor: &Actor, id: i64) -> Result<()> {
        require_roles(actor, CURATORS)?;
        self.load_task(id)?;
        self.conn()
            .execute("DELETE FROM tarefas_projeto WHERE id = ?1", [id])?;
        Ok(())
    }

    pub(crate) fn load_task(&self, id: i64) -> Result<Task> {
        self.query_one(
            "SELECT * FROM tarefas_projeto WHERE id = ?1",
            [id],
            Task::from_row,
            "Tarefa nao encontrada.",
        )
    }

    fn save_task(&self, task: &Task) -> Result<Task> {
        self.conn().execute(
            "UPDATE tarefas_projeto SET
                titulo = ?1, descricao = ?2, status = ?3, prioridade = ?4, responsavel_id = ?5,
                start_date = ?6, due_date = ?7, completed_at = ?8, estimativa_horas = ?9,
                horas_registradas = ?10, ordem = ?11, updated_at = ?12
             WHERE id = ?13",
            params![
                task.titulo,
                task.descricao,
                task.status,
                task.prioridade,
                task.responsavel_id,
                task.start_date,
                task.due_date,
                task.completed_at,
                task.estimativa_horas,
                task.horas_registradas,
                task.ordem,
                now(),
                task.id
            ],
        )?;
        self.load_task(task.id)
    }
}
