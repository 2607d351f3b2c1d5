//! # Task Activities
//!
//! Checklist items inside a task (sub-demand activities). Curators and the
//! task's responsible keep the checklist; visibility follows the project.

use crate::access::{CURATORS, ensure, require_roles};
use crate::primitives::{TITLE_LEN, check_len, check_non_negative};
use crate::storage::{Filter, Store, now};
use crate::tasks::Task;
use crate::{ActivityStatus, Actor, ConformaError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use serde::{Deserialize, Serialize};

/// A checklist item of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub id: i64,
    pub tarefa_id: i64,
    pub titulo: String,
    pub descricao: Option<String>,
    pub status: ActivityStatus,
    pub ordem: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            tarefa_id: row.get("tarefa_id")?,
            titulo: row.get("titulo")?,
            descricao: row.get("descricao")?,
            status: row.get("status")?,
            ordem: row.get("ordem")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewActivity {
    pub titulo: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default)]
    pub ordem: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityUpdate {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub descricao: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<ActivityStatus>,
    #[serde(default)]
    pub ordem: Option<i64>,
}

impl ActivityUpdate {
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none()
            && self.descricao.is_none()
            && self.status.is_none()
            && self.ordem.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    pub status_atividade: Option<ActivityStatus>,
}

impl Store {
    /// Activities of a task the actor can see, in checklist order.
    pub fn list_activities(
        &self,
        actor: &Actor,
        tarefa_id: i64,
        query: &ActivityFilter,
    ) -> Result<Vec<Activity>> {
        let task = self.load_task(tarefa_id)?;
        self.check_task_visible(actor, &task)?;

        let mut filter = Filter::new();
        filter.push("tarefa_id = ?", tarefa_id);
        filter.eq("status", query.status_atividade);
        self.query_list(
            &format!(
                "SELECT * FROM atividades_subdemanda{} ORDER BY ordem ASC, id ASC",
                filter.where_sql()
            ),
            filter.params(),
            Activity::from_row,
        )
    }

    /// Add an activity to a task.
    pub fn create_activity(
        &self,
        actor: &Actor,
        tarefa_id: i64,
        input: &NewActivity,
    ) -> Result<Activity> {
        let task = self.load_task(tarefa_id)?;
        check_task_keeper(actor, &task)?;
        check_len("titulo", &input.titulo, TITLE_LEN)?;
        check_non_negative("ordem", Some(input.ordem))?;

        let ts = now();
        self.conn().execute(
            "INSERT INTO atividades_subdemanda
                (tarefa_id, titulo, descricao, status, ordem, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                tarefa_id,
                input.titulo,
                input.descricao,
                input.status,
                input.ordem,
                actor.id,
                ts
            ],
        )?;
        self.load_activity(self.last_id())
    }

    /// Update the sent fields.
    pub fn update_activity(
        &self,
        actor: &Actor,
        id: i64,
        update: &ActivityUpdate,
    ) -> Result<Activity> {
        let mut activity = self.load_activity(id)?;
        if update.is_empty() {
            return Err(ConformaError::Validation(
                "Nenhum campo informado para atualizacao.".to_string(),
            ));
        }
        let task = self.load_task(activity.tarefa_id)?;
        check_task_keeper(actor, &task)?;

        if let Some(titulo) = &update.titulo {
            check_len("titulo", titulo, TITLE_LEN)?;
            activity.titulo = titulo.clone();
        }
        if let Some(ordem) = update.ordem {
            check_non_negative("ordem", Some(ordem))?;
            activity.ordem = ordem;
        }
        if let Some(descricao) = &update.descricao {
            activity.descricao = descricao.clone();
        }
        if let Some(status) = update.status {
            activity.status = status;
        }
        self.save_activity(&activity)
    }

    /// Tick or untick an activity.
    pub fn change_activity_status(
        &self,
        actor: &Actor,
        id: i64,
        status: ActivityStatus,
    ) -> Result<Activity> {
        let mut activity = self.load_activity(id)?;
        let task = self.load_task(activity.tarefa_id)?;
        check_task_keeper(actor, &task)?;
        activity.status = status;
        self.save_activity(&activity)
    }

    /// Delete an activity. ADMIN/GESTOR/AUDITOR, or the task's responsible.
    pub fn delete_activity(&self, actor: &Actor, id: i64) -> Result<()> {
        let activity = self.load_activity(id)?;
        let task = self.load_task(activity.tarefa_id)?;
        check_task_keeper(actor, &task)?;
        self.conn()
            .execute("DELETE FROM atividades_subdemanda WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Project visibility, and for RESPONSAVEL the task must be theirs.
    fn check_task_visible(&self, actor: &Actor, task: &Task) -> Result<()> {
        let project = self.load_project(task.projeto_id)?;
        self.check_project_access(actor, &project)?;
        if actor.is_responsible() {
            ensure(
                task.is_assigned_to(actor.id),
                "Voce so pode acessar tarefas atribuidas a voce.",
            )?;
        }
        Ok(())
    }

    fn load_activity(&self, id: i64) -> Result<Activity> {
        self.query_one(
            "SELECT * FROM atividades_subdemanda WHERE id = ?1",
            [id],
            Activity::from_row,
            "Atividade nao encontrada.",
        )
    }

    fn save_activity(&self, activity: &Activity) -> Result<Activity> {
        self.conn().execute(
            "UPDATE atividades_subdemanda SET
                titulo = ?1, descricao = ?2, status = ?3, ordem = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                activity.titulo,
                activity.descricao,
                activity.status,
                activity.ordem,
                now(),
                activity.id
            ],
        )?;
        self.load_activity(activity.id)
    }
}

/// Curators, or the responsible of the task.
fn check_task_keeper(actor: &Actor, task: &Task) -> Result<()> {
    if actor.is_responsible() {
        ensure(
            task.is_assigned_to(actor.id),
            "Voce so pode atualizar tarefas atribuidas a voce.",
        )
    } else {
        require_roles(actor, CURATORS)
    }
}
