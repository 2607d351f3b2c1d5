//! # Monitoring Notifications
//!
//! Alerts bound to a monitoring record, with an owner, a deadline and a
//! list of resolutions. Status changes follow
//! [`NotificationStatus::can_transition_to`]; resolving needs at least one
//! resolution on record.

use crate::access::{CURATORS, MANAGERS, ensure, require_roles};
use crate::primitives::{TITLE_LEN, check_len, is_filled};
use crate::storage::{Filter, Store, now, today};
use crate::{Actor, ConformaError, NotificationStatus, Priority, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Row, params};
use serde::{Deserialize, Serialize};

/// An alert raised from a monitoring record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub criterio_id: i64,
    pub monitoramento_id: i64,
    pub titulo: String,
    pub descricao: Option<String>,
    pub severidade: Priority,
    pub status_notificacao: NotificationStatus,
    pub responsavel_id: Option<i64>,
    pub prazo: Option<NaiveDate>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            auditoria_ano_id: row.get("auditoria_ano_id")?,
            criterio_id: row.get("criterio_id")?,
            monitoramento_id: row.get("monitoramento_id")?,
            titulo: row.get("titulo")?,
            descricao: row.get("descricao")?,
            severidade: row.get("severidade")?,
            status_notificacao: row.get("status_notificacao")?,
            responsavel_id: row.get("responsavel_id")?,
            prazo: row.get("prazo")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn is_assigned_to(&self, user_id: i64) -> bool {
        self.responsavel_id == Some(user_id)
    }
}

/// A treatment recorded against a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub id: i64,
    pub programa_id: i64,
    pub notificacao_id: i64,
    pub descricao: String,
    pub resultado: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl Resolution {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            notificacao_id: row.get("notificacao_id")?,
            descricao: row.get("descricao")?,
            resultado: row.get("resultado")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
    pub monitoramento_id: i64,
    pub titulo: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub severidade: Priority,
    #[serde(default)]
    pub responsavel_id: Option<i64>,
    #[serde(default)]
    pub prazo: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationUpdate {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub descricao: Option<Option<String>>,
    #[serde(default)]
    pub severidade: Option<Priority>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub responsavel_id: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub prazo: Option<Option<NaiveDate>>,
}

impl NotificationUpdate {
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none()
            && self.descricao.is_none()
            && self.severidade.is_none()
            && self.responsavel_id.is_none()
            && self.prazo.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewResolution {
    pub descricao: String,
    #[serde(default)]
    pub resultado: Option<String>,
    /// Also move the notification to `resolvida`.
    #[serde(default)]
    pub resolver: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationFilter {
    pub programa_id: Option<i64>,
    pub auditoria_ano_id: Option<i64>,
    pub status: Option<NotificationStatus>,
    pub severidade: Option<Priority>,
    pub responsavel_id: Option<i64>,
    pub vencidas: Option<bool>,
}

const NOT_ASSIGNED: &str = "Voce so pode acessar notificacoes atribuidas a voce.";

impl Store {
    /// Open a notification by hand. ADMIN/GESTOR/AUDITOR.
    pub fn create_notification(
        &self,
        actor: &Actor,
        input: &NewNotification,
    ) -> Result<Notification> {
        require_roles(actor, CURATORS)?;
        check_len("titulo", &input.titulo, TITLE_LEN)?;
        let record = self.load_monitoring(input.monitoramento_id)?;
        if let Some(user) = input.responsavel_id {
            self.require_user(user)?;
        }

        let ts = now();
        self.conn().execute(
            "INSERT INTO notificacoes_monitoramento
                (programa_id, auditoria_ano_id, criterio_id, monitoramento_id, titulo, descricao,
                 severidade, status_notificacao, responsavel_id, prazo, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                record.programa_id,
                record.auditoria_ano_id,
                record.criterio_id,
                record.id,
                input.titulo,
                input.descricao,
                input.severidade,
                NotificationStatus::Aberta,
                input.responsavel_id,
                input.prazo,
                actor.id,
                ts
            ],
        )?;
        self.load_notification(self.last_id())
    }

    /// Notifications visible to the actor, earliest deadline first.
    pub fn list_notifications(
        &self,
        actor: &Actor,
        query: &NotificationFilter,
    ) -> Result<Vec<Notification>> {
        let mut filter = Filter::new();
        filter.eq("programa_id", query.programa_id);
        filter.eq("auditoria_ano_id", query.auditoria_ano_id);
        filter.eq("status_notificacao", query.status);
        filter.eq("severidade", query.severidade);
        filter.eq("responsavel_id", query.responsavel_id);
        if query.vencidas == Some(true) {
            filter.push("prazo IS NOT NULL AND prazo < ?", today());
            filter.raw("status_notificacao IN ('aberta', 'em_tratamento')");
        }
        if actor.is_responsible() {
            filter.push("responsavel_id = ?", actor.id);
        }

        self.query_list(
            &format!(
                "SELECT * FROM notificacoes_monitoramento{} ORDER BY prazo ASC NULLS LAST, id DESC",
                filter.where_sql()
            ),
            filter.params(),
            Notification::from_row,
        )
    }

    /// One notification. RESPONSAVEL only sees their own.
    pub fn notification(&self, actor: &Actor, id: i64) -> Result<Notification> {
        let notification = self.load_notification(id)?;
        if actor.is_responsible() {
            ensure(notification.is_assigned_to(actor.id), NOT_ASSIGNED)?;
        }
        Ok(notification)
    }

    /// Edit descriptive fields. ADMIN/GESTOR/AUDITOR.
    pub fn update_notification(
        &self,
        actor: &Actor,
        id: i64,
        update: &NotificationUpdate,
    ) -> Result<Notification> {
        require_roles(actor, CURATORS)?;
        if update.is_empty() {
            return Err(ConformaError::Validation(
                "Nenhum campo informado para atualizacao.".to_string(),
            ));
        }
        let mut notification = self.load_notification(id)?;

        if let Some(titulo) = &update.titulo {
            check_len("titulo", titulo, TITLE_LEN)?;
            notification.titulo = titulo.clone();
        }
        if let Some(descricao) = &update.descricao {
            notification.descricao = descricao.clone();
        }
        if let Some(severidade) = update.severidade {
            notification.severidade = severidade;
        }
        if let Some(responsavel_id) = update.responsavel_id {
            if let Some(user) = responsavel_id {
                self.require_user(user)?;
            }
            notification.responsavel_id = responsavel_id;
        }
        if let Some(prazo) = update.prazo {
            notification.prazo = prazo;
        }

        self.conn().execute(
            "UPDATE notificacoes_monitoramento SET
                titulo = ?1, descricao = ?2, severidade = ?3, responsavel_id = ?4, prazo = ?5,
                updated_at = ?6
             WHERE id = ?7",
            params![
                notification.titulo,
                notification.descricao,
                notification.severidade,
                notification.responsavel_id,
                notification.prazo,
                now(),
                id
            ],
        )?;
        self.load_notification(id)
    }

    /// Move a notification to `next`.
    ///
    /// - reopening a resolved/cancelled notification is for ADMIN/GESTOR
    /// - RESPONSAVEL handles only their own notifications and cannot cancel
    /// - resolving requires at least one resolution
    pub fn change_notification_status(
        &self,
        actor: &Actor,
        id: i64,
        next: NotificationStatus,
    ) -> Result<Notification> {
        let notification = self.load_notification(id)?;
        let current = notification.status_notificacao;

        if actor.is_responsible() {
            ensure(notification.is_assigned_to(actor.id), NOT_ASSIGNED)?;
            ensure(
                next != NotificationStatus::Cancelada,
                "Responsavel nao pode cancelar notificacoes.",
            )?;
        }
        if !current.is_open() && next == NotificationStatus::Aberta {
            require_roles(actor, MANAGERS)?;
        }
        if !current.can_transition_to(next) {
            return Err(ConformaError::Validation(format!(
                "Transicao de status invalida: {} -> {}.",
                current, next
            )));
        }
        if next == NotificationStatus::Resolvida && self.resolution_count(id)? == 0 {
            return Err(ConformaError::Validation(
                "Registre uma resolucao antes de resolver a notificacao.".to_string(),
            ));
        }

        self.set_notification_status(id, next)?;
        tracing::info!(
            event = "notification_status_changed",
            notification = id,
            from = current.as_str(),
            to = next.as_str(),
            actor = actor.id
        );
        self.load_notification(id)
    }

    /// Resolutions of a notification, oldest first.
    pub fn list_resolutions(&self, actor: &Actor, notification_id: i64) -> Result<Vec<Resolution>> {
        self.notification(actor, notification_id)?;
        self.query_list(
            "SELECT * FROM resolucoes_notificacao WHERE notificacao_id = ?1 ORDER BY id",
            [notification_id],
            Resolution::from_row,
        )
    }

    /// Record a resolution; optionally resolve the notification with it.
    ///
    /// Allowed for ADMIN/GESTOR/AUDITOR and the notification's responsible.
    pub fn create_resolution(
        &self,
        actor: &Actor,
        notification_id: i64,
        input: &NewResolution,
    ) -> Result<Resolution> {
        let notification = self.load_notification(notification_id)?;
        ensure(
            actor.has_role(CURATORS) || notification.is_assigned_to(actor.id),
            NOT_ASSIGNED,
        )?;
        if !is_filled(Some(input.descricao.as_str())) {
            return Err(ConformaError::Validation(
                "Informe a descricao da resolucao.".to_string(),
            ));
        }
        if !notification.status_notificacao.is_open() {
            return Err(ConformaError::Validation(
                "Notificacao encerrada nao aceita novas resolucoes.".to_string(),
            ));
        }

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO resolucoes_notificacao
                (programa_id, notificacao_id, descricao, resultado, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                notification.programa_id,
                notification_id,
                input.descricao,
                input.resultado,
                actor.id,
                now()
            ],
        )?;
        let resolution_id = self.last_id();
        if input.resolver {
            self.set_notification_status(notification_id, NotificationStatus::Resolvida)?;
            tracing::info!(event = "notification_resolved", notification = notification_id);
        }
        tx.commit()?;

        self.query_one(
            "SELECT * FROM resolucoes_notificacao WHERE id = ?1",
            [resolution_id],
            Resolution::from_row,
            "Resolucao nao encontrada.",
        )
    }

    fn resolution_count(&self, notification_id: i64) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM resolucoes_notificacao WHERE notificacao_id = ?1",
            [notification_id],
            |row| row.get(0),
        )?)
    }

    fn set_notification_status(&self, id: i64, status: NotificationStatus) -> Result<()> {
        self.conn().execute(
            "UPDATE notificacoes_monitoramento SET status_notificacao = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, now(), id],
        )?;
        Ok(())
    }

    fn load_notification(&self, id: i64) -> Result<Notification> {
        self.query_one(
            "SELECT * FROM notificacoes_monitoramento WHERE id = ?1",
            [id],
            Notification::from_row,
            "Notificacao nao encontrada.",
        )
    }
}
