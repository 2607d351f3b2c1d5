//! # Criterion Monitoring
//!
//! One record per (program, audit, criterion, month). Moving a criterion to
//! `alerta` or `critico` raises a monitoring notification, or escalates the
//! one still open for the record.

use crate::access::{CURATORS, MANAGERS, require_roles};
use crate::rules::{degradation_severity, month_start};
use crate::storage::{Filter, Store, now};
use crate::{Actor, ConformaError, MonitoringStatus, NotificationStatus, Priority, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

/// Monthly compliance status of a criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Monitoring {
    pub id: i64,
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub criterio_id: i64,
    pub mes_referencia: NaiveDate,
    pub status_monitoramento: MonitoringStatus,
    pub observacoes: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Monitoring {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            auditoria_ano_id: row.get("auditoria_ano_id")?,
            criterio_id: row.get("criterio_id")?,
            mes_referencia: row.get("mes_referencia")?,
            status_monitoramento: row.get("status_monitoramento")?,
            observacoes: row.get("observacoes")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMonitoring {
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub criterio_id: i64,
    /// Any day of the month; stored as the first day.
    pub mes_referencia: NaiveDate,
    #[serde(default)]
    pub status_monitoramento: MonitoringStatus,
    #[serde(default)]
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitoringUpdate {
    #[serde(default)]
    pub mes_referencia: Option<NaiveDate>,
    #[serde(default)]
    pub status_monitoramento: Option<MonitoringStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub observacoes: Option<Option<String>>,
}

impl MonitoringUpdate {
    pub fn is_empty(&self) -> bool {
        self.mes_referencia.is_none()
            && self.status_monitoramento.is_none()
            && self.observacoes.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitoringFilter {
    pub programa_id: Option<i64>,
    pub auditoria_ano_id: Option<i64>,
    pub criterio_id: Option<i64>,
    pub status: Option<MonitoringStatus>,
    /// Any day of the month to list.
    pub mes: Option<NaiveDate>,
}

const DUPLICATE_MONTH: &str = "Ja existe monitoramento para este criterio no mes informado.";

impl Store {
    /// Record the monthly status of a criterion. ADMIN/GESTOR/AUDITOR.
    pub fn create_monitoring(&self, actor: &Actor, input: &NewMonitoring) -> Result<Monitoring> {
        require_roles(actor, CURATORS)?;
        self.require_audit_in_program(input.auditoria_ano_id, input.programa_id)?;
        self.require_criterion_in_program(input.criterio_id, input.programa_id)?;

        let mes = month_start(input.mes_referencia);
        let key = (input.programa_id, input.auditoria_ano_id, input.criterio_id);
        self.check_month_free(key, mes, None)?;

        let tx = self.conn().unchecked_transaction()?;
        let ts = now();
        tx.execute(
            "INSERT INTO monitoramentos_criterio
                (programa_id, auditoria_ano_id, criterio_id, mes_referencia,
                 status_monitoramento, observacoes, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                input.programa_id,
                input.auditoria_ano_id,
                input.criterio_id,
                mes,
                input.status_monitoramento,
                input.observacoes,
                actor.id,
                ts
            ],
        )?;
        let record = self.load_monitoring(self.last_id())?;
        self.raise_on_degradation(actor, &record, None)?;
        tx.commit()?;
        Ok(record)
    }

    /// Monitoring records, most recent month first.
    pub fn list_monitorings(&self, query: &MonitoringFilter) -> Result<Vec<Monitoring>> {
        let mut filter = Filter::new();
        filter.eq("programa_id", query.programa_id);
        filter.eq("auditoria_ano_id", query.auditoria_ano_id);
        filter.eq("criterio_id", query.criterio_id);
        filter.eq("status_monitoramento", query.status);
        filter.eq("mes_referencia", query.mes.map(month_start));
        self.query_list(
            &format!(
                "SELECT * FROM monitoramentos_criterio{} ORDER BY mes_referencia DESC, id DESC",
                filter.where_sql()
            ),
            filter.params(),
            Monitoring::from_row,
        )
    }

    /// One monitoring record.
    pub fn monitoring(&self, id: i64) -> Result<Monitoring> {
        self.load_monitoring(id)
    }

    /// Update a monitoring record. ADMIN/GESTOR/AUDITOR.
    pub fn update_monitoring(
        &self,
        actor: &Actor,
        id: i64,
        update: &MonitoringUpdate,
    ) -> Result<Monitoring> {
        require_roles(actor, CURATORS)?;
        if update.is_empty() {
            return Err(ConformaError::Validation(
                "Nenhum campo informado para atualizacao.".to_string(),
            ));
        }
        let mut record = self.load_monitoring(id)?;
        let previous = record.status_monitoramento;

        if let Some(mes) = update.mes_referencia {
            let mes = month_start(mes);
            if mes != record.mes_referencia {
                let key = (record.programa_id, record.auditoria_ano_id, record.criterio_id);
                self.check_month_free(key, mes, Some(id))?;
                record.mes_referencia = mes;
            }
        }
        if let Some(status) = update.status_monitoramento {
            record.status_monitoramento = status;
        }
        if let Some(observacoes) = &update.observacoes {
            record.observacoes = observacoes.clone();
        }

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "UPDATE monitoramentos_criterio SET
                mes_referencia = ?1, status_monitoramento = ?2, observacoes = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                record.mes_referencia,
                record.status_monitoramento,
                record.observacoes,
                now(),
                id
            ],
        )?;
        let record = self.load_monitoring(id)?;
        self.raise_on_degradation(actor, &record, Some(previous))?;
        tx.commit()?;
        Ok(record)
    }

    /// Delete a monitoring record and its notifications. ADMIN/GESTOR.
    pub fn delete_monitoring(&self, actor: &Actor, id: i64) -> Result<()> {
        require_roles(actor, MANAGERS)?;
        self.load_monitoring(id)?;
        self.conn()
            .execute("DELETE FROM monitoramentos_criterio WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Open or escalate the record's notification when its status worsened.
    fn raise_on_degradation(
        &self,
        actor: &Actor,
        record: &Monitoring,
        previous: Option<MonitoringStatus>,
    ) -> Result<()> {
        let Some(severity) = degradation_severity(previous, record.status_monitoramento) else {
            return Ok(());
        };

        let open: Option<(i64, Priority)> = self
            .conn()
            .query_row(
                "SELECT id, severidade FROM notificacoes_monitoramento
                 WHERE monitoramento_id = ?1 AND status_notificacao IN (?2, ?3)
                 ORDER BY id DESC LIMIT 1",
                params![
                    record.id,
                    NotificationStatus::Aberta,
                    NotificationStatus::EmTratamento
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some((notification_id, current)) = open {
            if current >= severity {
                return Ok(());
            }
            self.conn().execute(
                "UPDATE notificacoes_monitoramento SET severidade = ?1, updated_at = ?2 WHERE id = ?3",
                params![severity, now(), notification_id],
            )?;
            tracing::info!(
                event = "notification_escalated",
                notification = notification_id,
                monitoring = record.id,
                severity = severity.as_str()
            );
            return Ok(());
        }

        let codigo: String = self.conn().query_row(
            "SELECT codigo FROM criterios WHERE id = ?1",
            [record.criterio_id],
            |row| row.get(0),
        )?;
        let status = record.status_monitoramento;
        let ts = now();
        self.conn().execute(
            "INSERT INTO notificacoes_monitoramento
                (programa_id, auditoria_ano_id, criterio_id, monitoramento_id, titulo, descricao,
                 severidade, status_notificacao, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                record.programa_id,
                record.auditoria_ano_id,
                record.criterio_id,
                record.id,
                format!("Criterio {} em {}", codigo, status.label()),
                format!(
                    "Monitoramento de {} registrado como {}.",
                    record.mes_referencia.format("%m/%Y"),
                    status.label()
                ),
                severity,
                NotificationStatus::Aberta,
                actor.id,
                ts
            ],
        )?;
        let notification_id = self.last_id();
        tracing::info!(
            event = "notification_raised",
            notification = notification_id,
            monitoring = record.id,
            severity = severity.as_str()
        );
        Ok(())
    }

    pub(crate) fn load_monitoring(&self, id: i64) -> Result<Monitoring> {
        self.query_one(
            "SELECT * FROM monitoramentos_criterio WHERE id = ?1",
            [id],
            Monitoring::from_row,
            "Monitoramento nao encontrado.",
        )
    }

    /// `key` is (program, audit, criterion).
    fn check_month_free(
        &self,
        (programa_id, auditoria_ano_id, criterio_id): (i64, i64, i64),
        mes: NaiveDate,
        except: Option<i64>,
    ) -> Result<()> {
        let taken = self.exists(
            "SELECT 1 FROM monitoramentos_criterio
             WHERE programa_id = ?1 AND auditoria_ano_id = ?2 AND criterio_id = ?3
               AND mes_referencia = ?4 AND id <> ?5",
            params![
                programa_id,
                auditoria_ano_id,
                criterio_id,
                mes,
                except.unwrap_or(0)
            ],
        )?;
        if taken {
            return Err(ConformaError::Conflict(DUPLICATE_MONTH.to_string()));
        }
        Ok(())
    }
}
