//! # Audit Domain Registry
//!
//! Certification programs and the records hanging off them: yearly audits,
//! criteria, evidences, indicator evaluations and demands. Documents,
//! monitoring and analyses reference these rows and rely on the
//! consistency checks exposed here (`require_audit_in_program`, ...).

use crate::access::{CURATORS, MANAGERS, require_roles};
use crate::primitives::{
    AUDIT_YEAR_RANGE, CRITERION_CODE_LEN, NAME_LEN, PROJECT_CODE_LEN, TITLE_LEN, check_len,
    check_range,
};
use crate::storage::{Filter, Store, now};
use crate::{Actor, ConformaError, DemandStatus, EvaluationResult, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use serde::{Deserialize, Serialize};

// =============================================================================
// RECORDS
// =============================================================================

/// A certification program under audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Program {
    pub id: i64,
    pub codigo: String,
    pub nome: String,
    pub descricao: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A yearly audit cycle of a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditYear {
    pub id: i64,
    pub programa_id: i64,
    pub ano: i64,
    pub descricao: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An audit criterion of a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Criterion {
    pub id: i64,
    pub programa_id: i64,
    pub codigo: String,
    pub titulo: String,
    pub descricao: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Evidence expected for a criterion in a given audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub id: i64,
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub criterio_id: i64,
    pub titulo: String,
    pub descricao: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Outcome recorded for a criterion in a given audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub id: i64,
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub criterio_id: i64,
    pub resultado: EvaluationResult,
    pub observacoes: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// An action demanded by an audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Demand {
    pub id: i64,
    pub programa_id: i64,
    pub auditoria_ano_id: Option<i64>,
    pub titulo: String,
    pub descricao: Option<String>,
    pub status: DemandStatus,
    pub responsavel_id: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl Program {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            codigo: row.get("codigo")?,
            nome: row.get("nome")?,
            descricao: row.get("descricao")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl AuditYear {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            ano: row.get("ano")?,
            descricao: row.get("descricao")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl Criterion {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            codigo: row.get("codigo")?,
            titulo: row.get("titulo")?,
            descricao: row.get("descricao")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl Evidence {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            auditoria_ano_id: row.get("auditoria_ano_id")?,
            criterio_id: row.get("criterio_id")?,
            titulo: row.get("titulo")?,
            descricao: row.get("descricao")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl Evaluation {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            auditoria_ano_id: row.get("auditoria_ano_id")?,
            criterio_id: row.get("criterio_id")?,
            resultado: row.get("resultado")?,
            observacoes: row.get("observacoes")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl Demand {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            auditoria_ano_id: row.get("auditoria_ano_id")?,
            titulo: row.get("titulo")?,
            descricao: row.get("descricao")?,
            status: row.get("status")?,
            responsavel_id: row.get("responsavel_id")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
        })
    }
}

// =============================================================================
// INPUTS
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct NewProgram {
    pub codigo: String,
    pub nome: String,
    #[serde(default)]
    pub descricao: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAuditYear {
    pub ano: i64,
    #[serde(default)]
    pub descricao: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCriterion {
    pub codigo: String,
    pub titulo: String,
    #[serde(default)]
    pub descricao: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvidence {
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub criterio_id: i64,
    pub titulo: String,
    #[serde(default)]
    pub descricao: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvaluation {
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub criterio_id: i64,
    pub resultado: EvaluationResult,
    #[serde(default)]
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDemand {
    pub programa_id: i64,
    #[serde(default)]
    pub auditoria_ano_id: Option<i64>,
    pub titulo: String,
    #[serde(default)]
    pub descricao: Option<String>,
    #[serde(default)]
    pub status: DemandStatus,
    #[serde(default)]
    pub responsavel_id: Option<i64>,
}

/// Filters shared by the evidence, evaluation and demand listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditScope {
    pub programa_id: Option<i64>,
    pub auditoria_ano_id: Option<i64>,
    pub criterio_id: Option<i64>,
}

impl AuditScope {
    fn filter(&self, with_criterion: bool) -> Filter {
        let mut filter = Filter::new();
        filter.eq("programa_id", self.programa_id);
        filter.eq("auditoria_ano_id", self.auditoria_ano_id);
        if with_criterion {
            filter.eq("criterio_id", self.criterio_id);
        }
        filter
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

impl Store {
    /// Create a certification program. ADMIN/GESTOR.
    pub fn create_program(&self, actor: &Actor, input: &NewProgram) -> Result<Program> {
        require_roles(actor, MANAGERS)?;
        let codigo = input.codigo.trim();
        check_len("codigo", codigo, PROJECT_CODE_LEN)?;
        check_len("nome", &input.nome, NAME_LEN)?;
        if self.exists(
            "SELECT 1 FROM programas_certificacao WHERE codigo = ?1",
            [codigo],
        )? {
            return Err(ConformaError::Conflict(
                "Ja existe um programa com este codigo.".to_string(),
            ));
        }

        let ts = now();
        self.conn().execute(
            "INSERT INTO programas_certificacao (codigo, nome, descricao, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![codigo, input.nome, input.descricao, actor.id, ts],
        )?;
        self.program(self.last_id())
    }

    /// Every program ordered by code.
    pub fn list_programs(&self) -> Result<Vec<Program>> {
        self.query_list(
            "SELECT * FROM programas_certificacao ORDER BY codigo",
            [],
            Program::from_row,
        )
    }

    /// One program by id.
    pub fn program(&self, id: i64) -> Result<Program> {
        self.query_one(
            "SELECT * FROM programas_certificacao WHERE id = ?1",
            [id],
            Program::from_row,
            "Programa nao encontrado.",
        )
    }

    /// Open a yearly audit for a program. ADMIN/GESTOR.
    pub fn create_audit_year(
        &self,
        actor: &Actor,
        programa_id: i64,
        input: &NewAuditYear,
    ) -> Result<AuditYear> {
        require_roles(actor, MANAGERS)?;
        self.program(programa_id)?;
        check_range("ano", input.ano, AUDIT_YEAR_RANGE)?;
        if self.exists(
            "SELECT 1 FROM auditorias_ano WHERE programa_id = ?1 AND ano = ?2",
            [programa_id, input.ano],
        )? {
            return Err(ConformaError::Conflict(
                "Ja existe auditoria para este ano no programa.".to_string(),
            ));
        }

        self.conn().execute(
            "INSERT INTO auditorias_ano (programa_id, ano, descricao, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![programa_id, input.ano, input.descricao, now()],
        )?;
        self.query_one(
            "SELECT * FROM auditorias_ano WHERE id = ?1",
            [self.last_id()],
            AuditYear::from_row,
            "Auditoria nao encontrada.",
        )
    }

    /// Audits of a program, most recent year first.
    pub fn list_audit_years(&self, programa_id: i64) -> Result<Vec<AuditYear>> {
        self.program(programa_id)?;
        self.query_list(
            "SELECT * FROM auditorias_ano WHERE programa_id = ?1 ORDER BY ano DESC",
            [programa_id],
            AuditYear::from_row,
        )
    }

    /// Add a criterion to a program. ADMIN/GESTOR/AUDITOR.
    pub fn create_criterion(
        &self,
        actor: &Actor,
        programa_id: i64,
        input: &NewCriterion,
    ) -> Result<Criterion> {
        require_roles(actor, CURATORS)?;
        self.program(programa_id)?;
        let codigo = input.codigo.trim();
        check_len("codigo", codigo, CRITERION_CODE_LEN)?;
        check_len("titulo", &input.titulo, TITLE_LEN)?;
        if self.exists(
            "SELECT 1 FROM criterios WHERE programa_id = ?1 AND codigo = ?2",
            params![programa_id, codigo],
        )? {
            return Err(ConformaError::Conflict(
                "Ja existe um criterio com este codigo no programa.".to_string(),
            ));
        }

        self.conn().execute(
            "INSERT INTO criterios (programa_id, codigo, titulo, descricao, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![programa_id, codigo, input.titulo, input.descricao, now()],
        )?;
        self.query_one(
            "SELECT * FROM criterios WHERE id = ?1",
            [self.last_id()],
            Criterion::from_row,
            "Criterio nao encontrado.",
        )
    }

    /// Criteria of a program ordered by code.
    pub fn list_criteria(&self, programa_id: i64) -> Result<Vec<Criterion>> {
        self.program(programa_id)?;
        self.query_list(
            "SELECT * FROM criterios WHERE programa_id = ?1 ORDER BY codigo",
            [programa_id],
            Criterion::from_row,
        )
    }

    /// Register an evidence. ADMIN/GESTOR/AUDITOR.
    pub fn create_evidence(&self, actor: &Actor, input: &NewEvidence) -> Result<Evidence> {
        require_roles(actor, CURATORS)?;
        check_len("titulo", &input.titulo, TITLE_LEN)?;
        self.require_audit_in_program(input.auditoria_ano_id, input.programa_id)?;
        self.require_criterion_in_program(input.criterio_id, input.programa_id)?;

        self.conn().execute(
            "INSERT INTO evidencias (programa_id, auditoria_ano_id, criterio_id, titulo, descricao, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                input.programa_id,
                input.auditoria_ano_id,
                input.criterio_id,
                input.titulo,
                input.descricao,
                actor.id,
                now()
            ],
        )?;
        self.evidence(self.last_id())
    }

    /// Evidences matching the scope, newest first.
    pub fn list_evidences(&self, scope: &AuditScope) -> Result<Vec<Evidence>> {
        let filter = scope.filter(true);
        self.query_list(
            &format!(
                "SELECT * FROM evidencias{} ORDER BY id DESC",
                filter.where_sql()
            ),
            filter.params(),
            Evidence::from_row,
        )
    }

    /// One evidence by id.
    pub fn evidence(&self, id: i64) -> Result<Evidence> {
        self.query_one(
            "SELECT * FROM evidencias WHERE id = ?1",
            [id],
            Evidence::from_row,
            "Evidencia nao encontrada.",
        )
    }

    /// Record an indicator evaluation. ADMIN/GESTOR/AUDITOR.
    pub fn create_evaluation(&self, actor: &Actor, input: &NewEvaluation) -> Result<Evaluation> {
        require_roles(actor, CURATORS)?;
        self.require_audit_in_program(input.auditoria_ano_id, input.programa_id)?;
        self.require_criterion_in_program(input.criterio_id, input.programa_id)?;

        self.conn().execute(
            "INSERT INTO avaliacoes_indicador (programa_id, auditoria_ano_id, criterio_id, resultado, observacoes, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                input.programa_id,
                input.auditoria_ano_id,
                input.criterio_id,
                input.resultado,
                input.observacoes,
                actor.id,
                now()
            ],
        )?;
        self.evaluation(self.last_id())
    }

    /// Evaluations matching the scope, newest first.
    pub fn list_evaluations(&self, scope: &AuditScope) -> Result<Vec<Evaluation>> {
        let filter = scope.filter(true);
        self.query_list(
            &format!(
                "SELECT * FROM avaliacoes_indicador{} ORDER BY id DESC",
                filter.where_sql()
            ),
            filter.params(),
            Evaluation::from_row,
        )
    }

    /// One evaluation by id.
    pub fn evaluation(&self, id: i64) -> Result<Evaluation> {
        self.query_one(
            "SELECT * FROM avaliacoes_indicador WHERE id = ?1",
            [id],
            Evaluation::from_row,
            "Avaliacao nao encontrada.",
        )
    }

    /// Open a demand. ADMIN/GESTOR.
    pub fn create_demand(&self, actor: &Actor, input: &NewDemand) -> Result<Demand> {
        require_roles(actor, MANAGERS)?;
        check_len("titulo", &input.titulo, TITLE_LEN)?;
        self.program(input.programa_id)?;
        if let Some(audit) = input.auditoria_ano_id {
            self.require_audit_in_program(audit, input.programa_id)?;
        }
        if let Some(user) = input.responsavel_id {
            self.require_user(user)?;
        }

        self.conn().execute(
            "INSERT INTO demandas (programa_id, auditoria_ano_id, titulo, descricao, status, responsavel_id, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                input.programa_id,
                input.auditoria_ano_id,
                input.titulo,
                input.descricao,
                input.status,
                input.responsavel_id,
                actor.id,
                now()
            ],
        )?;
        self.demand(self.last_id())
    }

    /// Demands matching the scope, newest first. `criterio_id` is ignored.
    pub fn list_demands(&self, scope: &AuditScope) -> Result<Vec<Demand>> {
        let filter = scope.filter(false);
        self.query_list(
            &format!("SELECT * FROM demandas{} ORDER BY id DESC", filter.where_sql()),
            filter.params(),
            Demand::from_row,
        )
    }

    /// One demand by id.
    pub fn demand(&self, id: i64) -> Result<Demand> {
        self.query_one(
            "SELECT * FROM demandas WHERE id = ?1",
            [id],
            Demand::from_row,
            "Demanda nao encontrada.",
        )
    }

    // -------------------------------------------------------------------------
    // Consistency checks shared with the other repositories
    // -------------------------------------------------------------------------

    /// The audit must exist and belong to the program.
    pub(crate) fn require_audit_in_program(&self, audit_id: i64, programa_id: i64) -> Result<()> {
        let owner: i64 = self.query_one(
            "SELECT programa_id FROM auditorias_ano WHERE id = ?1",
            [audit_id],
            |row| row.get(0),
            "Auditoria nao encontrada.",
        )?;
        if owner != programa_id {
            return Err(ConformaError::Validation(
                "A auditoria informada nao pertence ao programa.".to_string(),
            ));
        }
        Ok(())
    }

    /// The criterion must exist and belong to the program.
    pub(crate) fn require_criterion_in_program(
        &self,
        criterion_id: i64,
        programa_id: i64,
    ) -> Result<()> {
        let owner: i64 = self.query_one(
            "SELECT programa_id FROM criterios WHERE id = ?1",
            [criterion_id],
            |row| row.get(0),
            "Criterio nao encontrado.",
        )?;
        if owner != programa_id {
            return Err(ConformaError::Validation(
                "O criterio informado nao pertence ao programa.".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use crate::users::NewUser;

    fn seed() -> (Store, Actor) {
        let store = Store::open_in_memory().expect("open");
        let admin = store
            .bootstrap_user(&NewUser {
                nome: "Admin".to_string(),
                email: "admin@example.com".to_string(),
                role: Role::Admin,
            })
            .expect("admin");
        (store, Actor::new(admin.usuario.id, Role::Admin))
    }

    fn program(store: &Store, actor: &Actor, codigo: &str) -> Program {
        store
            .create_program(
                actor,
                &NewProgram {
                    codigo: codigo.to_string(),
                    nome: "Programa de Manejo".to_string(),
                    descricao: None,
                },
            )
            .expect("program")
    }

    #[test]
    fn program_code_unique_ignoring_case() {
        let (store, admin) = seed();
        program(&store, &admin, "FSC");
        let err = store.create_program(
            &admin,
            &NewProgram {
                codigo: "fsc".to_string(),
                nome: "Outro".to_string(),
                descricao: None,
            },
        );
        assert!(matches!(err, Err(ConformaError::Conflict(_))));
    }

    #[test]
    fn audit_year_range_and_uniqueness() {
        let (store, admin) = seed();
        let p = program(&store, &admin, "FSC");
        let bad = store.create_audit_year(&admin, p.id, &NewAuditYear { ano: 1999, descricao: None });
        assert!(matches!(bad, Err(ConformaError::Validation(_))));

        store
            .create_audit_year(&admin, p.id, &NewAuditYear { ano: 2026, descricao: None })
            .expect("audit");
        let dup = store.create_audit_year(&admin, p.id, &NewAuditYear { ano: 2026, descricao: None });
        assert!(matches!(dup, Err(ConformaError::Conflict(_))));
    }

    #[test]
    fn evidence_requires_records_of_same_program() {
        let (store, admin) = seed();
        let a = program(&store, &admin, "FSC");
        let b = program(&store, &admin, "PEFC");
        let audit = store
            .create_audit_year(&admin, a.id, &NewAuditYear { ano: 2026, descricao: None })
            .expect("audit");
        let foreign = store
            .create_criterion(
                &admin,
                b.id,
                &NewCriterion {
                    codigo: "1.1".to_string(),
                    titulo: "Criterio externo".to_string(),
                    descricao: None,
                },
            )
            .expect("criterion");

        let err = store.create_evidence(
            &admin,
            &NewEvidence {
                programa_id: a.id,
                auditoria_ano_id: audit.id,
                criterio_id: foreign.id,
                titulo: "Mapa da area".to_string(),
                descricao: None,
            },
        );
        assert!(matches!(err, Err(ConformaError::Validation(_))));
    }

    #[test]
    fn responsible_cannot_create_program() {
        let (store, _) = seed();
        let err = store.create_program(
            &Actor::new(1, Role::Responsavel),
            &NewProgram {
                codigo: "ISO".to_string(),
                nome: "ISO 14001".to_string(),
                descricao: None,
            },
        );
        assert!(matches!(err, Err(ConformaError::Forbidden(_))));
    }
}
