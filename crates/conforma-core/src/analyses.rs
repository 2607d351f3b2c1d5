//! # Non-Conformance Analyses
//!
//! Root-cause analyses (5 whys plus SWOT) opened for an indicator
//! evaluation. The whys are answered in order, and an analysis can only be
//! concluded once the first why, the root cause and the corrective action
//! are filled.

use crate::access::{CURATORS, MANAGERS, ensure, require_roles};
use crate::primitives::{TITLE_LEN, check_len};
use crate::rules::{check_analysis_conclusion, check_whys_contiguous};
use crate::storage::{Filter, Store, now};
use crate::{Actor, AnalysisStatus, ConformaError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use serde::{Deserialize, Serialize};

/// A 5-whys / SWOT analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub id: i64,
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub avaliacao_id: i64,
    pub demanda_id: Option<i64>,
    pub titulo_problema: String,
    pub contexto: Option<String>,
    pub porque_1: Option<String>,
    pub porque_2: Option<String>,
    pub porque_3: Option<String>,
    pub porque_4: Option<String>,
    pub porque_5: Option<String>,
    pub causa_raiz: Option<String>,
    pub acao_corretiva: Option<String>,
    pub swot_forcas: Option<String>,
    pub swot_fraquezas: Option<String>,
    pub swot_oportunidades: Option<String>,
    pub swot_ameacas: Option<String>,
    pub status_analise: AnalysisStatus,
    pub responsavel_id: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Analysis {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            auditoria_ano_id: row.get("auditoria_ano_id")?,
            avaliacao_id: row.get("avaliacao_id")?,
            demanda_id: row.get("demanda_id")?,
            titulo_problema: row.get("titulo_problema")?,
            contexto: row.get("contexto")?,
            porque_1: row.get("porque_1")?,
            porque_2: row.get("porque_2")?,
            porque_3: row.get("porque_3")?,
            porque_4: row.get("porque_4")?,
            porque_5: row.get("porque_5")?,
            causa_raiz: row.get("causa_raiz")?,
            acao_corretiva: row.get("acao_corretiva")?,
            swot_forcas: row.get("swot_forcas")?,
            swot_fraquezas: row.get("swot_fraquezas")?,
            swot_oportunidades: row.get("swot_oportunidades")?,
            swot_ameacas: row.get("swot_ameacas")?,
            status_analise: row.get("status_analise")?,
            responsavel_id: row.get("responsavel_id")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Enforce why ordering and the conclusion requirements.
    fn validate(&self) -> Result<()> {
        check_len("titulo_problema", &self.titulo_problema, TITLE_LEN)?;
        check_whys_contiguous([
            self.porque_1.as_deref(),
            self.porque_2.as_deref(),
            self.porque_3.as_deref(),
            self.porque_4.as_deref(),
            self.porque_5.as_deref(),
        ])?;
        if self.status_analise == AnalysisStatus::Concluida {
            check_analysis_conclusion(
                self.porque_1.as_deref(),
                self.causa_raiz.as_deref(),
                self.acao_corretiva.as_deref(),
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAnalysis {
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub avaliacao_id: i64,
    pub demanda_id: Option<i64>,
    pub titulo_problema: String,
    pub contexto: Option<String>,
    pub porque_1: Option<String>,
    pub porque_2: Option<String>,
    pub porque_3: Option<String>,
    pub porque_4: Option<String>,
    pub porque_5: Option<String>,
    pub causa_raiz: Option<String>,
    pub acao_corretiva: Option<String>,
    pub swot_forcas: Option<String>,
    pub swot_fraquezas: Option<String>,
    pub swot_oportunidades: Option<String>,
    pub swot_ameacas: Option<String>,
    #[serde(default)]
    pub status_analise: AnalysisStatus,
    pub responsavel_id: Option<i64>,
}

/// Partial update. `Some(None)` clears a field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisUpdate {
    #[serde(default)]
    pub titulo_problema: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub demanda_id: Option<Option<i64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub responsavel_id: Option<Option<i64>>,
    #[serde(default)]
    pub status_analise: Option<AnalysisStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub contexto: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub porque_1: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub porque_2: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub porque_3: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub porque_4: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub porque_5: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub causa_raiz: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub acao_corretiva: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub swot_forcas: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub swot_fraquezas: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub swot_oportunidades: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub swot_ameacas: Option<Option<String>>,
}

impl AnalysisUpdate {
    /// Fields a RESPONSAVEL may not touch.
    fn touches_assignment(&self) -> bool {
        self.titulo_problema.is_some() || self.demanda_id.is_some() || self.responsavel_id.is_some()
    }

    fn touches_findings(&self) -> bool {
        [
            &self.contexto,
            &self.porque_1,
            &self.porque_2,
            &self.porque_3,
            &self.porque_4,
            &self.porque_5,
            &self.causa_raiz,
            &self.acao_corretiva,
            &self.swot_forcas,
            &self.swot_fraquezas,
            &self.swot_oportunidades,
            &self.swot_ameacas,
        ]
        .iter()
        .any(|field| field.is_some())
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_assignment() && !self.touches_findings() && self.status_analise.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisFilter {
    pub programa_id: Option<i64>,
    pub auditoria_ano_id: Option<i64>,
    pub avaliacao_id: Option<i64>,
    pub status: Option<AnalysisStatus>,
    pub responsavel_id: Option<i64>,
}

fn apply<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

const NOT_ASSIGNED: &str = "Voce so pode acessar analises atribuidas a voce.";

impl Store {
    /// Open an analysis for an evaluation. ADMIN/GESTOR/AUDITOR.
    pub fn create_analysis(&self, actor: &Actor, input: &NewAnalysis) -> Result<Analysis> {
        require_roles(actor, CURATORS)?;
        let evaluation = self.evaluation(input.avaliacao_id)?;
        if evaluation.programa_id != input.programa_id
            || evaluation.auditoria_ano_id != input.auditoria_ano_id
        {
            return Err(ConformaError::Validation(
                "A avaliacao informada nao pertence ao programa e auditoria.".to_string(),
            ));
        }
        if let Some(demand) = input.demanda_id {
            self.require_demand_in_program(demand, input.programa_id)?;
        }
        if let Some(user) = input.responsavel_id {
            self.require_user(user)?;
        }

        let ts = now();
        let draft = Analysis {
            id: 0,
            programa_id: input.programa_id,
            auditoria_ano_id: input.auditoria_ano_id,
            avaliacao_id: input.avaliacao_id,
            demanda_id: input.demanda_id,
            titulo_problema: input.titulo_problema.clone(),
            contexto: input.contexto.clone(),
            porque_1: input.porque_1.clone(),
            porque_2: input.porque_2.clone(),
            porque_3: input.porque_3.clone(),
            porque_4: input.porque_4.clone(),
            porque_5: input.porque_5.clone(),
            causa_raiz: input.causa_raiz.clone(),
            acao_corretiva: input.acao_corretiva.clone(),
            swot_forcas: input.swot_forcas.clone(),
            swot_fraquezas: input.swot_fraquezas.clone(),
            swot_oportunidades: input.swot_oportunidades.clone(),
            swot_ameacas: input.swot_ameacas.clone(),
            status_analise: input.status_analise,
            responsavel_id: input.responsavel_id,
            created_by: actor.id,
            created_at: ts,
            updated_at: ts,
        };
        draft.validate()?;

        self.conn().execute(
            "INSERT INTO analises_nao_conformidade
                (programa_id, auditoria_ano_id, avaliacao_id, demanda_id, titulo_problema, contexto,
                 porque_1, porque_2, porque_3, porque_4, porque_5, causa_raiz, acao_corretiva,
                 swot_forcas, swot_fraquezas, swot_oportunidades, swot_ameacas,
                 status_analise, responsavel_id, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                     ?18, ?19, ?20, ?21, ?21)",
            params![
                draft.programa_id,
                draft.auditoria_ano_id,
                draft.avaliacao_id,
                draft.demanda_id,
                draft.titulo_problema,
                draft.contexto,
                draft.porque_1,
                draft.porque_2,
                draft.porque_3,
                draft.porque_4,
                draft.porque_5,
                draft.causa_raiz,
                draft.acao_corretiva,
                draft.swot_forcas,
                draft.swot_fraquezas,
                draft.swot_oportunidades,
                draft.swot_ameacas,
                draft.status_analise,
                draft.responsavel_id,
                draft.created_by,
                ts
            ],
        )?;
        self.load_analysis(self.last_id())
    }

    /// Analyses, newest first. RESPONSAVEL only sees their own.
    pub fn list_analyses(&self, actor: &Actor, query: &AnalysisFilter) -> Result<Vec<Analysis>> {
        let mut filter = Filter::new();
        filter.eq("programa_id", query.programa_id);
        filter.eq("auditoria_ano_id", query.auditoria_ano_id);
        filter.eq("avaliacao_id", query.avaliacao_id);
        filter.eq("status_analise", query.status);
        filter.eq("responsavel_id", query.responsavel_id);
        if actor.is_responsible() {
            filter.push("responsavel_id = ?", actor.id);
        }
        self.query_list(
            &format!(
                "SELECT * FROM analises_nao_conformidade{} ORDER BY id DESC",
                filter.where_sql()
            ),
            filter.params(),
            Analysis::from_row,
        )
    }

    /// One analysis. RESPONSAVEL only sees their own.
    pub fn analysis(&self, actor: &Actor, id: i64) -> Result<Analysis> {
        let analysis = self.load_analysis(id)?;
        if actor.is_responsible() {
            ensure(analysis.responsavel_id == Some(actor.id), NOT_ASSIGNED)?;
        }
        Ok(analysis)
    }

    /// Field-level update.
    ///
    /// RESPONSAVEL edits only the findings and status of analyses assigned
    /// to them.
    pub fn update_analysis(
        &self,
        actor: &Actor,
        id: i64,
        update: &AnalysisUpdate,
    ) -> Result<Analysis> {
        if update.is_empty() {
            return Err(ConformaError::Validation(
                "Nenhum campo informado para atualizacao.".to_string(),
            ));
        }
        let mut analysis = self.load_analysis(id)?;

        if actor.is_responsible() {
            ensure(analysis.responsavel_id == Some(actor.id), NOT_ASSIGNED)?;
            ensure(
                !update.touches_assignment(),
                "Responsavel so pode atualizar contexto, porques, causa raiz, acao corretiva, SWOT e status.",
            )?;
        } else {
            require_roles(actor, CURATORS)?;
        }

        if let Some(Some(demand)) = update.demanda_id {
            self.require_demand_in_program(demand, analysis.programa_id)?;
        }
        if let Some(Some(user)) = update.responsavel_id {
            self.require_user(user)?;
        }

        apply(&mut analysis.titulo_problema, &update.titulo_problema);
        apply(&mut analysis.demanda_id, &update.demanda_id);
        apply(&mut analysis.responsavel_id, &update.responsavel_id);
        apply(&mut analysis.status_analise, &update.status_analise);
        apply(&mut analysis.contexto, &update.contexto);
        apply(&mut analysis.porque_1, &update.porque_1);
        apply(&mut analysis.porque_2, &update.porque_2);
        apply(&mut analysis.porque_3, &update.porque_3);
        apply(&mut analysis.porque_4, &update.porque_4);
        apply(&mut analysis.porque_5, &update.porque_5);
        apply(&mut analysis.causa_raiz, &update.causa_raiz);
        apply(&mut analysis.acao_corretiva, &update.acao_corretiva);
        apply(&mut analysis.swot_forcas, &update.swot_forcas);
        apply(&mut analysis.swot_fraquezas, &update.swot_fraquezas);
        apply(&mut analysis.swot_oportunidades, &update.swot_oportunidades);
        apply(&mut analysis.swot_ameacas, &update.swot_ameacas);
        analysis.validate()?;

        self.conn().execute(
            "UPDATE analises_nao_conformidade SET
                demanda_id = ?1, titulo_problema = ?2, contexto = ?3,
                porque_1 = ?4, porque_2 = ?5, porque_3 = ?6, porque_4 = ?7, porque_5 = ?8,
                causa_raiz = ?9, acao_corretiva = ?10,
                swot_forcas = ?11, swot_fraquezas = ?12, swot_oportunidades = ?13, swot_ameacas = ?14,
                status_analise = ?15, responsavel_id = ?16, updated_at = ?17
             WHERE id = ?18",
            params![
                analysis.demanda_id,
                analysis.titulo_problema,
                analysis.contexto,
                analysis.porque_1,
                analysis.porque_2,
                analysis.porque_3,
                analysis.porque_4,
                analysis.porque_5,
                analysis.causa_raiz,
                analysis.acao_corretiva,
                analysis.swot_forcas,
                analysis.swot_fraquezas,
                analysis.swot_oportunidades,
                analysis.swot_ameacas,
                analysis.status_analise,
                analysis.responsavel_id,
                now(),
                id
            ],
        )?;
        self.load_analysis(id)
    }

    /// Delete an analysis. ADMIN/GESTOR.
    pub fn delete_analysis(&self, actor: &Actor, id: i64) -> Result<()> {
        require_roles(actor, MANAGERS)?;
        self.load_analysis(id)?;
        self.conn()
            .execute("DELETE FROM analises_nao_conformidade WHERE id = ?1", [id])?;
        Ok(())
    }

    fn require_demand_in_program(&self, demand_id: i64, programa_id: i64) -> Result<()> {
        let demand = self.demand(demand_id)?;
        if demand.programa_id != programa_id {
            return Err(ConformaError::Validation(
                "A demanda informada nao pertence ao programa.".to_string(),
            ));
        }
        Ok(())
    }

    fn load_analysis(&self, id: i64) -> Result<Analysis> {
        self.query_one(
            "SELECT * FROM analises_nao_conformidade WHERE id = ?1",
            [id],
            Analysis::from_row,
            "Analise nao encontrada.",
        )
    }
}
