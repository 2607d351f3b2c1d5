//! # Evidence Documents
//!
//! Documents attached to an evidence follow a review workflow:
//!
//! ```text
//! em_construcao --submit--> em_revisao --review--> aprovado | reprovado
//!       ^                                              |          |
//!       +------------------- reopen -------------------+          |
//!       +------------------- content edit ------------------------+
//! ```
//!
//! Every transition back to `em_construcao` bumps `versao`.

use crate::access::{CURATORS, MANAGERS, ensure, require_roles};
use crate::primitives::{TITLE_LEN, check_len, is_filled};
use crate::storage::{Filter, Store, now, today};
use crate::{Actor, ConformaError, DocumentStatus, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Row, params};
use serde::{Deserialize, Serialize};

/// A document submitted as evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: i64,
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub evidencia_id: i64,
    pub titulo: String,
    pub conteudo: Option<String>,
    pub versao: i64,
    pub status_documento: DocumentStatus,
    pub observacoes_revisao: Option<String>,
    pub data_limite: Option<NaiveDate>,
    pub responsavel_id: Option<i64>,
    pub revisado_por_id: Option<i64>,
    pub data_revisao: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            programa_id: row.get("programa_id")?,
            auditoria_ano_id: row.get("auditoria_ano_id")?,
            evidencia_id: row.get("evidencia_id")?,
            titulo: row.get("titulo")?,
            conteudo: row.get("conteudo")?,
            versao: row.get("versao")?,
            status_documento: row.get("status_documento")?,
            observacoes_revisao: row.get("observacoes_revisao")?,
            data_limite: row.get("data_limite")?,
            responsavel_id: row.get("responsavel_id")?,
            revisado_por_id: row.get("revisado_por_id")?,
            data_revisao: row.get("data_revisao")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Assigned to or created by `user_id`.
    fn belongs_to(&self, user_id: i64) -> bool {
        self.responsavel_id == Some(user_id) || self.created_by == user_id
    }

    /// Content may only change while the document is being written.
    fn is_editable(&self) -> bool {
        matches!(
            self.status_documento,
            DocumentStatus::EmConstrucao | DocumentStatus::Reprovado
        )
    }

    fn restart_construction(&mut self) {
        self.status_documento = DocumentStatus::EmConstrucao;
        self.versao += 1;
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
    pub programa_id: i64,
    pub auditoria_ano_id: i64,
    pub evidencia_id: i64,
    pub titulo: String,
    #[serde(default)]
    pub conteudo: Option<String>,
    #[serde(default)]
    pub data_limite: Option<NaiveDate>,
    #[serde(default)]
    pub responsavel_id: Option<i64>,
}

/// Partial update. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentUpdate {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub conteudo: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub data_limite: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub responsavel_id: Option<Option<i64>>,
}

impl DocumentUpdate {
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none()
            && self.conteudo.is_none()
            && self.data_limite.is_none()
            && self.responsavel_id.is_none()
    }

    fn touches_content(&self) -> bool {
        self.titulo.is_some() || self.conteudo.is_some()
    }
}

/// Reviewer decision on a document in review.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentReview {
    /// `aprovado` or `reprovado`.
    pub status: DocumentStatus,
    #[serde(default)]
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentFilter {
    pub programa_id: Option<i64>,
    pub auditoria_ano_id: Option<i64>,
    pub evidencia_id: Option<i64>,
    pub status: Option<DocumentStatus>,
    pub responsavel_id: Option<i64>,
    pub vencidos: Option<bool>,
}

const NOT_OWNER: &str = "Voce so pode acessar documentos atribuidos a voce.";

impl Store {
    /// Create a document in `em_construcao`.
    ///
    /// A RESPONSAVEL always becomes the document's responsible.
    pub fn create_document(&self, actor: &Actor, input: &NewDocument) -> Result<Document> {
        check_len("titulo", &input.titulo, TITLE_LEN)?;

        let responsavel_id = if actor.is_responsible() {
            ensure(
                input.responsavel_id.is_none_or(|id| id == actor.id),
                "Responsavel nao pode atribuir documentos a outro usuario.",
            )?;
            Some(actor.id)
        } else {
            input.responsavel_id
        };
        if let Some(user) = responsavel_id {
            self.require_user(user)?;
        }

        let evidence = self.evidence(input.evidencia_id)?;
        if evidence.programa_id != input.programa_id
            || evidence.auditoria_ano_id != input.auditoria_ano_id
        {
            return Err(ConformaError::Validation(
                "A evidencia informada nao pertence ao programa e auditoria.".to_string(),
            ));
        }

        let ts = now();
        self.conn().execute(
            "INSERT INTO documentos_evidencia
                (programa_id, auditoria_ano_id, evidencia_id, titulo, conteudo, versao,
                 status_documento, data_limite, responsavel_id, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                input.programa_id,
                input.auditoria_ano_id,
                input.evidencia_id,
                input.titulo,
                input.conteudo,
                DocumentStatus::EmConstrucao,
                input.data_limite,
                responsavel_id,
                actor.id,
                ts
            ],
        )?;
        self.load_document(self.last_id())
    }

    /// Documents visible to the actor, earliest deadline first.
    pub fn list_documents(&self, actor: &Actor, query: &DocumentFilter) -> Result<Vec<Document>> {
        let mut filter = Filter::new();
        filter.eq("programa_id", query.programa_id);
        filter.eq("auditoria_ano_id", query.auditoria_ano_id);
        filter.eq("evidencia_id", query.evidencia_id);
        filter.eq("status_documento", query.status);
        filter.eq("responsavel_id", query.responsavel_id);
        if query.vencidos == Some(true) {
            filter.push("data_limite IS NOT NULL AND data_limite < ?", today());
            filter.raw("status_documento <> 'aprovado'");
        }
        if actor.is_responsible() {
            filter.push("? IN (responsavel_id, created_by)", actor.id);
        }

        self.query_list(
            &format!(
                "SELECT * FROM documentos_evidencia{} ORDER BY data_limite ASC NULLS LAST, id DESC",
                filter.where_sql()
            ),
            filter.params(),
            Document::from_row,
        )
    }

    /// One document, subject to RESPONSAVEL ownership.
    pub fn document(&self, actor: &Actor, id: i64) -> Result<Document> {
        let document = self.load_document(id)?;
        if actor.is_responsible() {
            ensure(document.belongs_to(actor.id), NOT_OWNER)?;
        }
        Ok(document)
    }

    /// Field-level update.
    ///
    /// Editing a rejected document starts a new version in construction.
    pub fn update_document(
        &self,
        actor: &Actor,
        id: i64,
        update: &DocumentUpdate,
    ) -> Result<Document> {
        if update.is_empty() {
            return Err(ConformaError::Validation(
                "Nenhum campo informado para atualizacao.".to_string(),
            ));
        }
        let mut document = self.load_document(id)?;

        if actor.is_responsible() {
            ensure(document.belongs_to(actor.id), NOT_OWNER)?;
            ensure(
                update.data_limite.is_none() && update.responsavel_id.is_none(),
                "Responsavel so pode atualizar titulo e conteudo.",
            )?;
        }

        if update.touches_content() {
            if !document.is_editable() {
                return Err(ConformaError::Validation(
                    "Documento em revisao ou aprovado nao pode ser editado.".to_string(),
                ));
            }
            if document.status_documento == DocumentStatus::Reprovado {
                document.restart_construction();
            }
        }

        if let Some(titulo) = &update.titulo {
            check_len("titulo", titulo, TITLE_LEN)?;
            document.titulo = titulo.clone();
        }
        if let Some(conteudo) = &update.conteudo {
            document.conteudo = conteudo.clone();
        }
        if let Some(data_limite) = update.data_limite {
            document.data_limite = data_limite;
        }
        if let Some(responsavel_id) = update.responsavel_id {
            if let Some(user) = responsavel_id {
                self.require_user(user)?;
            }
            document.responsavel_id = responsavel_id;
        }

        self.save_document(&document)
    }

    /// Send a document to review.
    pub fn submit_document(&self, actor: &Actor, id: i64) -> Result<Document> {
        let mut document = self.load_document(id)?;
        ensure(
            actor.has_role(CURATORS) || document.belongs_to(actor.id),
            NOT_OWNER,
        )?;
        if !document.is_editable() {
            return Err(ConformaError::Validation(
                "Apenas documentos em construcao ou reprovados podem ser submetidos.".to_string(),
            ));
        }
        document.status_documento = DocumentStatus::EmRevisao;
        tracing::info!(event = "document_submitted", document = id, versao = document.versao);
        self.save_document(&document)
    }

    /// Approve or reject a document in review. ADMIN/GESTOR/AUDITOR.
    pub fn review_document(
        &self,
        actor: &Actor,
        id: i64,
        review: &DocumentReview,
    ) -> Result<Document> {
        require_roles(actor, CURATORS)?;
        let mut document = self.load_document(id)?;
        if document.status_documento != DocumentStatus::EmRevisao {
            return Err(ConformaError::Validation(
                "Apenas documentos em revisao podem ser revisados.".to_string(),
            ));
        }
        match review.status {
            DocumentStatus::Aprovado => {}
            DocumentStatus::Reprovado => {
                if !is_filled(review.observacoes.as_deref()) {
                    return Err(ConformaError::Validation(
                        "Informe as observacoes da revisao para reprovar o documento."
                            .to_string(),
                    ));
                }
            }
            DocumentStatus::EmConstrucao | DocumentStatus::EmRevisao => {
                return Err(ConformaError::Validation(
                    "A revisao deve aprovar ou reprovar o documento.".to_string(),
                ));
            }
        }

        document.status_documento = review.status;
        document.observacoes_revisao = review.observacoes.clone();
        document.revisado_por_id = Some(actor.id);
        document.data_revisao = Some(now());
        tracing::info!(
            event = "document_reviewed",
            document = id,
            status = review.status.as_str(),
            reviewer = actor.id
        );
        self.save_document(&document)
    }

    /// Reopen an approved document as a new version. ADMIN/GESTOR.
    pub fn reopen_document(&self, actor: &Actor, id: i64) -> Result<Document> {
        require_roles(actor, MANAGERS)?;
        let mut document = self.load_document(id)?;
        if document.status_documento != DocumentStatus::Aprovado {
            return Err(ConformaError::Validation(
                "Apenas documentos aprovados podem ser reabertos.".to_string(),
            ));
        }
        document.restart_construction();
        document.revisado_por_id = None;
        document.data_revisao = None;
        self.save_document(&document)
    }

    /// Delete a document. ADMIN/GESTOR.
    pub fn delete_document(&self, actor: &Actor, id: i64) -> Result<()> {
        require_roles(actor, MANAGERS)?;
        self.load_document(id)?;
        self.conn()
            .execute("DELETE FROM documentos_evidencia WHERE id = ?1", [id])?;
        Ok(())
    }

    fn load_document(&self, id: i64) -> Result<Document> {
        self.query_one(
            "SELECT * FROM documentos_evidencia WHERE id = ?1",
            [id],
            Document::from_row,
            "Documento nao encontrado.",
        )
    }

    fn save_document(&self, document: &Document) -> Result<Document> {
        self.conn().execute(
            "UPDATE documentos_evidencia SET
                titulo = ?1, conteudo = ?2, versao = ?3, status_documento = ?4,
                observacoes_revisao = ?5, data_limite = ?6, responsavel_id = ?7,
                revisado_por_id = ?8, data_revisao = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                document.titulo,
                document.conteudo,
                document.versao,
                document.status_documento,
                document.observacoes_revisao,
                document.data_limite,
                document.responsavel_id,
                document.revisado_por_id,
                document.data_revisao,
                now(),
                document.id
            ],
        )?;
        self.load_document(document.id)
    }
}
