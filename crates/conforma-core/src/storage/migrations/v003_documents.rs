//! V003: evidence documents and their review workflow.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documentos_evidencia (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE RESTRICT,
    auditoria_ano_id INTEGER NOT NULL REFERENCES auditorias_ano(id) ON DELETE CASCADE,
    evidencia_id INTEGER NOT NULL REFERENCES evidencias(id) ON DELETE CASCADE,
    titulo TEXT NOT NULL,
    conteudo TEXT,
    versao INTEGER NOT NULL DEFAULT 1 CHECK (versao >= 1),
    status_documento TEXT NOT NULL DEFAULT 'em_construcao'
        CHECK (status_documento IN ('em_construcao', 'em_revisao', 'aprovado', 'reprovado')),
    observacoes_revisao TEXT,
    data_limite TEXT,
    responsavel_id INTEGER REFERENCES usuarios(id) ON DELETE SET NULL,
    revisado_por_id INTEGER REFERENCES usuarios(id) ON DELETE SET NULL,
    data_revisao TEXT,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_documentos_evidencia_programa_id ON documentos_evidencia(programa_id);
CREATE INDEX IF NOT EXISTS ix_documentos_evidencia_auditoria_ano_id ON documentos_evidencia(auditoria_ano_id);
CREATE INDEX IF NOT EXISTS ix_documentos_evidencia_evidencia_id ON documentos_evidencia(evidencia_id);
CREATE INDEX IF NOT EXISTS ix_documentos_evidencia_data_limite ON documentos_evidencia(data_limite);
CREATE INDEX IF NOT EXISTS ix_documentos_evidencia_responsavel_id ON documentos_evidencia(responsavel_id);
CREATE INDEX IF NOT EXISTS ix_documentos_evidencia_revisado_por_id ON documentos_evidencia(revisado_por_id);
"#;
