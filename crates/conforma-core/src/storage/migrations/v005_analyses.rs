//! V005: non-conformance analyses (5 whys + SWOT).

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS analises_nao_conformidade (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE RESTRICT,
    auditoria_ano_id INTEGER NOT NULL REFERENCES auditorias_ano(id) ON DELETE CASCADE,
    avaliacao_id INTEGER NOT NULL REFERENCES avaliacoes_indicador(id) ON DELETE CASCADE,
    demanda_id INTEGER REFERENCES demandas(id) ON DELETE SET NULL,
    titulo_problema TEXT NOT NULL,
    contexto TEXT,
    porque_1 TEXT,
    porque_2 TEXT,
    porque_3 TEXT,
    porque_4 TEXT,
    porque_5 TEXT,
    causa_raiz TEXT,
    acao_corretiva TEXT,
    swot_forcas TEXT,
    swot_fraquezas TEXT,
    swot_oportunidades TEXT,
    swot_ameacas TEXT,
    status_analise TEXT NOT NULL DEFAULT 'aberta'
        CHECK (status_analise IN ('aberta', 'em_analise', 'concluida')),
    responsavel_id INTEGER REFERENCES usuarios(id) ON DELETE SET NULL,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_analises_nao_conformidade_programa_id ON analises_nao_conformidade(programa_id);
CREATE INDEX IF NOT EXISTS ix_analises_nao_conformidade_auditoria_ano_id ON analises_nao_conformidade(auditoria_ano_id);
CREATE INDEX IF NOT EXISTS ix_analises_nao_conformidade_avaliacao_id ON analises_nao_conformidade(avaliacao_id);
CREATE INDEX IF NOT EXISTS ix_analises_nao_conformidade_demanda_id ON analises_nao_conformidade(demanda_id);
CREATE INDEX IF NOT EXISTS ix_analises_nao_conformidade_responsavel_id ON analises_nao_conformidade(responsavel_id);
"#;
