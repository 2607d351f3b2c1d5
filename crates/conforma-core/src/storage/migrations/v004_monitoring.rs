//! V004: monthly criterion monitoring, notifications and resolutions.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS monitoramentos_criterio (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE RESTRICT,
    auditoria_ano_id INTEGER NOT NULL REFERENCES auditorias_ano(id) ON DELETE CASCADE,
    criterio_id INTEGER NOT NULL REFERENCES criterios(id) ON DELETE CASCADE,
    mes_referencia TEXT NOT NULL,
    status_monitoramento TEXT NOT NULL DEFAULT 'sem_dados'
        CHECK (status_monitoramento IN ('sem_dados', 'conforme', 'alerta', 'critico')),
    observacoes TEXT,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CONSTRAINT uq_monitoramento_criterio_mes
        UNIQUE (programa_id, auditoria_ano_id, criterio_id, mes_referencia)
);

CREATE INDEX IF NOT EXISTS ix_monitoramentos_criterio_programa_id ON monitoramentos_criterio(programa_id);
CREATE INDEX IF NOT EXISTS ix_monitoramentos_criterio_auditoria_ano_id ON monitoramentos_criterio(auditoria_ano_id);
CREATE INDEX IF NOT EXISTS ix_monitoramentos_criterio_criterio_id ON monitoramentos_criterio(criterio_id);
CREATE INDEX IF NOT EXISTS ix_monitoramentos_criterio_mes_referencia ON monitoramentos_criterio(mes_referencia);

CREATE TABLE IF NOT EXISTS notificacoes_monitoramento (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE RESTRICT,
    auditoria_ano_id INTEGER NOT NULL REFERENCES auditorias_ano(id) ON DELETE CASCADE,
    criterio_id INTEGER NOT NULL REFERENCES criterios(id) ON DELETE CASCADE,
    monitoramento_id INTEGER NOT NULL REFERENCES monitoramentos_criterio(id) ON DELETE CASCADE,
    titulo TEXT NOT NULL,
    descricao TEXT,
    severidade TEXT NOT NULL CHECK (severidade IN ('baixa', 'media', 'alta', 'critica')),
    status_notificacao TEXT NOT NULL DEFAULT 'aberta'
        CHECK (status_notificacao IN ('aberta', 'em_tratamento', 'resolvida', 'cancelada')),
    responsavel_id INTEGER REFERENCES usuarios(id) ON DELETE SET NULL,
    prazo TEXT,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_notificacoes_monitoramento_programa_id ON notificacoes_monitoramento(programa_id);
CREATE INDEX IF NOT EXISTS ix_notificacoes_monitoramento_auditoria_ano_id ON notificacoes_monitoramento(auditoria_ano_id);
CREATE INDEX IF NOT EXISTS ix_notificacoes_monitoramento_criterio_id ON notificacoes_monitoramento(criterio_id);
CREATE INDEX IF NOT EXISTS ix_notificacoes_monitoramento_monitoramento_id ON notificacoes_monitoramento(monitoramento_id);
CREATE INDEX IF NOT EXISTS ix_notificacoes_monitoramento_responsavel_id ON notificacoes_monitoramento(responsavel_id);
CREATE INDEX IF NOT EXISTS ix_notificacoes_monitoramento_prazo ON notificacoes_monitoramento(prazo);

CREATE TABLE IF NOT EXISTS resolucoes_notificacao (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE RESTRICT,
    notificacao_id INTEGER NOT NULL REFERENCES notificacoes_monitoramento(id) ON DELETE CASCADE,
    descricao TEXT NOT NULL,
    resultado TEXT,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_resolucoes_notificacao_programa_id ON resolucoes_notificacao(programa_id);
CREATE INDEX IF NOT EXISTS ix_resolucoes_notificacao_notificacao_id ON resolucoes_notificacao(notificacao_id);
"#;
