//! V002: certification programs, audit years, criteria, evidences,
//! indicator evaluations and demands.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS programas_certificacao (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    codigo TEXT NOT NULL COLLATE NOCASE,
    nome TEXT NOT NULL,
    descricao TEXT,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS ix_programas_certificacao_codigo ON programas_certificacao(codigo);

CREATE TABLE IF NOT EXISTS auditorias_ano (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE CASCADE,
    ano INTEGER NOT NULL CHECK (ano BETWEEN 2000 AND 2100),
    descricao TEXT,
    created_at TEXT NOT NULL,
    CONSTRAINT uq_auditoria_programa_ano UNIQUE (programa_id, ano)
);

CREATE INDEX IF NOT EXISTS ix_auditorias_ano_programa_id ON auditorias_ano(programa_id);

CREATE TABLE IF NOT EXISTS criterios (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE CASCADE,
    codigo TEXT NOT NULL COLLATE NOCASE,
    titulo TEXT NOT NULL,
    descricao TEXT,
    created_at TEXT NOT NULL,
    CONSTRAINT uq_criterio_programa_codigo UNIQUE (programa_id, codigo)
);

CREATE INDEX IF NOT EXISTS ix_criterios_programa_id ON criterios(programa_id);

CREATE TABLE IF NOT EXISTS evidencias (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE RESTRICT,
    auditoria_ano_id INTEGER NOT NULL REFERENCES auditorias_ano(id) ON DELETE CASCADE,
    criterio_id INTEGER NOT NULL REFERENCES criterios(id) ON DELETE CASCADE,
    titulo TEXT NOT NULL,
    descricao TEXT,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_evidencias_programa_id ON evidencias(programa_id);
CREATE INDEX IF NOT EXISTS ix_evidencias_auditoria_ano_id ON evidencias(auditoria_ano_id);
CREATE INDEX IF NOT EXISTS ix_evidencias_criterio_id ON evidencias(criterio_id);

CREATE TABLE IF NOT EXISTS avaliacoes_indicador (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE RESTRICT,
    auditoria_ano_id INTEGER NOT NULL REFERENCES auditorias_ano(id) ON DELETE CASCADE,
    criterio_id INTEGER NOT NULL REFERENCES criterios(id) ON DELETE CASCADE,
    resultado TEXT NOT NULL,
    observacoes TEXT,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_avaliacoes_indicador_programa_id ON avaliacoes_indicador(programa_id);
CREATE INDEX IF NOT EXISTS ix_avaliacoes_indicador_auditoria_ano_id ON avaliacoes_indicador(auditoria_ano_id);
CREATE INDEX IF NOT EXISTS ix_avaliacoes_indicador_criterio_id ON avaliacoes_indicador(criterio_id);

CREATE TABLE IF NOT EXISTS demandas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    programa_id INTEGER NOT NULL REFERENCES programas_certificacao(id) ON DELETE RESTRICT,
    auditoria_ano_id INTEGER REFERENCES auditorias_ano(id) ON DELETE CASCADE,
    titulo TEXT NOT NULL,
    descricao TEXT,
    status TEXT NOT NULL DEFAULT 'aberta',
    responsavel_id INTEGER REFERENCES usuarios(id) ON DELETE SET NULL,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_demandas_programa_id ON demandas(programa_id);
CREATE INDEX IF NOT EXISTS ix_demandas_auditoria_ano_id ON demandas(auditoria_ano_id);
CREATE INDEX IF NOT EXISTS ix_demandas_responsavel_id ON demandas(responsavel_id);
"#;
