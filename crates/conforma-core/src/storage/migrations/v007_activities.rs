//! V007: activities inside tasks (sub-demands).

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS atividades_subdemanda (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tarefa_id INTEGER NOT NULL REFERENCES tarefas_projeto(id) ON DELETE CASCADE,
    titulo TEXT NOT NULL,
    descricao TEXT,
    status TEXT NOT NULL DEFAULT 'pendente' CHECK (status IN ('pendente', 'concluida')),
    ordem INTEGER NOT NULL DEFAULT 0,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CONSTRAINT ck_atividade_subdemanda_ordem_nonnegative CHECK (ordem >= 0)
);

CREATE INDEX IF NOT EXISTS ix_atividades_subdemanda_tarefa_id ON atividades_subdemanda(tarefa_id);
"#;
