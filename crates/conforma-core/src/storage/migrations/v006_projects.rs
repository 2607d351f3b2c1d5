//! V006: remediation projects and their tasks.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS projetos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    codigo TEXT NOT NULL COLLATE NOCASE,
    nome TEXT NOT NULL,
    descricao TEXT,
    status TEXT NOT NULL DEFAULT 'planejamento'
        CHECK (status IN ('planejamento', 'em_andamento', 'pausado', 'concluido', 'cancelado')),
    prioridade TEXT NOT NULL DEFAULT 'media'
        CHECK (prioridade IN ('baixa', 'media', 'alta', 'critica')),
    progresso INTEGER NOT NULL DEFAULT 0,
    data_inicio TEXT,
    data_fim_prevista TEXT,
    data_fim_real TEXT,
    gerente_id INTEGER REFERENCES usuarios(id) ON DELETE SET NULL,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CONSTRAINT ck_projeto_progresso_range CHECK (progresso >= 0 AND progresso <= 100)
);

CREATE UNIQUE INDEX IF NOT EXISTS ix_projetos_codigo ON projetos(codigo);
CREATE INDEX IF NOT EXISTS ix_projetos_data_fim_prevista ON projetos(data_fim_prevista);
CREATE INDEX IF NOT EXISTS ix_projetos_gerente_id ON projetos(gerente_id);

CREATE TABLE IF NOT EXISTS tarefas_projeto (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    projeto_id INTEGER NOT NULL REFERENCES projetos(id) ON DELETE CASCADE,
    titulo TEXT NOT NULL,
    descricao TEXT,
    status TEXT NOT NULL DEFAULT 'backlog'
        CHECK (status IN ('backlog', 'a_fazer', 'em_andamento', 'em_revisao', 'concluida', 'bloqueada')),
    prioridade TEXT NOT NULL DEFAULT 'media'
        CHECK (prioridade IN ('baixa', 'media', 'alta', 'critica')),
    responsavel_id INTEGER REFERENCES usuarios(id) ON DELETE SET NULL,
    start_date TEXT,
    due_date TEXT,
    completed_at TEXT,
    estimativa_horas INTEGER,
    horas_registradas INTEGER NOT NULL DEFAULT 0,
    ordem INTEGER NOT NULL DEFAULT 0,
    created_by INTEGER NOT NULL REFERENCES usuarios(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CONSTRAINT ck_tarefa_horas_registradas_nonnegative CHECK (horas_registradas >= 0),
    CONSTRAINT ck_tarefa_estimativa_nonnegative CHECK (estimativa_horas IS NULL OR estimativa_horas >= 0)
);

CREATE INDEX IF NOT EXISTS ix_tarefas_projeto_projeto_id ON tarefas_projeto(projeto_id);
CREATE INDEX IF NOT EXISTS ix_tarefas_projeto_responsavel_id ON tarefas_projeto(responsavel_id);
CREATE INDEX IF NOT EXISTS ix_tarefas_projeto_due_date ON tarefas_projeto(due_date);
"#;
