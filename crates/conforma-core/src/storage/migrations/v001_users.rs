//! V001: users and their API token digests.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS usuarios (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    email TEXT NOT NULL COLLATE NOCASE,
    role TEXT NOT NULL CHECK (role IN ('ADMIN', 'GESTOR', 'AUDITOR', 'RESPONSAVEL')),
    token_digest TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS ix_usuarios_email ON usuarios(email);
"#;
