//! # SQLite Storage
//!
//! `Store` owns the rusqlite connection. Opening a store applies the
//! connection pragmas and brings the schema up to date through the
//! versioned migrations in [`migrations`].
//!
//! Repositories (`users`, `programs`, `documents`, ...) are implemented as
//! further `impl Store` blocks in their own modules and share the query
//! helpers defined here.

pub mod migrations;

use crate::{ConformaError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::FromSql;
use rusqlite::{Connection, OptionalExtension, Params, Row, ToSql, params_from_iter};
use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;

/// Tables reported by [`Store::table_counts`], in schema order.
pub const TABLES: &[&str] = &[
    "usuarios",
    "programas_certificacao",
    "auditorias_ano",
    "criterios",
    "evidencias",
    "avaliacoes_indicador",
    "demandas",
    "documentos_evidencia",
    "monitoramentos_criterio",
    "notificacoes_monitoramento",
    "resolucoes_notificacao",
    "analises_nao_conformidade",
    "projetos",
    "tarefas_projeto",
    "atividades_subdemanda",
];

/// Relational store backing every Conforma repository.
pub struct Store {
    conn: Connection,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.conn.path())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open or create the database at `path` and migrate it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        Self::init(conn)
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            ",
        )?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Current schema version (`PRAGMA user_version`).
    pub fn schema_version(&self) -> Result<u32> {
        migrations::current_version(&self.conn)
    }

    /// Row count of every table, for status reports.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        TABLES
            .iter()
            .map(|table| {
                let count: i64 =
                    self.conn
                        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                            row.get(0)
                        })?;
                Ok((*table, count))
            })
            .collect()
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `sql` and map every row.
    pub(crate) fn query_list<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Run `sql` expecting at most one row; `NotFound(missing)` otherwise.
    pub(crate) fn query_one<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
        missing: &str,
    ) -> Result<T> {
        self.conn
            .query_row(sql, params, map)
            .optional()?
            .ok_or_else(|| ConformaError::NotFound(missing.to_string()))
    }

    /// Whether `sql` returns at least one row.
    pub(crate) fn exists<P: Params>(&self, sql: &str, params: P) -> Result<bool> {
        let mut stmt = self.conn.prepare(sql)?;
        Ok(stmt.exists(params)?)
    }

    /// `SELECT key, COUNT(*) ... GROUP BY key` collected into a map.
    pub(crate) fn grouped_counts<K: FromSql + Eq + Hash>(
        &self,
        sql: &str,
        filter: &Filter,
    ) -> Result<HashMap<K, i64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(filter.params(), |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
    }

    /// Single `COUNT(*)` style scalar.
    pub(crate) fn count(&self, sql: &str, filter: &Filter) -> Result<i64> {
        Ok(self.conn.query_row(sql, filter.params(), |row| row.get(0))?)
    }

    /// Id of the last inserted row.
    pub(crate) fn last_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }
}

// =============================================================================
// FILTERS
// =============================================================================

/// Incrementally built `WHERE` clause with positional parameters.
#[derive(Default)]
pub(crate) struct Filter {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Filter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a clause holding exactly one `?` bound to `value`.
    pub(crate) fn push(&mut self, clause: impl Into<String>, value: impl ToSql + 'static) {
        self.clauses.push(clause.into());
        self.params.push(Box::new(value));
    }

    /// Add a clause binding one `?` per item of `values`, in order.
    pub(crate) fn push_each<T: ToSql + 'static>(
        &mut self,
        clause: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) {
        self.clauses.push(clause.into());
        for value in values {
            self.params.push(Box::new(value));
        }
    }

    /// `column = ?` when `value` is present.
    pub(crate) fn eq<T: ToSql + 'static>(&mut self, column: &str, value: Option<T>) {
        if let Some(value) = value {
            self.push(format!("{} = ?", column), value);
        }
    }

    /// Add a clause without parameters.
    pub(crate) fn raw(&mut self, clause: impl Into<String>) {
        self.clauses.push(clause.into());
    }

    /// ` WHERE a AND b`, or an empty string.
    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> impl Params + '_ {
        params_from_iter(self.params.iter())
    }
}

// =============================================================================
// CLOCK
// =============================================================================

/// Current UTC timestamp stored in `created_at`/`updated_at`.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC calendar date, the reference for overdue checks.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
