//! Schema migrations using PRAGMA user_version.
//!
//! Each migration runs inside its own transaction together with the
//! `user_version` bump, so a failed step leaves the previous version intact.

pub mod v001_users;
pub mod v002_audit_domain;
pub mod v003_documents;
pub mod v004_monitoring;
pub mod v005_analyses;
pub mod v006_projects;
pub mod v007_activities;

use crate::{ConformaError, Result};
use rusqlite::Connection;

/// Every migration with the version it brings the schema to.
pub const MIGRATIONS: &[(&str, u32)] = &[
    (v001_users::MIGRATION_SQL, 1),
    (v002_audit_domain::MIGRATION_SQL, 2),
    (v003_documents::MIGRATION_SQL, 3),
    (v004_monitoring::MIGRATION_SQL, 4),
    (v005_analyses::MIGRATION_SQL, 5),
    (v006_projects::MIGRATION_SQL, 6),
    (v007_activities::MIGRATION_SQL, 7),
];

/// Latest schema version known to this build.
#[must_use]
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(_, version)| *version)
}

/// Run all pending migrations. Returns how many were applied.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    let current = current_version(conn).map_err(|e| ConformaError::Migration {
        version: 0,
        message: e.to_string(),
    })?;

    if current > latest_version() {
        return Err(ConformaError::Migration {
            version: current,
            message: format!(
                "database schema is newer than this build (latest v{:03})",
                latest_version()
            ),
        });
    }

    let mut applied = 0;
    for (sql, version) in MIGRATIONS {
        if current >= *version {
            continue;
        }
        let failed = |e: rusqlite::Error| ConformaError::Migration {
            version: *version,
            message: e.to_string(),
        };

        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(sql).map_err(failed)?;
        tx.pragma_update(None, "user_version", version)
            .map_err(failed)?;
        tx.commit().map_err(failed)?;

        tracing::info!(version = version, "applied migration");
        applied += 1;
    }

    Ok(applied)
}

/// Get the current schema version.
pub fn current_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_once() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("PRAGMA foreign_keys = ON;").expect("pragma");

        assert_eq!(run_migrations(&conn).expect("first run"), MIGRATIONS.len());
        assert_eq!(current_version(&conn).expect("version"), latest_version());
        assert_eq!(run_migrations(&conn).expect("second run"), 0);
    }

    #[test]
    fn versions_are_sequential() {
        for (index, (_, version)) in MIGRATIONS.iter().enumerate() {
            assert_eq!(*version as usize, index + 1);
        }
    }

    #[test]
    fn newer_schema_rejected() {
        let conn = Connection::open_in_memory().expect("open");
        conn.pragma_update(None, "user_version", latest_version() + 1)
            .expect("bump");
        assert!(matches!(
            run_migrations(&conn),
            Err(ConformaError::Migration { .. })
        ));
    }
}
