//! # CLI Command Implementations

use crate::api;
use crate::config::Settings;
use conforma_core::{ConformaError, NewUser, Role, Store};
use std::path::Path;

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Open the database and serve the API.
pub async fn cmd_server(settings: &Settings) -> Result<(), ConformaError> {
    let store = Store::open(&settings.database)?;
    let users = store.user_count()?;

    println!("Conforma Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", settings.addr());
    println!("  Database: {:?}", settings.database);
    println!("  Schema:   v{:03}", store.schema_version()?);
    println!();
    println!("Endpoints:");
    println!("  GET  /health - Health check");
    println!("  *    /api/*  - REST API (Authorization: Bearer <token>)");
    println!();
    if users == 0 {
        tracing::warn!(
            "No users registered. Create an administrator with `conforma user-add --nome <n> --email <e>`."
        );
    }
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&settings.addr(), store, &settings.security).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create a new database file with the full schema.
pub fn cmd_init(db_path: &Path, force: bool, json_mode: bool) -> Result<(), ConformaError> {
    if db_path.exists() {
        if !force {
            return Err(ConformaError::Config(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        remove_database(db_path)?;
    }

    let store = Store::open(db_path)?;
    let version = store.schema_version()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "schema_version": version,
        }));
    } else {
        println!("Initialized new database at {:?} (schema v{:03})", db_path, version);
    }
    Ok(())
}

/// Delete a database file together with its WAL side files.
fn remove_database(db_path: &Path) -> Result<(), ConformaError> {
    std::fs::remove_file(db_path)
        .map_err(|e| ConformaError::Io(format!("Remove {:?}: {}", db_path, e)))?;
    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_owned();
        side.push(suffix);
        let side = Path::new(&side);
        if side.exists() {
            std::fs::remove_file(side)
                .map_err(|e| ConformaError::Io(format!("Remove {:?}: {}", side, e)))?;
        }
    }
    Ok(())
}

// =============================================================================
// MIGRATE COMMAND
// =============================================================================

/// Bring an existing database to the latest schema.
///
/// Migrations run whenever the store is opened; this command exists so
/// deployments can do it ahead of starting the server.
pub fn cmd_migrate(db_path: &Path, json_mode: bool) -> Result<(), ConformaError> {
    let store = open_existing(db_path)?;
    let version = store.schema_version()?;

    if json_mode {
        print_json(&serde_json::json!({ "schema_version": version }));
    } else {
        println!("Database {:?} is at schema v{:03}", db_path, version);
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show schema version and row counts per table.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), ConformaError> {
    let store = open_existing(db_path)?;
    let version = store.schema_version()?;
    let counts = store.table_counts()?;

    if json_mode {
        let tables: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(table, count)| ((*table).to_string(), serde_json::Value::from(*count)))
            .collect();
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "schema_version": version,
            "tables": tables,
        }));
        return Ok(());
    }

    println!("Conforma Status");
    println!("===============");
    println!("Database: {:?}", db_path);
    println!("Schema:   v{:03}", version);
    println!();
    let width = counts.iter().map(|(t, _)| t.len()).max().unwrap_or(0);
    for (table, count) in counts {
        println!("{:<width$}  {}", table, count, width = width);
    }
    Ok(())
}

// =============================================================================
// USER-ADD COMMAND
// =============================================================================

/// Register a user without an authenticated actor and print its token.
pub fn cmd_user_add(
    db_path: &Path,
    json_mode: bool,
    nome: String,
    email: String,
    role: Role,
) -> Result<(), ConformaError> {
    let store = Store::open(db_path)?;
    let issued = store.bootstrap_user(&NewUser { nome, email, role })?;

    if json_mode {
        let value = serde_json::to_value(&issued)
            .map_err(|e| ConformaError::Io(format!("Serialize user: {}", e)))?;
        print_json(&value);
    } else {
        println!(
            "Created {} user #{} <{}>",
            issued.usuario.role, issued.usuario.id, issued.usuario.email
        );
        println!();
        println!("API token (shown only once):");
        println!("  {}", issued.token);
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open a database that must already exist; `init` is the only command
/// allowed to create one.
fn open_existing(db_path: &Path) -> Result<Store, ConformaError> {
    if !db_path.is_file() {
        return Err(ConformaError::Config(format!(
            "Database {:?} not found. Run `conforma init` first.",
            db_path
        )));
    }
    Store::open(db_path)
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("conforma.db");

        cmd_init(&db, false, true).expect("first init");
        let again = cmd_init(&db, false, true);
        assert!(matches!(again, Err(ConformaError::Config(_))));
        cmd_init(&db, true, true).expect("forced init");
    }

    #[test]
    fn forced_init_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("conforma.db");

        cmd_user_add(
            &db,
            true,
            "Admin Geral".to_string(),
            "admin@example.com".to_string(),
            Role::Admin,
        )
        .expect("user");
        cmd_init(&db, true, true).expect("forced init");

        let store = Store::open(&db).expect("open");
        assert_eq!(store.user_count().expect("count"), 0);
    }

    #[test]
    fn status_and_migrate_run_after_init() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("novo.db");
        cmd_init(&db, false, true).expect("init");
        cmd_migrate(&db, true).expect("migrate");
        cmd_status(&db, true).expect("status");
    }

    #[test]
    fn status_and_migrate_leave_missing_database_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join("typo.db");

        assert!(matches!(cmd_status(&db, true), Err(ConformaError::Config(_))));
        assert!(matches!(cmd_migrate(&db, false), Err(ConformaError::Config(_))));
        assert!(!db.exists());
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }
}
