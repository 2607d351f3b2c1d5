//! # Conforma CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Create a new database file with the current schema
//! - `migrate` - Apply pending schema migrations
//! - `status` - Show schema version and row counts
//! - `user-add` - Register a user and print its API token

mod commands;

use crate::config::{CliOverrides, Settings};
use clap::{Parser, Subcommand};
use conforma_core::{ConformaError, Role};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Conforma - compliance and audit-management server
///
/// Tracks certification programs, evidence documents, criterion monitoring,
/// non-conformance analyses and remediation projects.
#[derive(Parser, Debug)]
#[command(name = "conforma")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database (overrides config and CONFORMA_DATABASE)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new database
    Init {
        /// Replace an existing database file
        #[arg(short, long)]
        force: bool,
    },

    /// Apply pending schema migrations
    Migrate,

    /// Show schema version and row counts
    Status,

    /// Register a user and print its one-time API token
    UserAdd {
        /// Display name
        #[arg(long)]
        nome: String,

        /// E-mail (unique)
        #[arg(long)]
        email: String,

        /// ADMIN, GESTOR, AUDITOR or RESPONSAVEL
        #[arg(long, default_value = "ADMIN")]
        role: Role,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), ConformaError> {
    let (host, port) = match &cli.command {
        Some(Commands::Server { host, port }) => (host.clone(), *port),
        _ => (None, None),
    };
    let settings = Settings::load(
        cli.config.as_deref(),
        &CliOverrides {
            database: cli.database.clone(),
            host,
            port,
        },
    )?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&settings).await,
        Some(Commands::Init { force }) => cmd_init(&settings.database, force, json_mode),
        Some(Commands::Migrate) => cmd_migrate(&settings.database, json_mode),
        Some(Commands::UserAdd { nome, email, role }) => {
            cmd_user_add(&settings.database, json_mode, nome, email, role)
        }
        // No subcommand - show status by default
        Some(Commands::Status) | None => cmd_status(&settings.database, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
