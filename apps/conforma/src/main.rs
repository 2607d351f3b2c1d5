//! # Conforma - Compliance Server
//!
//! The main binary for Conforma.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI for database setup and user bootstrap
//!
//! ## Usage
//!
//! ```bash
//! # Create the database and the first administrator
//! conforma init
//! conforma user-add --nome "Admin" --email admin@example.com --role ADMIN
//!
//! # Start the HTTP server
//! conforma server --host 0.0.0.0 --port 8080
//!
//! # Inspect
//! conforma status --json-mode
//! ```

use clap::Parser;
use conforma::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // CONFORMA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CONFORMA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "conforma=info,conforma_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
   ___             __
  / __|___ _ _  / _|___ _ _ _ __  __ _
 | (__/ _ \ ' \|  _/ _ \ '_| '  \/ _` |
  \___\___/_||_|_| \___/_| |_|_|_\__,_|

  Compliance Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
