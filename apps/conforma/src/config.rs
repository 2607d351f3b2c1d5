//! # Configuration
//!
//! Server settings with layered resolution, lowest to highest precedence:
//!
//! 1. Compiled defaults
//! 2. TOML file passed with `--config` (sections `[server]`, `[database]`,
//!    `[security]`)
//! 3. Environment variables (`CONFORMA_*`)
//! 4. CLI flags
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 9000
//!
//! [database]
//! path = "/var/lib/conforma/conforma.db"
//!
//! [security]
//! cors_origins = ["https://painel.example.com"]
//! rate_limit = 50
//! ```

use conforma_core::ConformaError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default requests per second for the global rate limiter.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// FILE FORMAT
// =============================================================================

/// Shape of the optional TOML file. Every key is optional; unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub security: SecuritySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    pub cors_origins: Option<Vec<String>>,
    pub rate_limit: Option<u32>,
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorsPolicy {
    /// Only `localhost`/`127.0.0.1` on ports 3000 and 8080.
    #[default]
    LocalhostOnly,
    /// Any origin (`*`).
    Any,
    /// An explicit allow-list.
    Origins(Vec<String>),
}

impl CorsPolicy {
    /// Parse a comma-separated origin list; `*` allows everything.
    pub fn parse(value: &str) -> Self {
        Self::from_list(value.split(',').map(str::to_string).collect())
    }

    fn from_list(origins: Vec<String>) -> Self {
        let origins: Vec<String> = origins
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if origins.iter().any(|o| o == "*") {
            Self::Any
        } else if origins.is_empty() {
            Self::LocalhostOnly
        } else {
            Self::Origins(origins)
        }
    }
}

/// Settings for the HTTP middleware stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuritySettings {
    pub cors: CorsPolicy,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            cors: CorsPolicy::default(),
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub security: SecuritySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: PathBuf::from("conforma.db"),
            security: SecuritySettings::default(),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Settings {
    /// Resolve settings from every layer, reading the process environment.
    pub fn load(config_file: Option<&Path>, cli: &CliOverrides) -> Result<Self, ConformaError> {
        let mut settings = Self::default();
        if let Some(path) = config_file {
            let content = std::fs::read_to_string(path).map_err(|e| {
                ConformaError::Config(format!("cannot read {}: {}", path.display(), e))
            })?;
            settings.merge_file(Self::parse_file(&content)?);
        }
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.apply_cli(cli);
        Ok(settings)
    }

    /// Defaults merged with a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConformaError> {
        let mut settings = Self::default();
        settings.merge_file(Self::parse_file(content)?);
        Ok(settings)
    }

    fn parse_file(content: &str) -> Result<FileConfig, ConformaError> {
        toml::from_str(content).map_err(|e| ConformaError::Config(format!("invalid TOML: {}", e)))
    }

    fn merge_file(&mut self, file: FileConfig) {
        if let Some(host) = file.server.host {
            self.host = host;
        }
        if let Some(port) = file.server.port {
            self.port = port;
        }
        if let Some(path) = file.database.path {
            self.database = path;
        }
        if let Some(origins) = file.security.cors_origins {
            self.security.cors = CorsPolicy::from_list(origins);
        }
        if let Some(rate_limit) = file.security.rate_limit {
            self.security.rate_limit = rate_limit;
        }
    }

    /// Apply `CONFORMA_*` variables obtained through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConformaError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("CONFORMA_HOST") {
            self.host = host;
        }
        if let Some(port) = var("CONFORMA_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConformaError::Config(format!("CONFORMA_PORT is not a port: {}", port)))?;
        }
        if let Some(path) = var("CONFORMA_DATABASE") {
            self.database = PathBuf::from(path);
        }
        if let Some(origins) = var("CONFORMA_CORS_ORIGINS") {
            self.security.cors = CorsPolicy::parse(&origins);
        }
        if let Some(limit) = var("CONFORMA_RATE_LIMIT") {
            self.security.rate_limit = limit.trim().parse().map_err(|_| {
                ConformaError::Config(format!("CONFORMA_RATE_LIMIT is not a number: {}", limit))
            })?;
        }
        Ok(())
    }

    fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(database) = &cli.database {
            self.database = database.clone();
        }
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
    }

    /// `host:port` for the listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================
