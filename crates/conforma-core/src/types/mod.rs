//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the compliance domain:
//! - Error types (`ConformaError`)
//! - The authenticated principal (`Actor`)
//! - Every status/priority/role enumeration stored in the schema
//!
//! ## Wire and Storage Format
//!
//! Enumerations are stored as TEXT columns and serialized on the wire with
//! the same lowercase values (roles are uppercase). The `text_enum!` macro
//! keeps the two representations in lockstep.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Conforma system.
///
/// - No silent failures
/// - Use `Result<T, ConformaError>` for fallible operations
/// - Messages carried by `NotFound`, `Forbidden`, `Validation` and `Conflict`
///   are user-facing and end up verbatim in HTTP responses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConformaError {
    /// The referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The actor is authenticated but not allowed to perform the action.
    #[error("{0}")]
    Forbidden(String),

    /// Missing or invalid credentials.
    #[error("Credenciais invalidas.")]
    Unauthorized,

    /// Input failed a business or field rule.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    /// An error reported by the database.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A schema migration could not be applied.
    #[error("Migration v{version:03} failed: {message}")]
    Migration { version: u32, message: String },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ConformaError>;

impl From<rusqlite::Error> for ConformaError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, _) = &err {
            match code.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::Conflict("Registro duplicado.".to_string());
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Self::Validation(
                        "Registro referenciado inexistente ou ainda em uso.".to_string(),
                    );
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => {
                    return Self::Validation("Valor fora do intervalo permitido.".to_string());
                }
                _ => {}
            }
        }
        Self::Storage(err.to_string())
    }
}

// =============================================================================
// ACTOR
// =============================================================================

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Row id in `usuarios`.
    pub id: i64,
    /// Role granted to the user.
    pub role: Role,
}

impl Actor {
    /// Create a new actor.
    #[must_use]
    pub const fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    /// Whether the actor holds one of `roles`.
    #[must_use]
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    /// Whether the actor is the restricted `RESPONSAVEL` role.
    #[must_use]
    pub fn is_responsible(&self) -> bool {
        self.role == Role::Responsavel
    }
}

// =============================================================================
// TEXT ENUMS
// =============================================================================

/// Declare an enumeration persisted as TEXT and serialized by wire value.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => ($wire:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Value stored in the database and sent on the wire.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Human readable label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ConformaError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ConformaError::Validation(format!(
                        "Valor invalido para {}: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: ConformaError| FromSqlError::Other(Box::new(e)))
            }
        }

        impl From<$name> for rusqlite::types::Value {
            fn from(value: $name) -> Self {
                rusqlite::types::Value::Text(value.as_str().to_string())
            }
        }
    };
}

text_enum! {
    /// Access role of a user.
    Role {
        Admin => ("ADMIN", "Administrador"),
        Gestor => ("GESTOR", "Gestor"),
        Auditor => ("AUDITOR", "Auditor"),
        Responsavel => ("RESPONSAVEL", "Responsavel"),
    }
}

text_enum! {
    /// Lifecycle of a remediation project.
    ProjectStatus {
        Planejamento => ("planejamento", "Planejamento"),
        EmAndamento => ("em_andamento", "Em Andamento"),
        Pausado => ("pausado", "Pausado"),
        Concluido => ("concluido", "Concluido"),
        Cancelado => ("cancelado", "Cancelado"),
    }
}

text_enum! {
    /// Lifecycle of a project task.
    TaskStatus {
        Backlog => ("backlog", "Backlog"),
        AFazer => ("a_fazer", "A Fazer"),
        EmAndamento => ("em_andamento", "Em Andamento"),
        EmRevisao => ("em_revisao", "Em Revisao"),
        Concluida => ("concluida", "Concluida"),
        Bloqueada => ("bloqueada", "Bloqueada"),
    }
}

text_enum! {
    /// Priority of projects and tasks, severity of notifications.
    ///
    /// Ordering follows declaration: `Baixa < Media < Alta < Critica`.
    Priority {
        Baixa => ("baixa", "Baixa"),
        Media => ("media", "Media"),
        Alta => ("alta", "Alta"),
        Critica => ("critica", "Critica"),
    }
}

text_enum! {
    /// Status of an activity inside a task.
    ActivityStatus {
        Pendente => ("pendente", "Pendente"),
        Concluida => ("concluida", "Concluida"),
    }
}

text_enum! {
    /// Review workflow of an evidence document.
    DocumentStatus {
        EmConstrucao => ("em_construcao", "Em Construcao"),
        EmRevisao => ("em_revisao", "Em Revisao"),
        Aprovado => ("aprovado", "Aprovado"),
        Reprovado => ("reprovado", "Reprovado"),
    }
}

text_enum! {
    /// Monthly compliance status of a criterion.
    ///
    /// Ordering follows declaration and doubles as degradation rank.
    MonitoringStatus {
        SemDados => ("sem_dados", "Sem Dados"),
        Conforme => ("conforme", "Conforme"),
        Alerta => ("alerta", "Alerta"),
        Critico => ("critico", "Critico"),
    }
}

text_enum! {
    /// Lifecycle of a monitoring notification.
    NotificationStatus {
        Aberta => ("aberta", "Aberta"),
        EmTratamento => ("em_tratamento", "Em Tratamento"),
        Resolvida => ("resolvida", "Resolvida"),
        Cancelada => ("cancelada", "Cancelada"),
    }
}

text_enum! {
    /// Lifecycle of a non-conformance analysis.
    AnalysisStatus {
        Aberta => ("aberta", "Aberta"),
        EmAnalise => ("em_analise", "Em Analise"),
        Concluida => ("concluida", "Concluida"),
    }
}

text_enum! {
    /// Outcome of an indicator evaluation.
    EvaluationResult {
        Conforme => ("conforme", "Conforme"),
        NaoConforme => ("nao_conforme", "Nao Conforme"),
        Parcial => ("parcial", "Parcial"),
        NaoAplicavel => ("nao_aplicavel", "Nao Aplicavel"),
    }
}

text_enum! {
    /// Lifecycle of an audit demand.
    DemandStatus {
        Aberta => ("aberta", "Aberta"),
        EmAndamento => ("em_andamento", "Em Andamento"),
        Concluida => ("concluida", "Concluida"),
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Planejamento
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Backlog
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Media
    }
}

impl Default for ActivityStatus {
    fn default() -> Self {
        Self::Pendente
    }
}

impl Default for MonitoringStatus {
    fn default() -> Self {
        Self::SemDados
    }
}

impl Default for AnalysisStatus {
    fn default() -> Self {
        Self::Aberta
    }
}

impl Default for DemandStatus {
    fn default() -> Self {
        Self::Aberta
    }
}

impl ProjectStatus {
    /// Concluded and cancelled projects are never overdue.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Concluido | Self::Cancelado)
    }
}

impl NotificationStatus {
    /// Whether the notification still needs attention.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Aberta | Self::EmTratamento)
    }

    /// Allowed status transitions.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Aberta, Self::EmTratamento | Self::Resolvida | Self::Cancelada)
                | (Self::EmTratamento, Self::Aberta | Self::Resolvida | Self::Cancelada)
                | (Self::Resolvida | Self::Cancelada, Self::Aberta)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
