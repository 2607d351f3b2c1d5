//! # conforma-core
//!
//! Domain logic and relational storage for Conforma, a compliance and
//! audit-management backend - THE LOGIC.
//!
//! The crate tracks certification programs and their audits, evidence
//! documents with a review workflow, monthly criterion monitoring that
//! raises notifications, non-conformance analyses (5 whys + SWOT) and a
//! small project/task tracker for remediation work.
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies: the HTTP layer lives in the app
//! - Every operation takes the acting [`Actor`] and checks its role first
//! - All state lives in SQLite behind [`Store`]; the schema only changes
//!   through the versioned migrations in [`storage::migrations`]

// =============================================================================
// MODULES
// =============================================================================

pub mod access;
pub mod activities;
pub mod analyses;
pub mod dashboard;
pub mod documents;
pub mod monitoring;
pub mod notifications;
pub mod primitives;
pub mod programs;
pub mod projects;
pub mod rules;
pub mod storage;
pub mod tasks;
pub mod token;
pub mod types;
pub mod users;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ActivityStatus, Actor, AnalysisStatus, ConformaError, DemandStatus, DocumentStatus,
    EvaluationResult, MonitoringStatus, NotificationStatus, Priority, ProjectStatus, Result, Role,
    TaskStatus,
};

// =============================================================================
// RE-EXPORTS: Storage and Records
// =============================================================================

pub use activities::{Activity, ActivityFilter, ActivityUpdate, NewActivity};
pub use analyses::{Analysis, AnalysisFilter, AnalysisUpdate, NewAnalysis};
pub use dashboard::{ComplianceDashboard, ComplianceScope, ProjectsDashboard, StatusCount};
pub use documents::{Document, DocumentFilter, DocumentReview, DocumentUpdate, NewDocument};
pub use monitoring::{Monitoring, MonitoringFilter, MonitoringUpdate, NewMonitoring};
pub use notifications::{
    NewNotification, NewResolution, Notification, NotificationFilter, NotificationUpdate,
    Resolution,
};
pub use programs::{
    AuditScope, AuditYear, Criterion, Demand, Evaluation, Evidence, NewAuditYear, NewCriterion,
    NewDemand, NewEvaluation, NewEvidence, NewProgram, Program,
};
pub use projects::{NewProject, Project, ProjectFilter, ProjectUpdate};
pub use storage::Store;
pub use tasks::{NewTask, Task, TaskFilter, TaskUpdate};
pub use users::{IssuedToken, NewUser, User};
