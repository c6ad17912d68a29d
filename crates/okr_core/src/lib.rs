//! Core domain logic for the OKR tracker.
//! This crate is the single source of truth for OKR invariants: entity
//! linkage, derived progress and dashboard aggregation.

pub mod db;
pub mod logging;
pub mod model;
pub mod progress;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::generation::{
    GenerateOkrsRequest, GeneratedKeyResult, GeneratedObjective, GeneratedOkrs,
};
pub use model::initiative::{Initiative, InitiativeDraft, InitiativeId, InitiativeStatus};
pub use model::key_result::{KeyResult, KeyResultDraft, KeyResultId, KeyResultType};
pub use model::objective::{Objective, ObjectiveDraft, ObjectiveId, ObjectiveStatus};
pub use model::tree::{KeyResultTree, ObjectiveTree};
pub use model::validation::ValidationError;
pub use model::EntityKind;
pub use repo::initiative_repo::InitiativeRepository;
pub use repo::key_result_repo::KeyResultRepository;
pub use repo::objective_repo::ObjectiveRepository;
pub use repo::{RepoError, RepoResult, SqliteOkrRepository};
pub use service::dashboard_service::{Dashboard, DashboardService, ObjectiveSummary};
pub use service::okr_service::{CommandOutcome, OkrService, OkrServiceError, OkrServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
