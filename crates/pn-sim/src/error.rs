//! Error types for case simulation.

use pn_cases::CaseError;
use pn_core::CoreError;
use pn_engine::EngineError;
use pn_tables::TableError;
use std::path::PathBuf;
use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

/// Errors fatal to one case. The matrix logs them and moves on.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Model {} failed validation: {}", .path.display(), .errors.join("; "))]
    ValidationFailed { path: PathBuf, errors: Vec<String> },

    #[error("Run of model {} returned no node results", .path.display())]
    EmptyResults { path: PathBuf },

    /// The profile and the model disagree on the set of sinks.
    #[error(
        "Sinks of model {} do not match the profile (missing in model: {missing_in_model:?}, missing in profile: {missing_in_profile:?})",
        .path.display()
    )]
    SinkMismatch {
        path: PathBuf,
        missing_in_model: Vec<String>,
        missing_in_profile: Vec<String>,
    },

    #[error("Case {case} cancelled before start")]
    Cancelled { case: String },

    #[error("Failed to build worker pool: {reason}")]
    ThreadPool { reason: String },

    #[error("Failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Run manifest {} is not valid JSON", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Case(#[from] CaseError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
