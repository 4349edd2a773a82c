//! Error types for the pn-app service layer.

use std::path::PathBuf;

/// Wraps the error of every pipeline stage so CLI and worker callers see
/// one type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read project file: {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write project file: {}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse project file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error(transparent)]
    Core(#[from] pn_core::CoreError),

    #[error(transparent)]
    Table(#[from] pn_tables::TableError),

    #[error(transparent)]
    Engine(#[from] pn_engine::EngineError),

    #[error(transparent)]
    Topology(#[from] pn_topology::TopologyError),

    #[error(transparent)]
    Populate(#[from] pn_populate::PopulateError),

    #[error(transparent)]
    Case(#[from] pn_cases::CaseError),

    #[error(transparent)]
    Simulation(#[from] pn_sim::SimError),

    #[error(transparent)]
    Summary(#[from] pn_summary::SummaryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pn-app operations.
pub type AppResult<T> = Result<T, AppError>;
