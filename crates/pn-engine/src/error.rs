//! Modelling errors.

use pn_core::ComponentKind;
use std::path::PathBuf;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the engine. Every variant names the model file involved.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Model file could not be opened.
    #[error("Failed to open model {}: {reason}", .path.display())]
    Open { path: PathBuf, reason: String },

    /// Model file could not be written.
    #[error("Failed to save model {}: {reason}", .path.display())]
    Save { path: PathBuf, reason: String },

    /// Another session already holds the model file.
    #[error("Model {} is already open in another session", .path.display())]
    Locked { path: PathBuf },

    /// Operation attempted after close.
    #[error("Session for model {} is closed", .path.display())]
    Closed { path: PathBuf },

    #[error("Component '{name}' already exists in model {}", .path.display())]
    AlreadyExists { path: PathBuf, name: String },

    #[error("Components '{from}' and '{to}' are already connected in model {}", .path.display())]
    AlreadyConnected {
        path: PathBuf,
        from: String,
        to: String,
    },

    #[error("Component '{name}' not found in model {}", .path.display())]
    NotFound { path: PathBuf, name: String },

    /// The model has no context for this component kind.
    #[error("Component type {kind} is not supported in model {}", .path.display())]
    UnsupportedContext { path: PathBuf, kind: ComponentKind },

    #[error("Parameter '{parameter}' rejected for component '{component}' in model {}", .path.display())]
    ParameterRejected {
        path: PathBuf,
        component: String,
        parameter: String,
    },

    /// The engine produced no results for the run.
    #[error("Model {} produced no run results", .path.display())]
    NoRunResults { path: PathBuf },

    #[error("I/O error on model {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model {} is not a valid model document", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            EngineError::Open { path, .. }
            | EngineError::Save { path, .. }
            | EngineError::Locked { path }
            | EngineError::Closed { path }
            | EngineError::AlreadyExists { path, .. }
            | EngineError::AlreadyConnected { path, .. }
            | EngineError::NotFound { path, .. }
            | EngineError::UnsupportedContext { path, .. }
            | EngineError::ParameterRejected { path, .. }
            | EngineError::NoRunResults { path }
            | EngineError::Io { path, .. }
            | EngineError::Json { path, .. } => path,
        }
    }

    /// Duplicate creation that a build pass may tolerate.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, EngineError::AlreadyExists { .. })
    }

    pub fn is_already_connected(&self) -> bool {
        matches!(self, EngineError::AlreadyConnected { .. })
    }
}
