//! pn-engine: the simulation engine seam for pipenet.
//!
//! Provides:
//! - `EngineSession` / `SessionFactory` traits the pipeline authors and runs models through
//! - Engine data types (parameter maps, boundary tables, geometry, run results)
//! - `SessionGuard`, which closes a session on every exit path
//! - `JsonModelFactory`, a model-file backend on disk or in memory with
//!   single-writer locking
//!
//! # Architecture
//!
//! The network solver is an external program. Everything above this crate
//! talks to it only through `EngineSession`, so a different engine binding
//! slots in by implementing the two traits.

pub mod error;
pub mod json_backend;
pub mod model;
pub mod session;
pub mod types;

pub use error::{EngineError, EngineResult};
pub use json_backend::{JsonModelFactory, JsonModelSession, MODEL_EXTENSION};
pub use model::{ComponentRecord, ModelDocument};
pub use session::{EngineSession, SessionFactory, SessionGuard};
pub use types::{
    BoundaryTable, ComponentValues, GeometryMap, GeometryPoint, ParameterMap, RunResult,
    UnitSystem,
};
