//! pn-app: project file, logging and pipeline stages over the pn-* crates.
//!
//! Front ends (the CLI, a background worker) go through [`PipelineContext`]
//! so every stage reads its inputs from one [`ProjectConfig`].

pub mod config;
pub mod error;
pub mod logging;
pub mod worker;
pub mod workflow;

pub use config::{
    CasesSection, EngineSection, MatrixLayout, PopulateSection, ProjectConfig, SimulationSection,
    TopologySection, WorkbookSection, load_config, save_config,
};
pub use error::{AppError, AppResult};
pub use logging::init_logging;
pub use worker::{PipelineJob, PipelineWorker, WorkerMessage};
pub use workflow::{PipelineContext, PopulateOutcome};
