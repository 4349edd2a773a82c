//! pn-sim: drive cases through the engine and collect their results.
//!
//! Each case walks a fixed sequence of stages on its own session:
//! open, fetch boundaries, apply global conditions, apply the case plan,
//! apply the sink mask, validate, run, reshape and write results, save the
//! variant, close. A failure stops that case at the stage it reached; the
//! matrix carries on with the next one.
//!
//! Matrices run sequentially or on a bounded rayon pool. In the pool every
//! case first duplicates the template to its own variant file so no two
//! workers share a model.

pub mod config;
pub mod error;
pub mod global;
pub mod manifest;
pub mod orchestrator;
pub mod reshape;
pub mod stage;

pub use config::{MANIFEST_FILE, NODE_RESULTS_FILE, PROFILE_RESULTS_FILE, SimulationConfig};
pub use error::{SimError, SimResult};
pub use global::GlobalConditions;
pub use manifest::MatrixReport;
pub use orchestrator::{CopyReport, MatrixEvent, RESULTS_ANCHOR, SimulationOrchestrator};
pub use reshape::{reshape_nodes, reshape_profiles};
pub use stage::{CaseOutcome, CaseRecord, CaseStage};
