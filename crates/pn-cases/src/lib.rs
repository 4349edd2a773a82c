//! pn-cases: enumerate the case matrix and resolve what each case changes.
//!
//! Two input tables drive a matrix run:
//! - a sink profile, one column per case and one row per sink or well
//! - a conditions table of component/parameter/value triples tagged by
//!   condition (or, in the single-axis layout, one value column per case)
//!
//! `CaseMatrix` turns them into `CaseKey`s and, per key, a `CasePlan` the
//! orchestrator can apply to a freshly opened model.

pub mod activation;
pub mod conditions;
pub mod error;
pub mod key;
pub mod matrix;
pub mod profile;

pub use activation::{ActivationMask, MINIMUM_FLOW_RATE, SinkActivation};
pub use conditions::{ConditionRow, ConditionTable, ParameterTable, SIMULATION_SETTINGS_TYPE};
pub use error::{CaseError, CaseResult};
pub use key::CaseKey;
pub use matrix::{CaseMatrix, CasePlan, ResolvedCases};
pub use profile::{SinkProfile, sanitize_label};
