//! Orchestrator settings.

use pn_cases::MINIMUM_FLOW_RATE;
use pn_core::{UnitConversions, params};
use pn_engine::UnitSystem;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const NODE_RESULTS_FILE: &str = "Node_Results.json";
pub const PROFILE_RESULTS_FILE: &str = "Profile_Results.json";
pub const MANIFEST_FILE: &str = "matrix_manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub units: UnitSystem,
    /// Node variables requested from each run.
    pub system_variables: Vec<String>,
    /// Profile variables requested from each run.
    pub profile_variables: Vec<String>,
    /// Switch off sinks at or below `minimum_flow_rate` before validating.
    pub deactivate_low_flow: bool,
    pub minimum_flow_rate: f64,
    pub node_conversions: UnitConversions,
    pub profile_conversions: UnitConversions,
    /// Cases run concurrently; 0 or 1 runs them one after another.
    pub workers: usize,
    pub models_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            system_variables: vec![
                params::PRESSURE.to_string(),
                params::TEMPERATURE.to_string(),
                params::LIQUID_FLOW_RATE.to_string(),
            ],
            profile_variables: vec![params::PRESSURE.to_string(), params::TEMPERATURE.to_string()],
            deactivate_low_flow: true,
            minimum_flow_rate: MINIMUM_FLOW_RATE,
            node_conversions: UnitConversions::new(),
            profile_conversions: UnitConversions::new(),
            workers: 1,
            models_dir: PathBuf::from("models"),
            results_dir: PathBuf::from("results"),
        }
    }
}

impl SimulationConfig {
    pub fn node_results_path(&self) -> PathBuf {
        self.results_dir.join(NODE_RESULTS_FILE)
    }

    pub fn profile_results_path(&self) -> PathBuf {
        self.results_dir.join(PROFILE_RESULTS_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.results_dir.join(MANIFEST_FILE)
    }
}
