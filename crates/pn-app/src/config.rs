//! YAML project file: one document describing every pipeline stage.

use crate::error::{AppError, AppResult};
use pn_core::ComponentKind;
use pn_engine::UnitSystem;
use pn_populate::ImportMode;
use pn_sim::{GlobalConditions, SimulationConfig};
use pn_summary::SummaryConfig;
use pn_topology::Layout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub engine: EngineSection,
    pub workbook: WorkbookSection,
    pub topology: TopologySection,
    pub populate: PopulateSection,
    pub cases: CasesSection,
    pub simulation: SimulationSection,
    pub global_conditions: GlobalConditions,
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub units: UnitSystem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookSection {
    /// Input workbook holding every input sheet.
    pub path: PathBuf,
}

impl Default for WorkbookSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("inputs.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologySection {
    pub sheet: String,
    pub layout: Layout,
}

impl Default for TopologySection {
    fn default() -> Self {
        Self {
            sheet: "Component Names".to_string(),
            layout: Layout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulateSection {
    pub mode: ImportMode,
    pub component_sheet: String,
    pub geometry_sheet: String,
    /// Workbook written by `export` and read by `bulk_import`.
    pub export_path: PathBuf,
    pub export_kinds: Vec<ComponentKind>,
}

impl Default for PopulateSection {
    fn default() -> Self {
        Self {
            mode: ImportMode::SimpleImport,
            component_sheet: "Components".to_string(),
            geometry_sheet: "Flowline Geometry".to_string(),
            export_path: PathBuf::from("model_values.json"),
            export_kinds: ComponentKind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixLayout {
    /// Sink-profile cases crossed with conditions.
    #[default]
    Cross,
    /// One parameter table whose value columns are the cases.
    SingleAxis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CasesSection {
    pub mode: MatrixLayout,
    pub profile_sheet: String,
    pub conditions_sheet: String,
    pub parameters_sheet: String,
    /// Attach the sink profile to single-axis cases too.
    pub single_axis_profile: bool,
    pub flow_parameter: String,
}

impl Default for CasesSection {
    fn default() -> Self {
        Self {
            mode: MatrixLayout::Cross,
            profile_sheet: "Sink Profile".to_string(),
            conditions_sheet: "Conditions".to_string(),
            parameters_sheet: "Parameters".to_string(),
            single_axis_profile: false,
            flow_parameter: pn_core::params::LIQUID_FLOW_RATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Template model every case starts from.
    pub base_model: PathBuf,
    #[serde(flatten)]
    pub settings: SimulationConfig,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            base_model: PathBuf::from("base.pnm"),
            settings: SimulationConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Reject values no run could use.
    pub fn validate(&self) -> AppResult<()> {
        let sim = &self.simulation.settings;
        if sim.minimum_flow_rate.is_nan() || sim.minimum_flow_rate <= 0.0 {
            return Err(AppError::Validation(format!(
                "minimum_flow_rate must be positive, got {}",
                sim.minimum_flow_rate
            )));
        }
        if sim.system_variables.is_empty() {
            return Err(AppError::Validation(
                "simulation.system_variables must not be empty".to_string(),
            ));
        }
        if sim.profile_variables.is_empty() {
            return Err(AppError::Validation(
                "simulation.profile_variables must not be empty".to_string(),
            ));
        }
        if self.cases.flow_parameter.trim().is_empty() {
            return Err(AppError::Validation(
                "cases.flow_parameter must not be empty".to_string(),
            ));
        }
        if !self.summary.pumps.is_empty() && self.summary.pressure_parameter.trim().is_empty() {
            return Err(AppError::Validation(
                "summary.pumps requires summary.pressure_parameter".to_string(),
            ));
        }
        for pump in &self.summary.pumps {
            if pump.suction.trim().is_empty() || pump.discharge.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "pump '{}' needs both a suction and a discharge label",
                    pump.name
                )));
            }
        }
        sim.node_conversions.validate()?;
        sim.profile_conversions.validate()?;
        Ok(())
    }

    /// Make relative paths relative to `root` instead of the working directory.
    pub fn resolve_paths(&mut self, root: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        };
        resolve(&mut self.workbook.path);
        resolve(&mut self.populate.export_path);
        resolve(&mut self.simulation.base_model);
        resolve(&mut self.simulation.settings.models_dir);
        resolve(&mut self.simulation.settings.results_dir);
    }
}

/// Load, resolve against the file's directory, and validate.
pub fn load_config(path: &Path) -> AppResult<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: ProjectConfig =
        serde_yaml::from_str(&content).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
    if let Some(root) = path.parent() {
        config.resolve_paths(root);
    }
    config.validate()?;
    tracing::info!(project = %path.display(), "project loaded");
    Ok(config)
}

pub fn save_config(path: &Path, config: &ProjectConfig) -> AppResult<()> {
    let content = serde_yaml::to_string(config).map_err(|source| AppError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(|source| AppError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_takes_defaults() {
        let config: ProjectConfig = serde_yaml::from_str("workbook:\n  path: plant.json\n").unwrap();
        assert_eq!(config.workbook.path, PathBuf::from("plant.json"));
        assert_eq!(config.cases.mode, MatrixLayout::Cross);
        assert_eq!(config.simulation.settings.workers, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flattened_simulation_settings_parse() {
        let yaml = "
engine:
  units: field
cases:
  mode: single_axis
simulation:
  base_model: models/network.pnm
  workers: 4
  deactivate_low_flow: false
  node_conversions:
    Pressure: [psia, barg]
";
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.engine.units, UnitSystem::Field);
        assert_eq!(config.cases.mode, MatrixLayout::SingleAxis);
        assert_eq!(config.simulation.base_model, PathBuf::from("models/network.pnm"));
        assert_eq!(config.simulation.settings.workers, 4);
        assert!(!config.simulation.settings.deactivate_low_flow);
        assert!(!config.simulation.settings.node_conversions.is_empty());
    }

    #[test]
    fn validation_rejects_bad_thresholds_and_empty_variables() {
        let mut config = ProjectConfig::default();
        config.simulation.settings.minimum_flow_rate = 0.0;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        let mut config = ProjectConfig::default();
        config.simulation.settings.profile_variables.clear();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        let mut config = ProjectConfig::default();
        config.summary.pumps.push(pn_summary::PumpLabels {
            name: "P-101".into(),
            suction: "StrainerA".into(),
            discharge: "PumpA".into(),
        });
        config.summary.pressure_parameter.clear();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn relative_paths_follow_the_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yaml");
        save_config(&path, &ProjectConfig::default()).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.workbook.path, dir.path().join("inputs.json"));
        assert_eq!(loaded.simulation.settings.results_dir, dir.path().join("results"));
    }
}
