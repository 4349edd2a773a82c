//! Closed vocabularies shared with the simulation engine.
//!
//! The engine accepts a fixed set of component kinds, a fixed set of settable
//! parameters per kind, and a handful of global simulation settings. They are
//! declared here once and treated as immutable configuration.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Parameter and column names understood by the engine and the workbooks.
pub mod params {
    pub const NAME: &str = "Name";
    pub const COMPONENT: &str = "Component";
    pub const IS_ACTIVE: &str = "IsActive";
    pub const X: &str = "X";
    pub const Y: &str = "Y";

    pub const PRESSURE: &str = "Pressure";
    pub const TEMPERATURE: &str = "Temperature";
    pub const LIQUID_FLOW_RATE: &str = "LiquidFlowRate";
    pub const GAS_FLOW_RATE: &str = "GasFlowRate";
    pub const MASS_FLOW_RATE: &str = "MassFlowRate";
    pub const FLOW_RATE_TYPE: &str = "FlowRateType";
    pub const TREAT_AS_SOURCE: &str = "TreatAsSource";

    pub const DETAILED_MODEL: &str = "DetailedModel";
    pub const INNER_DIAMETER: &str = "InnerDiameter";
    pub const WALL_THICKNESS: &str = "WallThickness";
    pub const ROUGHNESS: &str = "Roughness";
    pub const LENGTH: &str = "Length";
    pub const ELEVATION_DIFFERENCE: &str = "ElevationDifference";
    pub const U_VALUE: &str = "UValue";
    pub const AMBIENT_TEMPERATURE: &str = "AmbientTemperature";

    pub const HORIZONTAL_DISTANCE: &str = "HorizontalDistance";
    pub const MEASURED_DISTANCE: &str = "MeasuredDistance";
    pub const ELEVATION: &str = "Elevation";

    pub const PRESSURE_DIFFERENTIAL: &str = "PressureDifferential";
    pub const DISCHARGE_PRESSURE: &str = "DischargePressure";
    pub const EFFICIENCY: &str = "Efficiency";
    pub const SPEED: &str = "Speed";
    pub const BEAN_SIZE: &str = "BeanSize";
    pub const HEAT_DUTY: &str = "HeatDuty";
    pub const PRESSURE_DROP: &str = "PressureDrop";

    /// Boundary-condition row holding the node role (Source, Sink, ...).
    pub const BOUNDARY_NODE_TYPE: &str = "BoundaryNodeType";

    /// Result columns.
    pub const NODE: &str = "Node";
    pub const TYPE: &str = "Type";
    pub const BRANCH: &str = "Branch";
    pub const BRANCH_EQUIPMENT: &str = "BranchEquipment";
    /// Label of the pseudo-row carrying units in engine result tables.
    pub const UNIT_ROW: &str = "Unit";
}

/// Component kinds the engine can author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Source,
    Sink,
    Well,
    Junction,
    Flowline,
    Choke,
    Pump,
    Compressor,
    Separator,
    HeatExchanger,
    CheckValve,
    GenericEquipment,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 12] = [
        ComponentKind::Source,
        ComponentKind::Sink,
        ComponentKind::Well,
        ComponentKind::Junction,
        ComponentKind::Flowline,
        ComponentKind::Choke,
        ComponentKind::Pump,
        ComponentKind::Compressor,
        ComponentKind::Separator,
        ComponentKind::HeatExchanger,
        ComponentKind::CheckValve,
        ComponentKind::GenericEquipment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Source => "Source",
            ComponentKind::Sink => "Sink",
            ComponentKind::Well => "Well",
            ComponentKind::Junction => "Junction",
            ComponentKind::Flowline => "Flowline",
            ComponentKind::Choke => "Choke",
            ComponentKind::Pump => "Pump",
            ComponentKind::Compressor => "Compressor",
            ComponentKind::Separator => "Separator",
            ComponentKind::HeatExchanger => "HeatExchanger",
            ComponentKind::CheckValve => "CheckValve",
            ComponentKind::GenericEquipment => "GenericEquipment",
        }
    }

    /// Pipe/line segments; two of them may never touch without a node in between.
    pub fn is_flow_carrying(self) -> bool {
        matches!(self, ComponentKind::Flowline)
    }

    /// Components that act as network boundaries and carry a driving flow rate.
    pub fn is_flow_boundary(self) -> bool {
        matches!(self, ComponentKind::Sink | ComponentKind::Well)
    }

    /// Components reported as boundary nodes by the engine.
    pub fn is_boundary(self) -> bool {
        matches!(
            self,
            ComponentKind::Source | ComponentKind::Sink | ComponentKind::Well
        )
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        ComponentKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CoreError::UnknownComponentKind {
                value: trimmed.to_string(),
            })
    }
}

/// Global simulation settings. These live on the engine's settings object,
/// not on a component, so they are applied through a dedicated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SettingKey {
    AmbientTemperature,
    AtmosphericPressure,
    SoilType,
    HorizontalFlowCorrelation,
    VerticalFlowCorrelation,
    UseGlobalHeatTransfer,
}

/// Human-readable label, internal attribute key, setting.
const SETTING_TABLE: [(&str, &str, SettingKey); 6] = [
    (
        "Ambient Temperature",
        "ambient_temperature",
        SettingKey::AmbientTemperature,
    ),
    (
        "Atmospheric Pressure",
        "atmospheric_pressure",
        SettingKey::AtmosphericPressure,
    ),
    ("Soil Type", "soil_type", SettingKey::SoilType),
    (
        "Horizontal Flow Correlation",
        "horizontal_flow_correlation",
        SettingKey::HorizontalFlowCorrelation,
    ),
    (
        "Vertical Flow Correlation",
        "vertical_flow_correlation",
        SettingKey::VerticalFlowCorrelation,
    ),
    (
        "Use Global Heat Transfer",
        "use_global_heat_transfer",
        SettingKey::UseGlobalHeatTransfer,
    ),
];

fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl SettingKey {
    /// Resolve a spreadsheet label ("Ambient Temperature", "AmbientTemperature",
    /// "ambient_temperature") to a setting.
    pub fn from_label(label: &str) -> CoreResult<Self> {
        let wanted = normalize_label(label);
        SETTING_TABLE
            .iter()
            .find(|(human, attr, _)| normalize_label(human) == wanted || normalize_label(attr) == wanted)
            .map(|(_, _, key)| *key)
            .ok_or_else(|| CoreError::UnknownSetting {
                label: label.trim().to_string(),
            })
    }

    pub fn label(self) -> &'static str {
        SETTING_TABLE
            .iter()
            .find(|(_, _, key)| *key == self)
            .map(|(human, _, _)| *human)
            .unwrap_or("")
    }

    /// Attribute name on the engine's settings object.
    pub fn attribute(self) -> &'static str {
        SETTING_TABLE
            .iter()
            .find(|(_, _, key)| *key == self)
            .map(|(_, attr, _)| *attr)
            .unwrap_or("")
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Settable parameter names per component kind.
#[derive(Debug, Clone)]
pub struct Registry {
    settable: BTreeMap<ComponentKind, BTreeSet<&'static str>>,
}

impl Registry {
    /// The process-wide registry, built on first use.
    pub fn standard() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    fn build() -> Self {
        use params::*;

        let common = [NAME, IS_ACTIVE, X, Y];
        let boundary = [
            PRESSURE,
            TEMPERATURE,
            LIQUID_FLOW_RATE,
            GAS_FLOW_RATE,
            MASS_FLOW_RATE,
            FLOW_RATE_TYPE,
        ];

        let mut settable = BTreeMap::new();
        for kind in ComponentKind::ALL {
            let extra: &[&'static str] = match kind {
                ComponentKind::Source | ComponentKind::Sink | ComponentKind::Well => &boundary,
                ComponentKind::Junction => &[TREAT_AS_SOURCE],
                ComponentKind::Flowline => &[
                    DETAILED_MODEL,
                    INNER_DIAMETER,
                    WALL_THICKNESS,
                    ROUGHNESS,
                    LENGTH,
                    HORIZONTAL_DISTANCE,
                    ELEVATION_DIFFERENCE,
                    U_VALUE,
                    AMBIENT_TEMPERATURE,
                ],
                ComponentKind::Choke => &[BEAN_SIZE],
                ComponentKind::Pump | ComponentKind::Compressor => {
                    &[PRESSURE_DIFFERENTIAL, DISCHARGE_PRESSURE, EFFICIENCY, SPEED]
                }
                ComponentKind::HeatExchanger => &[HEAT_DUTY, PRESSURE_DROP, TEMPERATURE],
                ComponentKind::Separator | ComponentKind::CheckValve => &[PRESSURE_DROP],
                ComponentKind::GenericEquipment => &[PRESSURE_DROP, PRESSURE_DIFFERENTIAL],
            };
            let names: BTreeSet<&'static str> =
                common.iter().chain(extra.iter()).copied().collect();
            settable.insert(kind, names);
        }

        Self { settable }
    }

    pub fn settable(&self, kind: ComponentKind) -> &BTreeSet<&'static str> {
        static EMPTY: BTreeSet<&'static str> = BTreeSet::new();
        self.settable.get(&kind).unwrap_or(&EMPTY)
    }

    pub fn is_settable(&self, kind: ComponentKind, parameter: &str) -> bool {
        self.settable(kind).contains(parameter)
    }

    /// Columns of a flowline geometry profile.
    pub fn geometry_columns(&self) -> [&'static str; 3] {
        [
            params::HORIZONTAL_DISTANCE,
            params::MEASURED_DISTANCE,
            params::ELEVATION,
        ]
    }
}
