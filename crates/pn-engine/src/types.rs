//! Data exchanged with the engine.

use pn_core::{ComponentKind, Table, Value, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit system a model is opened in. Results come back in this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Field,
}

/// Parameter name -> value for one component.
pub type ComponentValues = BTreeMap<String, Value>;

/// Component name -> parameter name -> value.
pub type ParameterMap = BTreeMap<String, ComponentValues>;

/// One station of a flowline's distance/elevation profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryPoint {
    pub horizontal_distance: f64,
    pub measured_distance: f64,
    pub elevation: f64,
}

/// Flowline name -> profile stations, start to end.
pub type GeometryMap = BTreeMap<String, Vec<GeometryPoint>>;

/// Boundary conditions of a model: rows are parameter names, columns are
/// boundary node names.
///
/// The table is always pushed back whole; edit it read-modify-write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryTable {
    nodes: BTreeMap<String, ComponentValues>,
}

impl BoundaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: BTreeMap<String, ComponentValues>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn node(&self, node: &str) -> Option<&ComponentValues> {
        self.nodes.get(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComponentValues)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, node: &str, parameter: &str) -> Option<&Value> {
        self.nodes.get(node)?.get(parameter)
    }

    /// Set one cell. Unknown nodes are not created; returns false instead.
    pub fn set(&mut self, node: &str, parameter: &str, value: Value) -> bool {
        match self.nodes.get_mut(node) {
            Some(values) => {
                values.insert(parameter.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Boundary role of a node (`Sink`, `Source`, ...), if the engine reports one.
    pub fn node_type(&self, node: &str) -> Option<String> {
        self.get(node, params::BOUNDARY_NODE_TYPE).and_then(Value::label)
    }

    /// Names of the nodes whose boundary role is `kind`, in name order.
    pub fn nodes_of_kind(&self, kind: ComponentKind) -> Vec<&str> {
        self.nodes
            .keys()
            .filter(|n| {
                self.node_type(n)
                    .is_some_and(|t| t.eq_ignore_ascii_case(kind.as_str()))
            })
            .map(String::as_str)
            .collect()
    }
}

/// Time-independent results of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Node name -> variable -> value. The `Unit` entry carries the units row.
    #[serde(default)]
    pub node: BTreeMap<String, ComponentValues>,
    /// Branch name -> profile rows. Rows carry a sparse `BranchEquipment` label.
    #[serde(default)]
    pub profile: BTreeMap<String, Table>,
    /// Profile variable -> unit.
    #[serde(default)]
    pub profile_units: BTreeMap<String, String>,
}

impl RunResult {
    /// True when no node other than the units row reported anything.
    pub fn is_empty(&self) -> bool {
        !self.node.keys().any(|k| k != params::UNIT_ROW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary() -> BoundaryTable {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "S1".to_string(),
            ComponentValues::from([
                (params::BOUNDARY_NODE_TYPE.to_string(), Value::from("Sink")),
                (params::LIQUID_FLOW_RATE.to_string(), Value::from(10.0)),
            ]),
        );
        nodes.insert(
            "Src".to_string(),
            ComponentValues::from([(params::BOUNDARY_NODE_TYPE.to_string(), Value::from("Source"))]),
        );
        BoundaryTable::from_nodes(nodes)
    }

    #[test]
    fn node_types_and_kinds() {
        let b = boundary();
        assert_eq!(b.node_type("S1").as_deref(), Some("Sink"));
        assert_eq!(b.node_type("J1"), None);
        assert_eq!(b.nodes_of_kind(ComponentKind::Sink), vec!["S1"]);
        assert_eq!(b.nodes_of_kind(ComponentKind::Source), vec!["Src"]);
    }

    #[test]
    fn set_does_not_create_nodes() {
        let mut b = boundary();
        assert!(b.set("S1", params::LIQUID_FLOW_RATE, Value::from(0.0)));
        assert!(!b.set("Ghost", params::LIQUID_FLOW_RATE, Value::from(1.0)));
        assert!(!b.contains("Ghost"));
        assert_eq!(b.get("S1", params::LIQUID_FLOW_RATE), Some(&Value::from(0.0)));
    }

    #[test]
    fn units_only_result_is_empty() {
        let mut r = RunResult::default();
        assert!(r.is_empty());
        r.node.insert(params::UNIT_ROW.to_string(), ComponentValues::new());
        assert!(r.is_empty());
        r.node.insert("S1".to_string(), ComponentValues::new());
        assert!(!r.is_empty());
    }
}
