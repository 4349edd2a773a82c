//! Model document: the persisted form of one network model.
//!
//! Holds components, connections, flowline geometry, global settings and the
//! results the engine recorded for the model. The JSON backend serializes
//! this document verbatim.

use crate::error::{EngineError, EngineResult};
use crate::types::{
    BoundaryTable, ComponentValues, GeometryMap, ParameterMap, RunResult, UnitSystem,
};
use pn_core::{ComponentKind, Registry, SettingKey, Value, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub kind: ComponentKind,
    #[serde(default)]
    pub parameters: ComponentValues,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub units: UnitSystem,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentRecord>,
    #[serde(default)]
    pub connections: Vec<[String; 2]>,
    #[serde(default)]
    pub geometry: GeometryMap,
    /// Settings keyed by engine attribute name.
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    /// Results recorded against this model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<RunResult>,
}

/// Parameters that make up a node's boundary condition.
const BOUNDARY_PARAMETERS: [&str; 7] = [
    params::IS_ACTIVE,
    params::PRESSURE,
    params::TEMPERATURE,
    params::LIQUID_FLOW_RATE,
    params::GAS_FLOW_RATE,
    params::MASS_FLOW_RATE,
    params::FLOW_RATE_TYPE,
];

impl ModelDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by fixtures: add a component with initial values.
    pub fn with_component(mut self, kind: ComponentKind, name: &str, values: &[(&str, Value)]) -> Self {
        self.components.insert(
            name.to_string(),
            ComponentRecord {
                kind,
                parameters: values
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            },
        );
        self
    }

    pub fn with_connection(mut self, from: &str, to: &str) -> Self {
        self.connections.push([from.to_string(), to.to_string()]);
        self
    }

    pub fn with_results(mut self, results: RunResult) -> Self {
        self.results = Some(results);
        self
    }

    pub fn kind_of(&self, name: &str) -> Option<ComponentKind> {
        self.components.get(name).map(|c| c.kind)
    }

    pub fn is_connected(&self, a: &str, b: &str) -> bool {
        self.connections
            .iter()
            .any(|[x, y]| (x == a && y == b) || (x == b && y == a))
    }

    pub fn add_component(
        &mut self,
        path: &Path,
        kind: ComponentKind,
        name: &str,
        values: Option<&ComponentValues>,
    ) -> EngineResult<()> {
        if self.components.contains_key(name) {
            return Err(EngineError::AlreadyExists {
                path: path.to_path_buf(),
                name: name.to_string(),
            });
        }
        let mut record = ComponentRecord {
            kind,
            parameters: ComponentValues::new(),
        };
        if let Some(values) = values {
            for (parameter, value) in values {
                check_settable(path, name, kind, parameter)?;
                if parameter != params::NAME && !value.is_empty() {
                    record.parameters.insert(parameter.clone(), value.clone());
                }
            }
        }
        self.components.insert(name.to_string(), record);
        Ok(())
    }

    pub fn connect(&mut self, path: &Path, from: &str, to: &str) -> EngineResult<()> {
        for name in [from, to] {
            if !self.components.contains_key(name) {
                return Err(EngineError::NotFound {
                    path: path.to_path_buf(),
                    name: name.to_string(),
                });
            }
        }
        if self.is_connected(from, to) {
            return Err(EngineError::AlreadyConnected {
                path: path.to_path_buf(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.connections.push([from.to_string(), to.to_string()]);
        Ok(())
    }

    /// Every settable parameter of every matching component, unset ones as empty.
    pub fn values(
        &self,
        path: &Path,
        kind: Option<ComponentKind>,
        parameters: Option<&[String]>,
    ) -> EngineResult<ParameterMap> {
        let registry = Registry::standard();
        let mut out = ParameterMap::new();
        for (name, record) in &self.components {
            if kind.is_some_and(|k| k != record.kind) {
                continue;
            }
            let values: ComponentValues = registry
                .settable(record.kind)
                .iter()
                .copied()
                .filter(|p| *p != params::NAME)
                .filter(|p| parameters.is_none_or(|wanted| wanted.iter().any(|w| w.as_str() == *p)))
                .map(|p| {
                    let v = record.parameters.get(p).cloned().unwrap_or_default();
                    (p.to_string(), v)
                })
                .collect();
            out.insert(name.clone(), values);
        }
        if let Some(kind) = kind
            && out.is_empty()
        {
            return Err(EngineError::UnsupportedContext {
                path: path.to_path_buf(),
                kind,
            });
        }
        Ok(out)
    }

    pub fn set_values(&mut self, path: &Path, values: &ParameterMap) -> EngineResult<()> {
        // Check everything first so a rejected parameter leaves the model untouched.
        for (name, parameters) in values {
            let kind = self.kind_of(name).ok_or_else(|| EngineError::NotFound {
                path: path.to_path_buf(),
                name: name.clone(),
            })?;
            for parameter in parameters.keys() {
                check_settable(path, name, kind, parameter)?;
            }
        }
        for (name, parameters) in values {
            let Some(record) = self.components.get_mut(name) else {
                continue;
            };
            for (parameter, value) in parameters {
                if parameter == params::NAME {
                    continue;
                }
                if value.is_empty() {
                    record.parameters.remove(parameter);
                } else {
                    record.parameters.insert(parameter.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    pub fn geometry_of(&self, path: &Path, flowlines: Option<&[String]>) -> EngineResult<GeometryMap> {
        let Some(names) = flowlines else {
            return Ok(self.geometry.clone());
        };
        let mut out = GeometryMap::new();
        for name in names {
            if self.kind_of(name) != Some(ComponentKind::Flowline) {
                return Err(EngineError::NotFound {
                    path: path.to_path_buf(),
                    name: name.clone(),
                });
            }
            if let Some(points) = self.geometry.get(name) {
                out.insert(name.clone(), points.clone());
            }
        }
        Ok(out)
    }

    pub fn set_geometry(&mut self, path: &Path, geometry: &GeometryMap) -> EngineResult<()> {
        for name in geometry.keys() {
            if self.kind_of(name) != Some(ComponentKind::Flowline) {
                return Err(EngineError::NotFound {
                    path: path.to_path_buf(),
                    name: name.clone(),
                });
            }
        }
        for (name, points) in geometry {
            self.geometry.insert(name.clone(), points.clone());
        }
        Ok(())
    }

    /// Boundary conditions derived from the boundary components.
    pub fn boundary_table(&self) -> BoundaryTable {
        let nodes = self
            .components
            .iter()
            .filter(|(_, record)| record.kind.is_boundary())
            .map(|(name, record)| {
                let mut values: ComponentValues = BOUNDARY_PARAMETERS
                    .iter()
                    .map(|p| (p.to_string(), record.parameters.get(*p).cloned().unwrap_or_default()))
                    .collect();
                if values.get(params::IS_ACTIVE).is_some_and(Value::is_empty) {
                    values.insert(params::IS_ACTIVE.to_string(), Value::Bool(true));
                }
                values.insert(
                    params::BOUNDARY_NODE_TYPE.to_string(),
                    Value::from(record.kind.as_str()),
                );
                (name.clone(), values)
            })
            .collect();
        BoundaryTable::from_nodes(nodes)
    }

    pub fn apply_boundaries(&mut self, path: &Path, boundaries: &BoundaryTable) -> EngineResult<()> {
        let mut updates = ParameterMap::new();
        for (node, values) in boundaries.iter() {
            let filtered: ComponentValues = values
                .iter()
                .filter(|(k, _)| k.as_str() != params::BOUNDARY_NODE_TYPE)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            updates.insert(node.to_string(), filtered);
        }
        self.set_values(path, &updates)
    }

    pub fn set_setting(&mut self, key: SettingKey, value: &Value) {
        self.settings.insert(key.attribute().to_string(), value.clone());
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.components
            .get(name)
            .and_then(|r| r.parameters.get(params::IS_ACTIVE))
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Validation messages for the current model state.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for [a, b] in &self.connections {
            for end in [a, b] {
                if !self.components.contains_key(end) {
                    errors.push(format!("Connection references missing component '{end}'"));
                }
            }
        }
        for (name, record) in &self.components {
            match record.kind {
                kind if kind.is_flow_boundary() && self.is_active(name) => {
                    let Some(rate_type) = record
                        .parameters
                        .get(params::FLOW_RATE_TYPE)
                        .and_then(Value::label)
                    else {
                        continue;
                    };
                    let flow = record.parameters.get(&rate_type).and_then(Value::as_f64);
                    if !flow.is_some_and(|f| f > 0.0) {
                        errors.push(format!("{kind} '{name}' is active with no {rate_type}"));
                    }
                }
                ComponentKind::Flowline => {
                    let detailed = record
                        .parameters
                        .get(params::DETAILED_MODEL)
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    let stations = self.geometry.get(name).map_or(0, Vec::len);
                    if detailed && stations < 2 {
                        errors.push(format!(
                            "Flowline '{name}' is detailed but has {stations} geometry stations"
                        ));
                    }
                }
                _ => {}
            }
        }
        errors
    }

    /// Recorded results, restricted to the requested variables.
    ///
    /// An empty variable list means every variable.
    pub fn run(
        &self,
        path: &Path,
        system_variables: &[String],
        profile_variables: &[String],
    ) -> EngineResult<RunResult> {
        let recorded = self.results.as_ref().ok_or_else(|| EngineError::NoRunResults {
            path: path.to_path_buf(),
        })?;
        let keep = |wanted: &[String], var: &str| wanted.is_empty() || wanted.iter().any(|w| w == var);

        let node = recorded
            .node
            .iter()
            .filter(|(name, _)| name.as_str() == params::UNIT_ROW || self.is_active(name))
            .map(|(name, values)| {
                let values = values
                    .iter()
                    .filter(|(var, _)| keep(system_variables, var))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                (name.clone(), values)
            })
            .collect();

        let profile = recorded
            .profile
            .iter()
            .map(|(branch, table)| {
                let columns: Vec<&str> = table
                    .columns()
                    .iter()
                    .map(String::as_str)
                    .filter(|c| *c == params::BRANCH_EQUIPMENT || keep(profile_variables, c))
                    .collect();
                (branch.clone(), table.select(&columns))
            })
            .collect();

        let profile_units = recorded
            .profile_units
            .iter()
            .filter(|(var, _)| keep(profile_variables, var))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(RunResult {
            node,
            profile,
            profile_units,
        })
    }
}

fn check_settable(path: &Path, name: &str, kind: ComponentKind, parameter: &str) -> EngineResult<()> {
    if Registry::standard().is_settable(kind, parameter) {
        Ok(())
    } else {
        Err(EngineError::ParameterRejected {
            path: path.to_path_buf(),
            component: name.to_string(),
            parameter: parameter.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeometryPoint;

    fn path() -> &'static Path {
        Path::new("model.pnm")
    }

    fn sample() -> ModelDocument {
        ModelDocument::new()
            .with_component(ComponentKind::Source, "Src", &[(params::PRESSURE, Value::from(50.0))])
            .with_component(ComponentKind::Flowline, "FL1", &[])
            .with_component(
                ComponentKind::Sink,
                "S1",
                &[
                    (params::FLOW_RATE_TYPE, Value::from(params::LIQUID_FLOW_RATE)),
                    (params::LIQUID_FLOW_RATE, Value::from(100.0)),
                ],
            )
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut doc = sample();
        let err = doc.add_component(path(), ComponentKind::Junction, "S1", None).unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn connect_checks_endpoints_and_duplicates() {
        let mut doc = sample();
        doc.connect(path(), "Src", "FL1").unwrap();
        assert!(doc.connect(path(), "FL1", "Src").unwrap_err().is_already_connected());
        assert!(matches!(
            doc.connect(path(), "FL1", "Nope"),
            Err(EngineError::NotFound { ref name, .. }) if name == "Nope"
        ));
    }

    #[test]
    fn values_for_missing_kind_is_unsupported() {
        let doc = sample();
        assert!(matches!(
            doc.values(path(), Some(ComponentKind::Pump), None),
            Err(EngineError::UnsupportedContext { .. })
        ));
        let sinks = doc.values(path(), Some(ComponentKind::Sink), None).unwrap();
        assert_eq!(sinks["S1"][params::LIQUID_FLOW_RATE], Value::from(100.0));
        assert_eq!(sinks["S1"][params::PRESSURE], Value::Empty);
    }

    #[test]
    fn rejected_parameter_leaves_model_untouched() {
        let mut doc = sample();
        let mut update = ParameterMap::new();
        update.insert(
            "Src".into(),
            ComponentValues::from([(params::PRESSURE.to_string(), Value::from(99.0))]),
        );
        update.insert(
            "S1".into(),
            ComponentValues::from([(params::BEAN_SIZE.to_string(), Value::from(1.0))]),
        );
        assert!(matches!(
            doc.set_values(path(), &update),
            Err(EngineError::ParameterRejected { .. })
        ));
        assert_eq!(
            doc.components["Src"].parameters[params::PRESSURE],
            Value::from(50.0)
        );
    }

    #[test]
    fn validation_flags_zero_flow_and_short_profiles() {
        let mut doc = sample();
        assert!(doc.validate().is_empty());

        doc.components
            .get_mut("S1")
            .unwrap()
            .parameters
            .insert(params::LIQUID_FLOW_RATE.into(), Value::from(0.0));
        assert_eq!(doc.validate().len(), 1);

        doc.components
            .get_mut("S1")
            .unwrap()
            .parameters
            .insert(params::IS_ACTIVE.into(), Value::Bool(false));
        assert!(doc.validate().is_empty());

        doc.components
            .get_mut("FL1")
            .unwrap()
            .parameters
            .insert(params::DETAILED_MODEL.into(), Value::Bool(true));
        assert_eq!(doc.validate().len(), 1);
        doc.geometry.insert(
            "FL1".into(),
            vec![
                GeometryPoint {
                    horizontal_distance: 0.0,
                    measured_distance: 0.0,
                    elevation: 10.0,
                },
                GeometryPoint {
                    horizontal_distance: 500.0,
                    measured_distance: 510.0,
                    elevation: 4.0,
                },
            ],
        );
        assert!(doc.validate().is_empty());
    }

    #[test]
    fn boundary_table_round_trips_through_components() {
        let mut doc = sample();
        let mut table = doc.boundary_table();
        assert_eq!(table.node_type("S1").as_deref(), Some("Sink"));
        assert!(!table.contains("FL1"));
        table.set("S1", params::LIQUID_FLOW_RATE, Value::from(5.0));
        doc.apply_boundaries(path(), &table).unwrap();
        assert_eq!(
            doc.components["S1"].parameters[params::LIQUID_FLOW_RATE],
            Value::from(5.0)
        );
    }

    #[test]
    fn run_without_recorded_results_is_an_error() {
        assert!(matches!(
            sample().run(path(), &[], &[]),
            Err(EngineError::NoRunResults { .. })
        ));
    }
}
