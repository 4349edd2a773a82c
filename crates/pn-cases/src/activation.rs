//! Per-case sink activation.

use crate::error::{CaseError, CaseResult};
use crate::profile::SinkProfile;
use pn_core::{Value, params};
use pn_engine::{BoundaryTable, ComponentValues, ParameterMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flow at or below which a sink or well is switched off.
pub const MINIMUM_FLOW_RATE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SinkActivation {
    pub flow: f64,
    pub active: bool,
}

/// Flow and activity of every sink for one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationMask {
    pub case: String,
    /// Boundary parameter the flows are written to, e.g. `LiquidFlowRate`.
    pub flow_parameter: String,
    sinks: BTreeMap<String, SinkActivation>,
}

impl ActivationMask {
    /// A sink stays active only when its flow is strictly above `threshold`.
    pub fn from_profile(
        profile: &SinkProfile,
        case: &str,
        threshold: f64,
        flow_parameter: &str,
    ) -> CaseResult<Self> {
        let column = profile.column(case).ok_or_else(|| CaseError::UnknownCase {
            case: case.to_string(),
        })?;
        let sinks = column
            .into_iter()
            .map(|(sink, flow)| {
                let active = flow > threshold;
                (sink.to_string(), SinkActivation { flow, active })
            })
            .collect();
        Ok(Self {
            case: case.to_string(),
            flow_parameter: flow_parameter.to_string(),
            sinks,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn get(&self, sink: &str) -> Option<SinkActivation> {
        self.sinks.get(sink).copied()
    }

    pub fn sinks(&self) -> impl Iterator<Item = &str> {
        self.sinks.keys().map(String::as_str)
    }

    pub fn inactive(&self) -> Vec<&str> {
        self.sinks
            .iter()
            .filter(|(_, a)| !a.active)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Component values that apply the mask: the flow, `IsActive`, and the
    /// flow-rate type naming the flow parameter.
    pub fn overrides(&self) -> ParameterMap {
        self.sinks
            .iter()
            .map(|(sink, a)| {
                let values = ComponentValues::from([
                    (self.flow_parameter.clone(), Value::from(a.flow)),
                    (params::IS_ACTIVE.to_string(), Value::from(a.active)),
                    (
                        params::FLOW_RATE_TYPE.to_string(),
                        Value::from(self.flow_parameter.as_str()),
                    ),
                ]);
                (sink.clone(), values)
            })
            .collect()
    }

    /// Write the flows into a fetched boundary table. Returns the sinks the
    /// table does not have.
    pub fn write_flows(&self, boundaries: &mut BoundaryTable) -> Vec<String> {
        self.sinks
            .iter()
            .filter(|(sink, a)| !boundaries.set(sink, &self.flow_parameter, Value::from(a.flow)))
            .map(|(sink, _)| sink.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pn_core::Table;
    use pn_tables::SheetRef;

    fn profile() -> SinkProfile {
        let table = Table::from_rows(
            ["Sinks", "A"],
            vec![
                vec!["S1".into(), 100.0.into()],
                vec!["S2".into(), MINIMUM_FLOW_RATE.into()],
                vec!["S3".into(), 0.0011.into()],
                vec!["S4".into(), Value::Empty],
            ],
        );
        SinkProfile::from_table(&table, SheetRef::new("p.json", "Profile")).unwrap()
    }

    #[test]
    fn threshold_is_exclusive() {
        let mask =
            ActivationMask::from_profile(&profile(), "A", MINIMUM_FLOW_RATE, params::LIQUID_FLOW_RATE)
                .unwrap();
        assert!(mask.get("S1").unwrap().active);
        assert!(!mask.get("S2").unwrap().active);
        assert!(mask.get("S3").unwrap().active);
        assert_eq!(mask.inactive(), vec!["S2", "S4"]);
    }

    #[test]
    fn overrides_tag_the_flow_type() {
        let mask = ActivationMask::from_profile(&profile(), "A", MINIMUM_FLOW_RATE, params::MASS_FLOW_RATE)
            .unwrap();
        let o = mask.overrides();
        assert_eq!(o["S2"][params::IS_ACTIVE], Value::Bool(false));
        assert_eq!(o["S1"][params::MASS_FLOW_RATE], Value::from(100.0));
        assert_eq!(o["S1"][params::FLOW_RATE_TYPE], Value::from("MassFlowRate"));
    }

    #[test]
    fn unknown_case_is_rejected() {
        assert!(matches!(
            ActivationMask::from_profile(&profile(), "B", MINIMUM_FLOW_RATE, params::LIQUID_FLOW_RATE),
            Err(CaseError::UnknownCase { .. })
        ));
    }

    #[test]
    fn flows_only_land_on_known_nodes() {
        let mask =
            ActivationMask::from_profile(&profile(), "A", MINIMUM_FLOW_RATE, params::LIQUID_FLOW_RATE)
                .unwrap();
        let mut b = BoundaryTable::from_nodes(BTreeMap::from([
            ("S1".to_string(), ComponentValues::new()),
            ("S2".to_string(), ComponentValues::new()),
        ]));
        assert_eq!(mask.write_flows(&mut b), vec!["S3", "S4"]);
        assert_eq!(b.get("S1", params::LIQUID_FLOW_RATE), Some(&Value::from(100.0)));
    }
}
