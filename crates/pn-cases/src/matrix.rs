//! Case enumeration and per-case plans.

use crate::activation::{ActivationMask, MINIMUM_FLOW_RATE};
use crate::conditions::{ConditionRow, ConditionTable, ParameterTable};
use crate::error::{CaseError, CaseResult};
use crate::key::CaseKey;
use crate::profile::SinkProfile;
use pn_core::{SettingKey, Value, params};
use pn_engine::ParameterMap;

/// Everything one case changes on a freshly opened model.
#[derive(Debug, Clone, PartialEq)]
pub struct CasePlan {
    pub key: CaseKey,
    pub overrides: ParameterMap,
    pub settings: Vec<(SettingKey, Value)>,
    pub activation: Option<ActivationMask>,
}

impl CasePlan {
    pub fn label(&self) -> String {
        self.key.label()
    }
}

#[derive(Debug, Clone)]
enum Axes {
    /// Profile columns x condition labels.
    Cross {
        profile: SinkProfile,
        conditions: ConditionTable,
    },
    /// The parameter table's case columns, optionally with flows.
    SingleAxis {
        parameters: ParameterTable,
        profile: Option<SinkProfile>,
    },
}

/// The set of cases to simulate.
#[derive(Debug, Clone)]
pub struct CaseMatrix {
    axes: Axes,
    threshold: f64,
    flow_parameter: String,
}

impl CaseMatrix {
    pub fn cross(profile: SinkProfile, conditions: ConditionTable) -> Self {
        Self::with_axes(Axes::Cross {
            profile,
            conditions,
        })
    }

    pub fn single_axis(parameters: ParameterTable) -> Self {
        Self::with_axes(Axes::SingleAxis {
            parameters,
            profile: None,
        })
    }

    fn with_axes(axes: Axes) -> Self {
        Self {
            axes,
            threshold: MINIMUM_FLOW_RATE,
            flow_parameter: params::LIQUID_FLOW_RATE.to_string(),
        }
    }

    /// Attach sink flows to a single-axis matrix. Cross matrices already carry one.
    pub fn with_profile(mut self, sinks: SinkProfile) -> Self {
        if let Axes::SingleAxis { profile, .. } = &mut self.axes {
            *profile = Some(sinks);
        }
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_flow_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.flow_parameter = parameter.into();
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn flow_parameter(&self) -> &str {
        &self.flow_parameter
    }

    pub fn profile(&self) -> Option<&SinkProfile> {
        match &self.axes {
            Axes::Cross { profile, .. } => Some(profile),
            Axes::SingleAxis { profile, .. } => profile.as_ref(),
        }
    }

    /// All keys, case-major in table order.
    pub fn cases(&self) -> Vec<CaseKey> {
        match &self.axes {
            Axes::Cross {
                profile,
                conditions,
            } => profile
                .cases()
                .iter()
                .flat_map(|case| {
                    conditions
                        .conditions()
                        .iter()
                        .map(move |condition| CaseKey::new(case.clone(), condition.clone()))
                })
                .collect(),
            Axes::SingleAxis { parameters, .. } => {
                parameters.cases().iter().cloned().map(CaseKey::single).collect()
            }
        }
    }

    /// Resolve what `key` changes.
    ///
    /// Rows with no component name, parameter or value are skipped. Rows of
    /// the settings type become typed settings. A plan with nothing in it is
    /// `CaseError::EmptyCase`.
    pub fn plan(&self, key: &CaseKey) -> CaseResult<CasePlan> {
        let rows: Vec<ConditionRow> = match &self.axes {
            Axes::Cross {
                profile,
                conditions,
            } => {
                if !profile.has_case(&key.case) {
                    return Err(unknown_case(key));
                }
                let condition = key
                    .condition
                    .as_deref()
                    .filter(|c| conditions.has_condition(c))
                    .ok_or_else(|| unknown_condition(key))?;
                conditions.rows_for(condition).cloned().collect()
            }
            Axes::SingleAxis { parameters, .. } => {
                if key.condition.is_some() {
                    return Err(unknown_condition(key));
                }
                if !parameters.has_case(&key.case) {
                    return Err(unknown_case(key));
                }
                parameters.rows_for(&key.case)
            }
        };

        let mut overrides = ParameterMap::new();
        let mut settings = Vec::new();
        for row in rows {
            if row.value.is_empty() {
                continue;
            }
            if row.is_setting() {
                let Some(label) = row.parameter else {
                    continue;
                };
                let setting = SettingKey::from_label(&label).map_err(|_| CaseError::UnknownSetting {
                    key: key.label(),
                    label: label.clone(),
                })?;
                settings.push((setting, row.value));
                continue;
            }
            let (Some(component), Some(parameter)) = (row.component, row.parameter) else {
                continue;
            };
            overrides.entry(component).or_default().insert(parameter, row.value);
        }

        let activation = match self.profile() {
            Some(profile) => Some(ActivationMask::from_profile(
                profile,
                &key.case,
                self.threshold,
                &self.flow_parameter,
            )?),
            None => None,
        };

        if overrides.is_empty() && settings.is_empty() && activation.as_ref().is_none_or(ActivationMask::is_empty) {
            tracing::warn!(case = %key, "case has nothing to apply");
            return Err(CaseError::EmptyCase { key: key.label() });
        }

        tracing::debug!(
            case = %key,
            components = overrides.len(),
            settings = settings.len(),
            "case plan resolved"
        );
        Ok(CasePlan {
            key: key.clone(),
            overrides,
            settings,
            activation,
        })
    }

    /// Plans for every case, with the cases that failed to resolve kept
    /// alongside so a run can report them.
    pub fn plans(&self) -> ResolvedCases {
        let mut resolved = ResolvedCases::default();
        for key in self.cases() {
            match self.plan(&key) {
                Ok(plan) => resolved.plans.push(plan),
                Err(e) => {
                    tracing::error!(case = %key, error = %e, "case not resolved");
                    resolved.unresolved.push((key, e));
                }
            }
        }
        resolved
    }
}

/// Every case of a matrix: the plans to run and the keys that failed to resolve.
#[derive(Debug, Default)]
pub struct ResolvedCases {
    pub plans: Vec<CasePlan>,
    pub unresolved: Vec<(CaseKey, CaseError)>,
}

impl ResolvedCases {
    pub fn len(&self) -> usize {
        self.plans.len() + self.unresolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<CasePlan>> for ResolvedCases {
    fn from(plans: Vec<CasePlan>) -> Self {
        Self {
            plans,
            unresolved: Vec::new(),
        }
    }
}

fn unknown_case(key: &CaseKey) -> CaseError {
    CaseError::UnknownCase {
        case: key.case.clone(),
    }
}

fn unknown_condition(key: &CaseKey) -> CaseError {
    CaseError::UnknownCondition {
        condition: key.condition.clone().unwrap_or_default(),
    }
}
