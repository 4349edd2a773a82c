//! Conditions shared by every case.

use pn_core::{SettingKey, Value, params};
use pn_engine::{ComponentValues, EngineResult, EngineSession, ParameterMap};
use serde::{Deserialize, Serialize};

/// Source state, pump differential and ambient temperature applied before
/// the case's own overrides. Unset fields leave the model alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConditions {
    pub source_name: Option<String>,
    pub source_pressure: Option<f64>,
    pub source_temperature: Option<f64>,
    pub pump_names: Vec<String>,
    pub differential_pressure: Option<f64>,
    pub ambient_temperature: Option<f64>,
}

impl GlobalConditions {
    pub fn is_empty(&self) -> bool {
        self.overrides().is_empty() && self.ambient_temperature.is_none()
    }

    pub fn overrides(&self) -> ParameterMap {
        let mut out = ParameterMap::new();
        if let Some(source) = &self.source_name {
            let mut values = ComponentValues::new();
            if let Some(p) = self.source_pressure {
                values.insert(params::PRESSURE.to_string(), Value::from(p));
            }
            if let Some(t) = self.source_temperature {
                values.insert(params::TEMPERATURE.to_string(), Value::from(t));
            }
            if !values.is_empty() {
                out.insert(source.clone(), values);
            }
        }
        if let Some(dp) = self.differential_pressure {
            for pump in &self.pump_names {
                out.insert(
                    pump.clone(),
                    ComponentValues::from([(params::PRESSURE_DIFFERENTIAL.to_string(), Value::from(dp))]),
                );
            }
        }
        out
    }

    /// Push onto the session and reset so the next read observes it.
    pub fn apply(&self, session: &mut dyn EngineSession) -> EngineResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        if let Some(t) = self.ambient_temperature {
            session.set_setting(SettingKey::AmbientTemperature, &Value::from(t))?;
        }
        let overrides = self.overrides();
        if !overrides.is_empty() {
            session.set_values(&overrides)?;
        }
        session.reset_conditions()?;
        tracing::info!(model = %session.model_path().display(), components = overrides.len(), "global conditions set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_set_fields_become_overrides() {
        let g = GlobalConditions {
            source_name: Some("Src".into()),
            source_pressure: Some(30.0),
            pump_names: vec!["P1".into(), "P2".into()],
            differential_pressure: Some(12.0),
            ..Default::default()
        };
        let o = g.overrides();
        assert_eq!(o.len(), 3);
        assert_eq!(o["Src"].len(), 1);
        assert_eq!(o["P2"][params::PRESSURE_DIFFERENTIAL], Value::from(12.0));

        let pumps_without_dp = GlobalConditions {
            pump_names: vec!["P1".into()],
            ..Default::default()
        };
        assert!(pumps_without_dp.is_empty());
    }
}
