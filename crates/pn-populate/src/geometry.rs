//! Flowline geometry import.

use crate::import::ParameterPopulator;
use pn_core::{Value, params};
use pn_engine::{ComponentValues, EngineSession, GeometryMap, GeometryPoint, ParameterMap};
use pn_tables::{SheetRef, TableError, TableResult};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryReport {
    pub imported: Vec<String>,
    pub failed: Vec<String>,
}

impl ParameterPopulator<'_> {
    /// Read a geometry sheet into per-flowline profiles.
    ///
    /// `Name` and `Elevation` are mandatory and `Name` is filled down.
    /// Distances default to each other when only one is given. Rows without
    /// numbers are skipped, as are flowlines with fewer than two stations.
    pub fn load_geometry_table(&self, path: &Path, sheet: &str) -> TableResult<GeometryMap> {
        let origin = SheetRef::new(path, sheet);
        let mut table = self
            .source
            .read_sheet(path, sheet)
            .map_err(TableError::logged)?;
        let missing: Vec<&str> = [params::NAME, params::ELEVATION]
            .into_iter()
            .filter(|c| !table.has_column(c))
            .collect();
        if !missing.is_empty() {
            return Err(origin.missing_columns(missing).logged());
        }
        table.forward_fill(params::NAME);

        let number = |row: usize, col: &str| table.cell(row, col).and_then(Value::as_f64);
        let mut profiles = GeometryMap::new();
        for row in 0..table.len() {
            let Some(name) = table.cell(row, params::NAME).and_then(Value::label) else {
                continue;
            };
            let horizontal = number(row, params::HORIZONTAL_DISTANCE);
            let measured = number(row, params::MEASURED_DISTANCE);
            let (Some(elevation), Some(distance)) = (number(row, params::ELEVATION), horizontal.or(measured)) else {
                tracing::warn!(sheet = %origin, flowline = %name, row = row + 1, "geometry row without numbers skipped");
                continue;
            };
            profiles.entry(name).or_default().push(GeometryPoint {
                horizontal_distance: horizontal.unwrap_or(distance),
                measured_distance: measured.unwrap_or(distance),
                elevation,
            });
        }

        profiles.retain(|name, points| {
            let keep = points.len() >= 2;
            if !keep {
                tracing::warn!(sheet = %origin, flowline = %name, "fewer than two geometry stations, skipped");
            }
            keep
        });
        tracing::info!(sheet = %origin, flowlines = profiles.len(), "geometry loaded");
        Ok(profiles)
    }

    /// Switch each flowline to a detailed model, then push its profile.
    ///
    /// A flowline the engine rejects is logged and the rest continue.
    pub fn import_geometry(
        &self,
        session: &mut dyn EngineSession,
        geometry: &GeometryMap,
    ) -> GeometryReport {
        let mut report = GeometryReport::default();

        let mut detailed = Vec::new();
        for name in geometry.keys() {
            let update = ParameterMap::from([(
                name.clone(),
                ComponentValues::from([(params::DETAILED_MODEL.to_string(), Value::Bool(true))]),
            )]);
            match session.set_values(&update) {
                Ok(()) => detailed.push(name),
                Err(e) => {
                    tracing::error!(flowline = %name, error = %e, "cannot switch to detailed model");
                    report.failed.push(name.clone());
                }
            }
        }

        for name in detailed {
            let profile = GeometryMap::from([(name.clone(), geometry[name].clone())]);
            match session.set_geometry(&profile) {
                Ok(()) => report.imported.push(name.clone()),
                Err(e) => {
                    tracing::error!(flowline = %name, error = %e, "error setting geometry");
                    report.failed.push(name.clone());
                }
            }
        }
        tracing::info!(imported = report.imported.len(), failed = report.failed.len(), "flowline geometry imported");
        report
    }
}
