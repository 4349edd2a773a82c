//! Cross-case summary of the node and profile result workbooks.

use crate::error::{SummaryError, SummaryResult};
use crate::extremes::{CASE_COLUMN, MIN_MAX_COLUMN, MinMaxRow, min_max_rows};
use crate::pumps::{OperatingPoint, PumpLabels, operating_point};
use crate::regime::{OPERATION_COLUMN, RegimeRule};
use pn_core::{Table, Value, params};
use pn_tables::{CellRef, TabularDataSource, truncate_sheet_name};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

pub const NODE_SUMMARY_SHEET: &str = "Node Summary";
pub const PUMP_SHEET: &str = "Pump Operating Points";

const PARAMETER_COLUMN: &str = "Parameter";
const VALUE_COLUMN: &str = "Value";
const PUMP_COLUMN: &str = "Pump";
const SUCTION_COLUMN: &str = "Suction Pressure";
const DISCHARGE_COLUMN: &str = "Discharge Pressure";
const HEAD_COLUMN: &str = "Pump Head";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub node_parameters: Vec<String>,
    /// Only nodes of this boundary role are summarized.
    pub node_role: String,
    pub profile_parameters: Vec<String>,
    pub pumps: Vec<PumpLabels>,
    /// Profile column read for pump suction and discharge.
    pub pressure_parameter: String,
    pub regime: Option<RegimeRule>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            node_parameters: vec![params::PRESSURE.to_string()],
            node_role: "Sink".to_string(),
            profile_parameters: vec![
                "ErosionalVelocityRatio".to_string(),
                "MeanVelocityFluid".to_string(),
            ],
            pumps: Vec::new(),
            pressure_parameter: params::PRESSURE.to_string(),
            regime: Some(RegimeRule::default()),
        }
    }
}

/// What `summarize` wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub node_rows: usize,
    pub profile_sheets: Vec<String>,
    pub pump_rows: usize,
}

pub struct ResultsSummarizer<'a> {
    source: &'a dyn TabularDataSource,
    config: SummaryConfig,
}

impl<'a> ResultsSummarizer<'a> {
    pub fn new(source: &'a dyn TabularDataSource, config: SummaryConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Min/max rows of every node parameter across every case sheet.
    pub fn node_summary(&self, path: &Path) -> SummaryResult<Table> {
        self.require(path)?;
        let cases = self.case_sheets(path, &[NODE_SUMMARY_SHEET.to_string()])?;
        let rows = self.node_rows(&cases)?;
        Ok(self.extremes_table(params::NODE, rows, true))
    }

    /// One min/max table per profile parameter, keyed by branch equipment.
    pub fn profile_summary(&self, path: &Path) -> SummaryResult<Vec<(String, Table)>> {
        self.require(path)?;
        let cases = self.case_sheets(path, &self.profile_outputs())?;
        self.profile_tables(&cases)
    }

    pub fn pump_operating_points(&self, path: &Path) -> SummaryResult<Table> {
        self.require(path)?;
        let cases = self.case_sheets(path, &self.profile_outputs())?;
        Ok(self.pump_table(self.pump_points(&cases)?))
    }

    /// Compute every summary, then write them back into the two workbooks.
    ///
    /// Nothing is written unless every summary succeeds.
    pub fn summarize(&self, node_path: &Path, profile_path: &Path) -> SummaryResult<SummaryReport> {
        self.require(node_path)?;
        self.require(profile_path)?;

        tracing::info!(workbook = %node_path.display(), "summarizing node results");
        let node_cases = self.case_sheets(node_path, &[NODE_SUMMARY_SHEET.to_string()])?;
        let nodes = self.extremes_table(params::NODE, self.node_rows(&node_cases)?, true);

        tracing::info!(workbook = %profile_path.display(), "summarizing profile results");
        let profile_cases = self.case_sheets(profile_path, &self.profile_outputs())?;
        let profiles = self.profile_tables(&profile_cases)?;
        let pumps = if self.config.pumps.is_empty() {
            None
        } else {
            Some(self.pump_table(self.pump_points(&profile_cases)?))
        };

        self.write(&nodes, node_path, NODE_SUMMARY_SHEET)?;
        let mut profile_sheets = Vec::with_capacity(profiles.len());
        for (parameter, table) in &profiles {
            profile_sheets.push(self.write(table, profile_path, parameter)?);
        }
        let pump_rows = match &pumps {
            Some(table) => {
                self.write(table, profile_path, PUMP_SHEET)?;
                table.len()
            }
            None => 0,
        };

        Ok(SummaryReport {
            node_rows: nodes.len(),
            profile_sheets,
            pump_rows,
        })
    }

    fn require(&self, path: &Path) -> SummaryResult<()> {
        if self.source.exists(path) {
            Ok(())
        } else {
            tracing::error!(path = %path.display(), "results file not found");
            Err(SummaryError::MissingFile {
                path: path.to_path_buf(),
            })
        }
    }

    /// Sheets written by this summarizer, to be skipped on re-runs.
    fn profile_outputs(&self) -> Vec<String> {
        self.config
            .profile_parameters
            .iter()
            .map(|p| truncate_sheet_name(p).into_owned())
            .chain([PUMP_SHEET.to_string()])
            .collect()
    }

    fn case_sheets(&self, path: &Path, skip: &[String]) -> SummaryResult<Vec<(String, Table)>> {
        let mut cases = Vec::new();
        for sheet in self.source.sheet_names(path)? {
            if skip.contains(&sheet) {
                continue;
            }
            let table = self.source.read_sheet(path, &sheet)?;
            cases.push((sheet, table));
        }
        Ok(cases)
    }

    fn node_rows(&self, cases: &[(String, Table)]) -> SummaryResult<Vec<MinMaxRow>> {
        let role = self.config.node_role.as_str();
        let mut rows = Vec::new();
        for (case, table) in cases {
            let Some(col) = table.column_index(params::TYPE) else {
                return Err(SummaryError::MissingParameter {
                    case: case.clone(),
                    parameter: params::TYPE.to_string(),
                });
            };
            let mut nodes = table.clone();
            nodes.retain_rows(|row| {
                row[col]
                    .as_text()
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case(role))
            });
            for parameter in &self.config.node_parameters {
                rows.extend(min_max_rows(&nodes, case, parameter, params::NODE)?);
            }
        }
        Ok(rows)
    }

    /// A case without the parameter is skipped with a warning; a parameter
    /// no case reports is an error.
    fn profile_tables(&self, cases: &[(String, Table)]) -> SummaryResult<Vec<(String, Table)>> {
        let mut out = Vec::new();
        for parameter in &self.config.profile_parameters {
            let mut rows = Vec::new();
            for (case, table) in cases {
                match min_max_rows(table, case, parameter, params::BRANCH_EQUIPMENT) {
                    Ok(pair) => rows.extend(pair),
                    Err(SummaryError::MissingParameter { .. }) => {
                        tracing::warn!(case = %case, parameter = %parameter, "profile results lack the parameter, case skipped");
                    }
                    Err(e) => return Err(e),
                }
            }
            if rows.is_empty() {
                return Err(SummaryError::NoRows {
                    scope: "any case".to_string(),
                    parameter: parameter.clone(),
                });
            }
            out.push((parameter.clone(), self.extremes_table(params::BRANCH_EQUIPMENT, rows, false)));
        }
        Ok(out)
    }

    fn pump_points(&self, cases: &[(String, Table)]) -> SummaryResult<Vec<OperatingPoint>> {
        let mut points = Vec::new();
        for pump in &self.config.pumps {
            for (case, table) in cases {
                points.push(operating_point(table, case, pump, &self.config.pressure_parameter)?);
            }
        }
        Ok(points)
    }

    /// `long` tables carry a parameter column and sort by regime, parameter
    /// and value. Otherwise the parameter names the value column and rows
    /// sort by value alone.
    fn extremes_table(&self, label_column: &str, mut rows: Vec<MinMaxRow>, long: bool) -> Table {
        let regime = self.config.regime.as_ref();
        rows.sort_by(|a, b| {
            let by_regime = regime
                .filter(|_| long)
                .map(|r| r.label(&a.case).cmp(r.label(&b.case)))
                .unwrap_or(Ordering::Equal);
            by_regime
                .then_with(|| a.parameter.cmp(&b.parameter))
                .then_with(|| a.value.total_cmp(&b.value))
        });

        let mut columns = vec![label_column.to_string()];
        if long {
            columns.extend([PARAMETER_COLUMN.to_string(), VALUE_COLUMN.to_string()]);
        } else if let Some(first) = rows.first() {
            columns.push(first.parameter.clone());
        }
        columns.extend([MIN_MAX_COLUMN.to_string(), CASE_COLUMN.to_string()]);
        if regime.is_some() {
            columns.push(OPERATION_COLUMN.to_string());
        }

        let mut table = Table::new(columns);
        for row in rows {
            let mut values = vec![row.label];
            if long {
                values.push(Value::from(row.parameter));
            }
            values.extend([
                Value::from(row.value),
                Value::from(row.extreme.as_str()),
                Value::from(row.case.as_str()),
            ]);
            if let Some(r) = regime {
                values.push(Value::from(r.label(&row.case)));
            }
            table.push_row(values);
        }
        table
    }

    fn pump_table(&self, mut points: Vec<OperatingPoint>) -> Table {
        let regime = self.config.regime.as_ref();
        points.sort_by(|a, b| {
            let by_regime = regime
                .map(|r| r.label(&a.case).cmp(r.label(&b.case)))
                .unwrap_or(Ordering::Equal);
            a.pump.cmp(&b.pump).then(by_regime).then_with(|| a.case.cmp(&b.case))
        });

        let mut columns = vec![PUMP_COLUMN, CASE_COLUMN, SUCTION_COLUMN, DISCHARGE_COLUMN, HEAD_COLUMN];
        if regime.is_some() {
            columns.push(OPERATION_COLUMN);
        }
        let mut table = Table::new(columns);
        for point in points {
            let mut values = vec![
                Value::from(point.pump.as_str()),
                Value::from(point.case.as_str()),
                Value::from(point.suction_pressure),
                Value::from(point.discharge_pressure),
                Value::from(point.head()),
            ];
            if let Some(r) = regime {
                values.push(Value::from(r.label(&point.case)));
            }
            table.push_row(values);
        }
        table
    }

    fn write(&self, table: &Table, path: &Path, sheet: &str) -> SummaryResult<String> {
        let written = self.source.write_sheet(table, path, sheet, CellRef::A2, true)?;
        tracing::info!(workbook = %path.display(), sheet = %written, rows = table.len(), "summary written");
        Ok(written)
    }
}
