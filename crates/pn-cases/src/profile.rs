//! Sink flow profiles.

use pn_core::{Table, Value};
use pn_tables::{SheetRef, TableError, TableResult, TabularDataSource};
use std::collections::BTreeSet;
use std::path::Path;

/// First cell of the header row of a profile sheet.
pub const SINKS_KEY: &str = "Sinks";

/// Joins case and condition in model file names, so labels may not contain it.
const SEPARATOR: char = '_';
const SUBSTITUTE: char = '-';

/// Characters a label may not carry into a model file or sheet name.
const RESERVED: [char; 3] = [SEPARATOR, '/', '\\'];

/// Replace the file-name separator and path separators in a case or
/// condition label.
pub fn sanitize_label(label: &str, origin: &SheetRef) -> String {
    if !label.contains(RESERVED) {
        return label.to_string();
    }
    let clean = label.replace(RESERVED, &SUBSTITUTE.to_string());
    tracing::warn!(sheet = %origin, label = %label, renamed = %clean, "'_', '/' and '\\' are reserved in case labels, replaced with '-'");
    clean
}

/// Flow per sink (rows) and case (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct SinkProfile {
    pub origin: SheetRef,
    sinks: Vec<String>,
    cases: Vec<String>,
    /// `flows[sink][case]`
    flows: Vec<Vec<f64>>,
}

impl SinkProfile {
    pub fn load(source: &dyn TabularDataSource, path: &Path, sheet: &str) -> TableResult<Self> {
        let origin = SheetRef::new(path, sheet);
        let table = source.read_sheet(path, sheet).map_err(TableError::logged)?;
        Self::from_table(&table, origin)
    }

    /// Parse a profile sheet whose header row starts with `Sinks`.
    ///
    /// Rows without a sink name are dropped. Empty flow cells read as zero.
    pub fn from_table(table: &Table, origin: SheetRef) -> TableResult<Self> {
        let table = table
            .rebase_on_key(SINKS_KEY)
            .ok_or_else(|| origin.missing_columns([SINKS_KEY]).logged())?;

        let mut cases = Vec::new();
        for column in &table.columns()[1..] {
            let case = sanitize_label(column, &origin);
            if cases.contains(&case) {
                return Err(origin.duplicate(SINKS_KEY, &case).logged());
            }
            cases.push(case);
        }

        let mut sinks = Vec::new();
        let mut flows = Vec::new();
        let mut seen = BTreeSet::new();
        for row in table.rows() {
            let Some(sink) = row[0].label() else {
                continue;
            };
            if !seen.insert(sink.clone()) {
                return Err(origin.duplicate(SINKS_KEY, &sink).logged());
            }
            let values = row[1..]
                .iter()
                .zip(&cases)
                .map(|(cell, case)| flow_value(cell, &sink, case, &origin))
                .collect();
            sinks.push(sink);
            flows.push(values);
        }

        tracing::info!(sheet = %origin, sinks = sinks.len(), cases = cases.len(), "sink profile loaded");
        Ok(Self {
            origin,
            sinks,
            cases,
            flows,
        })
    }

    pub fn sinks(&self) -> &[String] {
        &self.sinks
    }

    pub fn cases(&self) -> &[String] {
        &self.cases
    }

    pub fn has_case(&self, case: &str) -> bool {
        self.cases.iter().any(|c| c == case)
    }

    pub fn flow(&self, sink: &str, case: &str) -> Option<f64> {
        let s = self.sinks.iter().position(|n| n == sink)?;
        let c = self.cases.iter().position(|n| n == case)?;
        Some(self.flows[s][c])
    }

    /// `(sink, flow)` for every sink in one case column.
    pub fn column(&self, case: &str) -> Option<Vec<(&str, f64)>> {
        let c = self.cases.iter().position(|n| n == case)?;
        Some(
            self.sinks
                .iter()
                .zip(&self.flows)
                .map(|(sink, row)| (sink.as_str(), row[c]))
                .collect(),
        )
    }
}

fn flow_value(cell: &Value, sink: &str, case: &str, origin: &SheetRef) -> f64 {
    if cell.is_empty() {
        return 0.0;
    }
    cell.as_f64().unwrap_or_else(|| {
        tracing::warn!(sheet = %origin, sink = %sink, case = %case, value = %cell, "non-numeric flow read as zero");
        0.0
    })
}
