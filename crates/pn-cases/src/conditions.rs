//! Condition and parameter tables.

use crate::profile::sanitize_label;
use pn_core::{Table, Value};
use pn_tables::{SheetRef, TableError, TableResult, TabularDataSource};
use std::path::Path;

/// First cell of the header row of a conditions sheet.
pub const CONDITIONS_KEY: &str = "Conditions";
pub const COMPONENT_NAME: &str = "Component Name";
pub const COMPONENT_TYPE: &str = "Component Type";
pub const PARAMETER: &str = "Parameter";
pub const VALUE: &str = "Value";
pub const UNIT: &str = "Unit";

/// Component type marking rows that target the engine's settings object.
pub const SIMULATION_SETTINGS_TYPE: &str = "SimulationSettings";

/// One component/parameter/value triple.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRow {
    pub component: Option<String>,
    pub component_type: Option<String>,
    pub parameter: Option<String>,
    pub value: Value,
}

impl ConditionRow {
    /// Rows addressed to the simulation settings rather than a component.
    pub fn is_setting(&self) -> bool {
        self.component_type.as_deref().is_some_and(|t| {
            let t = t.trim();
            t.eq_ignore_ascii_case(SIMULATION_SETTINGS_TYPE)
                || t.eq_ignore_ascii_case(SIMULATION_SETTINGS_TYPE.trim_end_matches('s'))
        })
    }
}

fn text(table: &Table, row: usize, column: &str) -> Option<String> {
    table.cell(row, column).and_then(Value::label)
}

fn require(table: &Table, origin: &SheetRef, columns: &[&str]) -> TableResult<()> {
    let missing: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|c| !table.has_column(c))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(origin.missing_columns(missing).logged())
    }
}

/// Override rows grouped by condition label.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionTable {
    pub origin: SheetRef,
    /// Distinct labels in first-appearance order.
    conditions: Vec<String>,
    rows: Vec<(String, ConditionRow)>,
}

impl ConditionTable {
    pub fn load(source: &dyn TabularDataSource, path: &Path, sheet: &str) -> TableResult<Self> {
        let origin = SheetRef::new(path, sheet);
        let table = source.read_sheet(path, sheet).map_err(TableError::logged)?;
        Self::from_table(&table, origin)
    }

    /// Parse a sheet whose header row starts with `Conditions`.
    ///
    /// Rows without a condition label are dropped.
    pub fn from_table(table: &Table, origin: SheetRef) -> TableResult<Self> {
        let table = table
            .rebase_on_key(CONDITIONS_KEY)
            .ok_or_else(|| origin.missing_columns([CONDITIONS_KEY]).logged())?;
        require(&table, &origin, &[COMPONENT_NAME, COMPONENT_TYPE, PARAMETER, VALUE])?;

        let mut conditions = Vec::new();
        let mut rows = Vec::new();
        for row in 0..table.len() {
            let Some(label) = text(&table, row, CONDITIONS_KEY) else {
                continue;
            };
            let label = sanitize_label(&label, &origin);
            if !conditions.contains(&label) {
                conditions.push(label.clone());
            }
            rows.push((
                label,
                ConditionRow {
                    component: text(&table, row, COMPONENT_NAME),
                    component_type: text(&table, row, COMPONENT_TYPE),
                    parameter: text(&table, row, PARAMETER),
                    value: table.cell(row, VALUE).cloned().unwrap_or_default(),
                },
            ));
        }

        tracing::info!(sheet = %origin, conditions = conditions.len(), rows = rows.len(), "conditions loaded");
        Ok(Self {
            origin,
            conditions,
            rows,
        })
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn has_condition(&self, condition: &str) -> bool {
        self.conditions.iter().any(|c| c == condition)
    }

    pub fn rows_for<'a>(&'a self, condition: &'a str) -> impl Iterator<Item = &'a ConditionRow> + 'a {
        self.rows
            .iter()
            .filter(move |(label, _)| label == condition)
            .map(|(_, row)| row)
    }
}

/// Single-axis layout: identity columns plus one value column per case.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    pub origin: SheetRef,
    cases: Vec<String>,
    table: Table,
}

impl ParameterTable {
    const IDENTITY: [&str; 4] = [COMPONENT_NAME, COMPONENT_TYPE, PARAMETER, UNIT];

    pub fn load(source: &dyn TabularDataSource, path: &Path, sheet: &str) -> TableResult<Self> {
        let origin = SheetRef::new(path, sheet);
        let table = source.read_sheet(path, sheet).map_err(TableError::logged)?;
        Self::from_table(table, origin)
    }

    /// Every column except the identity columns is a case.
    pub fn from_table(mut table: Table, origin: SheetRef) -> TableResult<Self> {
        if table.width() == 0 {
            return Err(origin.empty().logged());
        }
        require(&table, &origin, &[COMPONENT_NAME, COMPONENT_TYPE, PARAMETER])?;

        let mut renamed = Vec::new();
        table.map_columns(|c| {
            if Self::IDENTITY.contains(&c) {
                c.to_string()
            } else {
                let clean = sanitize_label(c, &origin);
                renamed.push(clean.clone());
                clean
            }
        });
        let mut cases: Vec<String> = Vec::new();
        for case in renamed {
            if cases.contains(&case) {
                return Err(origin.duplicate("case", &case).logged());
            }
            cases.push(case);
        }

        tracing::info!(sheet = %origin, cases = cases.len(), rows = table.len(), "parameter table loaded");
        Ok(Self {
            origin,
            cases,
            table,
        })
    }

    pub fn cases(&self) -> &[String] {
        &self.cases
    }

    pub fn has_case(&self, case: &str) -> bool {
        self.cases.iter().any(|c| c == case)
    }

    /// Rows with the value taken from the `case` column.
    pub fn rows_for(&self, case: &str) -> Vec<ConditionRow> {
        if !self.has_case(case) {
            return Vec::new();
        }
        (0..self.table.len())
            .map(|row| ConditionRow {
                component: text(&self.table, row, COMPONENT_NAME),
                component_type: text(&self.table, row, COMPONENT_TYPE),
                parameter: text(&self.table, row, PARAMETER),
                value: self.table.cell(row, case).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> SheetRef {
        SheetRef::new("inputs.json", "Conditions")
    }

    fn conditions() -> Table {
        Table::from_rows(
            ["Conditions", "Component Name", "Component Type", "Parameter", "Value"],
            vec![
                vec!["Low_P".into(), "Src".into(), "Source".into(), "Pressure".into(), 20.0.into()],
                vec![Value::Empty, "Src".into(), "Source".into(), "Temperature".into(), 60.0.into()],
                vec!["High".into(), "Src".into(), "Source".into(), "Pressure".into(), 40.0.into()],
                vec!["Low_P".into(), Value::Empty, "SimulationSetting".into(), "Ambient Temperature".into(), 15.0.into()],
            ],
        )
    }

    #[test]
    fn labels_are_sanitized_and_unlabelled_rows_dropped() {
        let t = ConditionTable::from_table(&conditions(), origin()).unwrap();
        assert_eq!(t.conditions(), ["Low-P", "High"]);
        let rows: Vec<_> = t.rows_for("Low-P").collect();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].is_setting());
        assert!(rows[1].is_setting());
        assert_eq!(t.rows_for("Low_P").count(), 0);
    }

    #[test]
    fn mandatory_columns_are_checked() {
        let table = Table::from_rows(["Conditions", "Component Name", "Value"], vec![]);
        match ConditionTable::from_table(&table, origin()).unwrap_err() {
            TableError::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec!["Component Type", "Parameter"]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn parameter_table_cases_exclude_identity_columns() {
        let table = Table::from_rows(
            ["Component Name", "Component Type", "Parameter", "Unit", "Case_1", "Case 2"],
            vec![vec![
                "P1".into(),
                "Pump".into(),
                "Speed".into(),
                "rpm".into(),
                3000.0.into(),
                Value::Empty,
            ]],
        );
        let t = ParameterTable::from_table(table, SheetRef::new("inputs.json", "Parameters")).unwrap();
        assert_eq!(t.cases(), ["Case-1", "Case 2"]);
        assert_eq!(t.rows_for("Case-1")[0].value, Value::from(3000.0));
        assert!(t.rows_for("Case 2")[0].value.is_empty());
        assert!(t.rows_for("Case 3").is_empty());
    }
}
