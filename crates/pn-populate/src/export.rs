//! Export and bulk import.
//!
//! The export layout is the bulk-import layout: one sheet per component
//! kind, `Name` first, then parameters in sorted order.

use crate::error::PopulateResult;
use crate::import::ParameterPopulator;
use pn_core::{ComponentKind, Table, Value, params};
use pn_engine::{ComponentValues, EngineError, EngineSession, ParameterMap};
use pn_tables::{CellRef, TableError};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkImportReport {
    pub imported: Vec<ComponentKind>,
    pub failed: Vec<ComponentKind>,
}

impl ParameterPopulator<'_> {
    /// One table per kind with the model's current values.
    ///
    /// Kinds the model has no context for are skipped.
    pub fn export_values(
        &self,
        session: &dyn EngineSession,
        kinds: &[ComponentKind],
    ) -> PopulateResult<Vec<(ComponentKind, Table)>> {
        let mut out = Vec::new();
        for &kind in kinds {
            let values = match session.get_values(Some(kind), None) {
                Ok(values) => values,
                Err(EngineError::UnsupportedContext { .. }) => {
                    tracing::debug!(kind = %kind, "kind not in model, not exported");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            out.push((kind, values_to_table(&values)));
        }
        Ok(out)
    }

    /// Export into `path`, one sheet per kind. Returns the sheets written.
    pub fn export_to_workbook(
        &self,
        session: &dyn EngineSession,
        kinds: &[ComponentKind],
        path: &Path,
    ) -> PopulateResult<Vec<String>> {
        let mut written = Vec::new();
        for (kind, table) in self.export_values(session, kinds)? {
            let sheet = self
                .source
                .write_sheet(&table, path, kind.as_str(), CellRef::A1, true)?;
            written.push(sheet);
        }
        tracing::info!(workbook = %path.display(), sheets = written.len(), "model values exported");
        Ok(written)
    }

    /// Push every kind-named sheet of an export workbook back onto the model.
    ///
    /// Empty cells are left alone. A sheet the engine rejects is logged and
    /// the rest continue.
    pub fn bulk_import_values(
        &self,
        session: &mut dyn EngineSession,
        path: &Path,
    ) -> PopulateResult<BulkImportReport> {
        let mut report = BulkImportReport::default();
        for sheet in self.source.sheet_names(path).map_err(TableError::logged)? {
            let Ok(kind) = ComponentKind::from_str(&sheet) else {
                tracing::debug!(sheet = %sheet, "not a component sheet, ignored");
                continue;
            };
            let table = self.source.read_sheet(path, &sheet).map_err(TableError::logged)?;
            let update = table_to_values(&table);
            if update.is_empty() {
                continue;
            }
            match session.set_values(&update) {
                Ok(()) => {
                    tracing::info!(kind = %kind, components = update.len(), "values set");
                    report.imported.push(kind);
                }
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "error setting values");
                    report.failed.push(kind);
                }
            }
        }
        Ok(report)
    }
}

fn values_to_table(values: &ParameterMap) -> Table {
    let parameters: BTreeSet<&str> = values
        .values()
        .flat_map(|v| v.keys().map(String::as_str))
        .collect();
    let mut table = Table::new(std::iter::once(params::NAME).chain(parameters.iter().copied()));
    for (name, component) in values {
        let mut row = vec![Value::from(name.as_str())];
        row.extend(
            parameters
                .iter()
                .map(|p| component.get(*p).cloned().unwrap_or_default()),
        );
        table.push_row(row);
    }
    table
}

fn table_to_values(table: &Table) -> ParameterMap {
    let mut out = ParameterMap::new();
    for row in 0..table.len() {
        let mut name = None;
        let mut values = ComponentValues::new();
        for (column, value) in table.row_entries(row) {
            if column == params::NAME {
                name = value.label();
            } else if !value.is_empty() {
                values.insert(column.to_string(), value.clone());
            }
        }
        if let Some(name) = name
            && !values.is_empty()
        {
            out.insert(name, values);
        }
    }
    out
}
