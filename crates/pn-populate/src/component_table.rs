//! Validated component sheet.

use pn_core::{ComponentKind, Table, Value, params};
use pn_tables::{SheetRef, TableError, TableResult, TabularDataSource};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

/// A component sheet with unique `Name`s and known `Component` kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTable {
    pub origin: SheetRef,
    table: Table,
}

impl ComponentTable {
    /// Read and validate a component sheet.
    ///
    /// `Name` and `Component` are mandatory and `Name` must be unique. Rows
    /// whose kind is unknown are dropped with a warning.
    pub fn load(source: &dyn TabularDataSource, path: &Path, sheet: &str) -> TableResult<Self> {
        let origin = SheetRef::new(path, sheet);
        let table = source.read_sheet(path, sheet).map_err(TableError::logged)?;
        Self::from_table(table, origin)
    }

    pub fn from_table(mut table: Table, origin: SheetRef) -> TableResult<Self> {
        if table.width() == 0 {
            return Err(origin.empty().logged());
        }
        let missing: Vec<&str> = [params::NAME, params::COMPONENT]
            .into_iter()
            .filter(|c| !table.has_column(c))
            .collect();
        if !missing.is_empty() {
            return Err(origin.missing_columns(missing).logged());
        }

        let mut seen = BTreeSet::new();
        for name in table.column(params::NAME).unwrap_or_default() {
            if let Some(label) = name.label()
                && !seen.insert(label.clone())
            {
                return Err(origin.duplicate(params::NAME, &label).logged());
            }
        }

        let mut unknown = BTreeSet::new();
        let name_idx = table.column_index(params::NAME);
        let kind_idx = table.column_index(params::COMPONENT);
        table.retain_rows(|row| {
            let name = name_idx.and_then(|i| row[i].label());
            let kind = kind_idx.and_then(|i| row[i].label());
            match (name, kind) {
                (Some(_), Some(kind)) => {
                    let known = ComponentKind::from_str(&kind).is_ok();
                    if !known {
                        unknown.insert(kind);
                    }
                    known
                }
                _ => false,
            }
        });
        if !unknown.is_empty() {
            tracing::warn!(sheet = %origin, kinds = ?unknown, "unknown component types removed");
        }

        tracing::info!(sheet = %origin, rows = table.len(), "component data loaded");
        Ok(Self { origin, table })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Distinct kinds in first-appearance order.
    pub fn kinds(&self) -> Vec<ComponentKind> {
        let mut out = Vec::new();
        for row in 0..self.table.len() {
            if let Some(kind) = self.kind_at(row)
                && !out.contains(&kind)
            {
                out.push(kind);
            }
        }
        out
    }

    fn kind_at(&self, row: usize) -> Option<ComponentKind> {
        let label = self.table.cell(row, params::COMPONENT)?.label()?;
        ComponentKind::from_str(&label).ok()
    }

    /// `(name, row index)` of every component of `kind`.
    pub fn rows_of_kind(&self, kind: ComponentKind) -> Vec<(String, usize)> {
        (0..self.table.len())
            .filter(|row| self.kind_at(*row) == Some(kind))
            .filter_map(|row| {
                let name = self.table.cell(row, params::NAME)?.label()?;
                Some((name, row))
            })
            .collect()
    }

    /// Parameter columns: everything except the identity columns.
    pub fn parameter_columns(&self) -> Vec<&str> {
        self.table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| *c != params::NAME && *c != params::COMPONENT)
            .collect()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.table.cell(row, column).filter(|v| !v.is_empty())
    }
}
