//! Simple import: push a component sheet onto the live model.

use crate::component_table::ComponentTable;
use pn_core::{ComponentKind, Registry};
use pn_engine::{ComponentValues, EngineSession, ParameterMap};
use pn_tables::TabularDataSource;
use std::collections::BTreeSet;

/// Moves parameter values between a workbook source and an engine session.
#[derive(Clone, Copy)]
pub struct ParameterPopulator<'a> {
    pub(crate) source: &'a dyn TabularDataSource,
}

/// What a simple import changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub components_updated: usize,
    pub values_set: usize,
    /// Names in the sheet that the model does not have.
    pub unknown_names: Vec<String>,
    /// Kinds whose values the engine refused.
    pub failed_kinds: Vec<ComponentKind>,
}

impl<'a> ParameterPopulator<'a> {
    pub fn new(source: &'a dyn TabularDataSource) -> Self {
        Self { source }
    }

    /// Push `table` onto the model, one kind at a time.
    ///
    /// Per kind, only columns that the model reports for that kind and the
    /// registry allows are pushed. Unknown names are logged and skipped; a
    /// kind the engine rejects is logged and the import moves on.
    pub fn simple_import(
        &self,
        session: &mut dyn EngineSession,
        table: &ComponentTable,
    ) -> ImportReport {
        let registry = Registry::standard();
        let mut report = ImportReport::default();

        for kind in table.kinds() {
            let live = match session.get_values(Some(kind), None) {
                Ok(live) => live,
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "cannot read model values");
                    report.failed_kinds.push(kind);
                    continue;
                }
            };

            let rows = table.rows_of_kind(kind);
            let sheet_names: BTreeSet<&str> = rows.iter().map(|(n, _)| n.as_str()).collect();
            let extra: Vec<&str> = sheet_names
                .iter()
                .copied()
                .filter(|n| !live.contains_key(*n))
                .collect();
            if !extra.is_empty() {
                tracing::error!(kind = %kind, names = ?extra, sheet = %table.origin, "names not in the model, skipped");
                report.unknown_names.extend(extra.iter().map(|n| n.to_string()));
            }
            let untouched: Vec<&str> = live
                .keys()
                .map(String::as_str)
                .filter(|n| !sheet_names.contains(n))
                .collect();
            if !untouched.is_empty() {
                tracing::warn!(kind = %kind, names = ?untouched, "model components missing from the sheet");
            }

            let available: BTreeSet<&str> = live
                .values()
                .flat_map(|values| values.keys().map(String::as_str))
                .filter(|p| registry.is_settable(kind, p))
                .collect();
            let columns: Vec<&str> = table
                .parameter_columns()
                .into_iter()
                .filter(|c| available.contains(c))
                .collect();
            if columns.is_empty() {
                tracing::warn!(kind = %kind, "no matching parameters, skipped");
                continue;
            }

            let mut update = ParameterMap::new();
            for (name, row) in rows.iter().filter(|(n, _)| live.contains_key(n)) {
                let values: ComponentValues = columns
                    .iter()
                    .filter_map(|c| table.value(*row, c).map(|v| (c.to_string(), v.clone())))
                    .collect();
                if !values.is_empty() {
                    update.insert(name.clone(), values);
                }
            }
            if update.is_empty() {
                tracing::warn!(kind = %kind, "no values to set, skipped");
                continue;
            }

            match session.set_values(&update) {
                Ok(()) => {
                    report.components_updated += update.len();
                    report.values_set += update.values().map(|v| v.len()).sum::<usize>();
                    tracing::info!(kind = %kind, components = update.len(), "parameters set");
                }
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "engine rejected parameters");
                    report.failed_kinds.push(kind);
                }
            }
        }
        report
    }
}
