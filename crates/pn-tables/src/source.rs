use crate::cell::CellRef;
use crate::error::TableResult;
use pn_core::Table;
use std::path::Path;

/// Read/write access to named sheets of workbook documents.
///
/// Implementations must tolerate concurrent calls: result writers for
/// different cases share one store.
pub trait TabularDataSource: Send + Sync {
    /// Whether a workbook exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    fn sheet_names(&self, path: &Path) -> TableResult<Vec<String>>;

    /// Read one sheet. The first non-blank row is the header.
    fn read_sheet(&self, path: &Path, sheet: &str) -> TableResult<Table>;

    /// Write `table` into `sheet`, creating the workbook and sheet if needed.
    ///
    /// Sheet names longer than 31 characters are truncated. Returns the name
    /// actually written.
    fn write_sheet(
        &self,
        table: &Table,
        path: &Path,
        sheet: &str,
        anchor: CellRef,
        clear_before_write: bool,
    ) -> TableResult<String>;
}
