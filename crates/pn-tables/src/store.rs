//! Workbook stores.

use crate::cell::CellRef;
use crate::error::{SheetRef, TableError, TableResult};
use crate::source::TabularDataSource;
use crate::workbook::Workbook;
use pn_core::Table;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Workbooks persisted as pretty-printed JSON documents.
///
/// Writes are read-modify-write on the whole file and serialized behind one
/// lock, so concurrent case workers appending sheets do not clobber each other.
#[derive(Debug, Default)]
pub struct JsonWorkbookStore {
    write_lock: Mutex<()>,
}

impl JsonWorkbookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, path: &Path) -> TableResult<Workbook> {
        if !path.exists() {
            return Err(TableError::WorkbookNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| TableError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, workbook: &Workbook, path: &Path) -> TableResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| TableError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(workbook).map_err(|source| TableError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl TabularDataSource for JsonWorkbookStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn sheet_names(&self, path: &Path) -> TableResult<Vec<String>> {
        Ok(self.load(path)?.sheet_names())
    }

    fn read_sheet(&self, path: &Path, sheet: &str) -> TableResult<Table> {
        let workbook = self.load(path)?;
        workbook
            .read_table(sheet)
            .ok_or_else(|| SheetRef::new(path, sheet).not_found())
    }

    fn write_sheet(
        &self,
        table: &Table,
        path: &Path,
        sheet: &str,
        anchor: CellRef,
        clear_before_write: bool,
    ) -> TableResult<String> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut workbook = match self.load(path) {
            Ok(wb) => wb,
            Err(TableError::WorkbookNotFound { .. }) => Workbook::new(),
            Err(e) => return Err(e),
        };
        let written = workbook.write_table(table, sheet, anchor, clear_before_write);
        self.save(&workbook, path)?;
        tracing::debug!(
            workbook = %path.display(),
            sheet = %written,
            rows = table.len(),
            "sheet written"
        );
        Ok(written)
    }
}

/// Process-local workbooks keyed by path.
#[derive(Debug, Default)]
pub struct MemoryWorkbookStore {
    books: Mutex<HashMap<PathBuf, Workbook>>,
}

impl MemoryWorkbookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_workbook(&self, path: impl Into<PathBuf>, workbook: Workbook) {
        self.books
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), workbook);
    }

    /// Convenience for tests and fixtures: put one table on one sheet.
    pub fn insert_table(&self, path: impl Into<PathBuf>, sheet: &str, table: &Table) {
        let mut books = self.books.lock().unwrap_or_else(PoisonError::into_inner);
        books
            .entry(path.into())
            .or_default()
            .write_table(table, sheet, CellRef::A1, true);
    }

    pub fn workbook(&self, path: &Path) -> Option<Workbook> {
        self.books
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }
}

impl TabularDataSource for MemoryWorkbookStore {
    fn exists(&self, path: &Path) -> bool {
        self.books
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    fn sheet_names(&self, path: &Path) -> TableResult<Vec<String>> {
        self.workbook(path)
            .map(|wb| wb.sheet_names())
            .ok_or_else(|| TableError::WorkbookNotFound {
                path: path.to_path_buf(),
            })
    }

    fn read_sheet(&self, path: &Path, sheet: &str) -> TableResult<Table> {
        let books = self.books.lock().unwrap_or_else(PoisonError::into_inner);
        let workbook = books.get(path).ok_or_else(|| TableError::WorkbookNotFound {
            path: path.to_path_buf(),
        })?;
        workbook
            .read_table(sheet)
            .ok_or_else(|| SheetRef::new(path, sheet).not_found())
    }

    fn write_sheet(
        &self,
        table: &Table,
        path: &Path,
        sheet: &str,
        anchor: CellRef,
        clear_before_write: bool,
    ) -> TableResult<String> {
        let mut books = self.books.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(books
            .entry(path.to_path_buf())
            .or_default()
            .write_table(table, sheet, anchor, clear_before_write))
    }
}
