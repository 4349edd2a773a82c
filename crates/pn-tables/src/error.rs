//! Input-table errors.
//!
//! Every variant that concerns a sheet carries the workbook path and sheet
//! name so the operator can find the offending cell block.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type TableResult<T> = Result<T, TableError>;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Workbook not found: {}", .path.display())]
    WorkbookNotFound { path: PathBuf },

    #[error("Sheet not found (workbook: {}, sheet: {sheet})", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("Sheet is empty (workbook: {}, sheet: {sheet})", .path.display())]
    EmptySheet { path: PathBuf, sheet: String },

    #[error("Missing required columns {columns:?} (workbook: {}, sheet: {sheet})", .path.display())]
    MissingColumns {
        path: PathBuf,
        sheet: String,
        columns: Vec<String>,
    },

    #[error("Column '{column}' must hold unique values, '{value}' repeats (workbook: {}, sheet: {sheet})", .path.display())]
    DuplicateValue {
        path: PathBuf,
        sheet: String,
        column: String,
        value: String,
    },

    #[error("Unknown component type '{value}' in column '{column}' (workbook: {}, sheet: {sheet})", .path.display())]
    UnknownComponentType {
        path: PathBuf,
        sheet: String,
        column: String,
        value: String,
    },

    #[error("Malformed table: {reason} (workbook: {}, sheet: {sheet})", .path.display())]
    Malformed {
        path: PathBuf,
        sheet: String,
        reason: String,
    },

    #[error("Invalid cell reference: {reference}")]
    InvalidCellRef { reference: String },

    #[error("Failed to access workbook {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Workbook {} is not valid JSON", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TableError {
    /// Log the error once, right before it leaves the component that raised it.
    pub fn logged(self) -> Self {
        tracing::error!(error = %self, "input table rejected");
        self
    }
}

/// Identity of one sheet in one workbook, used to stamp errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetRef {
    pub path: PathBuf,
    pub sheet: String,
}

impl SheetRef {
    pub fn new(path: impl AsRef<Path>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sheet: sheet.into(),
        }
    }

    pub fn missing_columns<I, S>(&self, columns: I) -> TableError
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TableError::MissingColumns {
            path: self.path.clone(),
            sheet: self.sheet.clone(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn duplicate(&self, column: &str, value: &str) -> TableError {
        TableError::DuplicateValue {
            path: self.path.clone(),
            sheet: self.sheet.clone(),
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn unknown_kind(&self, column: &str, value: &str) -> TableError {
        TableError::UnknownComponentType {
            path: self.path.clone(),
            sheet: self.sheet.clone(),
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn malformed(&self, reason: impl Into<String>) -> TableError {
        TableError::Malformed {
            path: self.path.clone(),
            sheet: self.sheet.clone(),
            reason: reason.into(),
        }
    }

    pub fn empty(&self) -> TableError {
        TableError::EmptySheet {
            path: self.path.clone(),
            sheet: self.sheet.clone(),
        }
    }

    pub fn not_found(&self) -> TableError {
        TableError::SheetNotFound {
            path: self.path.clone(),
            sheet: self.sheet.clone(),
        }
    }
}

impl std::fmt::Display for SheetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.path.display(), self.sheet)
    }
}
