use pn_tables::TableError;
use std::path::PathBuf;
use thiserror::Error;

pub type SummaryResult<T> = Result<T, SummaryError>;

/// Any of these aborts the whole summary: extremes are compared across
/// cases, so one bad case invalidates the rest.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Results file not found: {}", .path.display())]
    MissingFile { path: PathBuf },

    #[error("Case '{case}' has no '{parameter}' column")]
    MissingParameter { case: String, parameter: String },

    #[error("Equipment '{label}' not found in the profile results of case '{case}'")]
    MissingLabel { case: String, label: String },

    #[error("No numeric '{parameter}' values in {scope}")]
    NoRows { scope: String, parameter: String },

    #[error(transparent)]
    Table(#[from] TableError),
}
