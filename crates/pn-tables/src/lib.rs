//! pn-tables: workbook access for pipenet.
//!
//! The pipeline reads its inputs from, and writes its results to, named sheets
//! of workbook documents. This crate defines that contract
//! (`TabularDataSource`) and two stores implementing it:
//! - `JsonWorkbookStore`: one JSON document per workbook on disk
//! - `MemoryWorkbookStore`: process-local workbooks, used by tests and previews

pub mod cell;
pub mod error;
pub mod source;
pub mod store;
pub mod workbook;

pub use cell::{CellRef, MAX_SHEET_NAME, truncate_sheet_name};
pub use error::{SheetRef, TableError, TableResult};
pub use source::TabularDataSource;
pub use store::{JsonWorkbookStore, MemoryWorkbookStore};
pub use workbook::{Sheet, Workbook};
