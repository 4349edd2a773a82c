//! pn-populate: move parameter values between workbooks and models.
//!
//! Four modes:
//! - simple import: one component sheet pushed onto the live model
//! - geometry import: flowline distance/elevation profiles
//! - export: one sheet per component kind with the model's current values
//! - bulk import: an export workbook pushed back; export then import is a no-op

pub mod component_table;
pub mod error;
pub mod export;
pub mod geometry;
pub mod import;
pub mod mode;

pub use component_table::ComponentTable;
pub use error::{PopulateError, PopulateResult};
pub use export::BulkImportReport;
pub use geometry::GeometryReport;
pub use import::{ImportReport, ParameterPopulator};
pub use mode::ImportMode;
