//! pn-summary: cross-case extremes and pump operating points.
//!
//! Reads the per-case sheets the orchestrator wrote, then writes back:
//! - `Node Summary` into the node results workbook
//! - one sheet per profile parameter into the profile results workbook
//! - `Pump Operating Points` into the profile results workbook

pub mod error;
pub mod extremes;
pub mod pumps;
pub mod regime;
pub mod summarizer;

pub use error::{SummaryError, SummaryResult};
pub use extremes::{Extreme, MinMaxRow, min_max_rows};
pub use pumps::{OperatingPoint, PumpLabels, operating_point};
pub use regime::RegimeRule;
pub use summarizer::{
    NODE_SUMMARY_SHEET, PUMP_SHEET, ResultsSummarizer, SummaryConfig, SummaryReport,
};
