//! Per-case minimum and maximum rows.

use crate::error::{SummaryError, SummaryResult};
use pn_core::{Table, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_MAX_COLUMN: &str = "Min/Max";
pub const CASE_COLUMN: &str = "Case";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extreme {
    Minimum,
    Maximum,
}

impl Extreme {
    pub fn as_str(self) -> &'static str {
        match self {
            Extreme::Minimum => "Minimum",
            Extreme::Maximum => "Maximum",
        }
    }
}

impl fmt::Display for Extreme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extreme row of one case.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxRow {
    /// Node or equipment the value belongs to.
    pub label: Value,
    pub parameter: String,
    pub value: f64,
    pub extreme: Extreme,
    pub case: String,
}

/// Minimum and maximum of `parameter` in one case table.
///
/// Values that do not parse as numbers are skipped. Ties resolve to the
/// first occurrence.
pub fn min_max_rows(
    table: &Table,
    case: &str,
    parameter: &str,
    label_column: &str,
) -> SummaryResult<[MinMaxRow; 2]> {
    for column in [parameter, label_column] {
        if !table.has_column(column) {
            return Err(SummaryError::MissingParameter {
                case: case.to_string(),
                parameter: column.to_string(),
            });
        }
    }

    let mut min: Option<(usize, f64)> = None;
    let mut max: Option<(usize, f64)> = None;
    for row in 0..table.len() {
        let Some(v) = table.cell(row, parameter).and_then(Value::as_f64) else {
            continue;
        };
        if min.is_none_or(|(_, m)| v < m) {
            min = Some((row, v));
        }
        if max.is_none_or(|(_, m)| v > m) {
            max = Some((row, v));
        }
    }
    let (Some(min), Some(max)) = (min, max) else {
        return Err(SummaryError::NoRows {
            scope: format!("case '{case}'"),
            parameter: parameter.to_string(),
        });
    };

    let row = |(index, value): (usize, f64), extreme| MinMaxRow {
        label: table.cell(index, label_column).cloned().unwrap_or_default(),
        parameter: parameter.to_string(),
        value,
        extreme,
        case: case.to_string(),
    };
    Ok([row(min, Extreme::Minimum), row(max, Extreme::Maximum)])
}
