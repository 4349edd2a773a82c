//! Pump operating points from profile results.

use crate::error::{SummaryError, SummaryResult};
use pn_core::{Table, Value, params};
use serde::{Deserialize, Serialize};

/// Equipment labels bracketing one pump in the profile results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpLabels {
    pub name: String,
    /// Upstream equipment, usually the strainer in front of the pump.
    pub suction: String,
    pub discharge: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatingPoint {
    pub pump: String,
    pub case: String,
    pub suction_pressure: f64,
    pub discharge_pressure: f64,
}

impl OperatingPoint {
    pub fn head(&self) -> f64 {
        self.discharge_pressure - self.suction_pressure
    }
}

/// Suction and discharge pressure of `pump` in one case's profile table.
///
/// Either label missing from the table means the case and the model do not
/// match, so it is an error rather than a skipped row.
pub fn operating_point(
    table: &Table,
    case: &str,
    pump: &PumpLabels,
    pressure: &str,
) -> SummaryResult<OperatingPoint> {
    if !table.has_column(pressure) {
        return Err(SummaryError::MissingParameter {
            case: case.to_string(),
            parameter: pressure.to_string(),
        });
    }
    let lookup = |label: &str| -> SummaryResult<f64> {
        (0..table.len())
            .find(|&row| {
                table
                    .cell(row, params::BRANCH_EQUIPMENT)
                    .and_then(Value::as_text)
                    .is_some_and(|e| e.trim() == label)
            })
            .and_then(|row| table.cell(row, pressure).and_then(Value::as_f64))
            .ok_or_else(|| SummaryError::MissingLabel {
                case: case.to_string(),
                label: label.to_string(),
            })
    };
    Ok(OperatingPoint {
        pump: pump.name.clone(),
        case: case.to_string(),
        suction_pressure: lookup(&pump.suction)?,
        discharge_pressure: lookup(&pump.discharge)?,
    })
}
