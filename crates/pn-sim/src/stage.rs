//! Per-case state machine.

use crate::error::SimError;
use pn_cases::CaseKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Steps of one case, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaseStage {
    Pending,
    Opened,
    BoundaryConditionsFetched,
    GlobalConditionsApplied,
    CaseParametersApplied,
    FlowMasksApplied,
    Validated,
    Run,
    ResultsReshaped,
    Written,
    SavedAs,
    Closed,
}

impl CaseStage {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStage::Pending => "pending",
            CaseStage::Opened => "opened",
            CaseStage::BoundaryConditionsFetched => "boundary_conditions_fetched",
            CaseStage::GlobalConditionsApplied => "global_conditions_applied",
            CaseStage::CaseParametersApplied => "case_parameters_applied",
            CaseStage::FlowMasksApplied => "flow_masks_applied",
            CaseStage::Validated => "validated",
            CaseStage::Run => "run",
            CaseStage::ResultsReshaped => "results_reshaped",
            CaseStage::Written => "written",
            CaseStage::SavedAs => "saved_as",
            CaseStage::Closed => "closed",
        }
    }
}

impl fmt::Display for CaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one case ended: the last stage reached, and the error if it failed.
#[derive(Debug)]
pub struct CaseOutcome {
    pub key: CaseKey,
    pub stage: CaseStage,
    /// Model variant written by the case.
    pub model: Option<PathBuf>,
    pub error: Option<SimError>,
}

impl CaseOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, Some(SimError::Cancelled { .. }))
    }

    pub fn record(&self) -> CaseRecord {
        let status = match &self.error {
            None => "ok",
            Some(SimError::Cancelled { .. }) => "cancelled",
            Some(_) => "error",
        };
        CaseRecord {
            case: self.key.label(),
            stage: self.stage,
            status: status.to_string(),
            error: self.error.as_ref().map(ToString::to_string),
            model: self.model.as_ref().map(|p| p.display().to_string()),
        }
    }
}

/// Serializable summary of a `CaseOutcome` for the run manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case: String,
    pub stage: CaseStage,
    pub status: String,
    pub error: Option<String>,
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        assert!(CaseStage::Opened < CaseStage::Validated);
        assert!(CaseStage::Written < CaseStage::SavedAs);
        assert_eq!(CaseStage::FlowMasksApplied.to_string(), "flow_masks_applied");
    }

    #[test]
    fn record_reports_status() {
        let outcome = CaseOutcome {
            key: CaseKey::new("A", "X"),
            stage: CaseStage::Pending,
            model: None,
            error: Some(SimError::Cancelled { case: "A_X".into() }),
        };
        assert!(outcome.is_cancelled());
        let record = outcome.record();
        assert_eq!(record.status, "cancelled");
        assert_eq!(record.case, "A_X");
    }
}
