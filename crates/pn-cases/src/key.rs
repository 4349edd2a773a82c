//! Case identity and model-file naming.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One point of the case matrix.
///
/// Labels never contain `_`; loading replaces it, which keeps
/// `<case>_<condition>_<file>` names reversible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseKey {
    pub case: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl CaseKey {
    pub fn new(case: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            case: case.into(),
            condition: Some(condition.into()),
        }
    }

    pub fn single(case: impl Into<String>) -> Self {
        Self {
            case: case.into(),
            condition: None,
        }
    }

    /// Label used for result sheets and logs.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// File name of this case's model variant derived from the template's file name.
    pub fn model_file_name(&self, original: &str) -> String {
        format!("{self}_{original}")
    }

    /// Recover the key from a variant file name. `None` for the template
    /// itself and for names not derived from `original`.
    pub fn from_model_file_name(file_name: &str, original: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(original)?.strip_suffix('_')?;
        let mut parts = stem.split('_');
        let case = parts.next().filter(|c| !c.is_empty())?;
        let condition = parts.next();
        if parts.next().is_some() || condition.is_some_and(str::is_empty) {
            return None;
        }
        Some(Self {
            case: case.to_string(),
            condition: condition.map(str::to_string),
        })
    }
}

impl fmt::Display for CaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            Some(condition) => write!(f, "{}_{}", self.case, condition),
            None => f.write_str(&self.case),
        }
    }
}
