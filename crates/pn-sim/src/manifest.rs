//! Run manifest written after every case matrix.

use crate::error::{SimError, SimResult};
use crate::stage::CaseRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixReport {
    pub created_at: DateTime<Utc>,
    pub base_model: String,
    pub workers: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub cases: Vec<CaseRecord>,
}

impl MatrixReport {
    pub fn from_records(base_model: &Path, workers: usize, cases: Vec<CaseRecord>) -> Self {
        let count = |status: &str| cases.iter().filter(|c| c.status == status).count();
        Self {
            created_at: Utc::now(),
            base_model: base_model.display().to_string(),
            workers,
            total: cases.len(),
            succeeded: count("ok"),
            failed: count("error"),
            cancelled: count("cancelled"),
            cases,
        }
    }

    pub fn write(&self, path: &Path) -> SimResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| SimError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SimError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> SimResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SimError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::CaseStage;

    #[test]
    fn manifest_writes_and_reads_back() {
        let record = CaseRecord {
            case: "A_X".into(),
            stage: CaseStage::Closed,
            status: "ok".into(),
            error: None,
            model: Some("models/A_X_base.pnm".into()),
        };
        let failed = CaseRecord {
            case: "B_X".into(),
            stage: CaseStage::Validated,
            status: "error".into(),
            error: Some("boom".into()),
            model: None,
        };
        let report = MatrixReport::from_records(Path::new("base.pnm"), 2, vec![record, failed]);
        assert_eq!((report.succeeded, report.failed, report.cancelled), (1, 1, 0));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("matrix_manifest.json");
        report.write(&path).unwrap();
        assert_eq!(MatrixReport::load(&path).unwrap(), report);
    }
}
