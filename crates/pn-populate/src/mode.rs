use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a populate run does with the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    SimpleImport,
    GeometryImport,
    Export,
    BulkImport,
}

impl ImportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportMode::SimpleImport => "simple_import",
            ImportMode::GeometryImport => "geometry_import",
            ImportMode::Export => "export",
            ImportMode::BulkImport => "bulk_import",
        }
    }

    /// Simple and geometry imports read one named sheet.
    pub fn needs_sheet(self) -> bool {
        matches!(self, ImportMode::SimpleImport | ImportMode::GeometryImport)
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "simple_import" | "simple" => Ok(ImportMode::SimpleImport),
            "geometry_import" | "flowline_geometry_import" | "geometry" => {
                Ok(ImportMode::GeometryImport)
            }
            "export" => Ok(ImportMode::Export),
            "bulk_import" | "bulk" => Ok(ImportMode::BulkImport),
            other => Err(format!("unknown import mode '{other}'")),
        }
    }
}
