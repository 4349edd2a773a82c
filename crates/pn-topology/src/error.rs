//! Topology errors.

use crate::builder::SectionFailure;
use pn_engine::EngineError;
use pn_tables::TableError;
use thiserror::Error;

pub type TopologyResult<T> = Result<T, TopologyError>;

#[derive(Error, Debug)]
pub enum TopologyError {
    /// A connection endpoint is not present in the live model.
    #[error("Section {section}: cannot connect '{from}' -> '{to}', component '{missing}' not found")]
    UnresolvedEndpoint {
        section: usize,
        from: String,
        to: String,
        missing: String,
    },

    /// Some sections failed while the rest were built.
    #[error("{} of {total} sections failed to build: {}", .failed.len(), summarize(.failed))]
    PartialBuild {
        failed: Vec<SectionFailure>,
        total: usize,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Table(#[from] TableError),
}

fn summarize(failed: &[SectionFailure]) -> String {
    failed
        .iter()
        .map(|f| format!("section {} ({})", f.section, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}
