use pn_tables::TableError;
use thiserror::Error;

pub type CaseResult<T> = Result<T, CaseError>;

#[derive(Error, Debug)]
pub enum CaseError {
    /// The case resolves to no overrides, settings or flows; it is never run.
    #[error("Case {key} has nothing to apply")]
    EmptyCase { key: String },

    #[error("Unknown case '{case}'")]
    UnknownCase { case: String },

    #[error("Unknown condition '{condition}'")]
    UnknownCondition { condition: String },

    #[error("Unknown simulation setting '{label}' (case {key})")]
    UnknownSetting { key: String, label: String },

    #[error(transparent)]
    Table(#[from] TableError),
}
