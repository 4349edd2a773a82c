use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown component type: {value}")]
    UnknownComponentKind { value: String },

    #[error("Unknown simulation setting: {label}")]
    UnknownSetting { label: String },

    #[error("Unknown unit: {unit}")]
    UnknownUnit { unit: String },

    #[error("Cannot convert between {from} and {to}")]
    IncompatibleUnits { from: String, to: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
