use pn_engine::EngineError;
use pn_tables::TableError;
use thiserror::Error;

pub type PopulateResult<T> = Result<T, PopulateError>;

#[derive(Error, Debug)]
pub enum PopulateError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
