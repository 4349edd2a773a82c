//! pn-core: shared foundation for pipenet.
//!
//! Contains:
//! - table (the row/column `Table` every stage reads and writes, plus `Value` cells)
//! - registry (closed component vocabulary, settable parameters, simulation settings)
//! - units (explicit unit conversion tables backed by uom)
//! - error (shared error types)

pub mod error;
pub mod registry;
pub mod table;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use registry::{ComponentKind, Registry, SettingKey, params};
pub use table::{Table, Value};
pub use units::{UnitConversions, convert};
