//! pn-topology: build a connected network from a component-pair table.
//!
//! The input table lists sections as adjacent `(name, type)` column pairs.
//! Sections are read, separated with synthetic junctions wherever two
//! flowlines would touch, laid out on a grid, and authored into an engine
//! session.

pub mod builder;
pub mod error;
pub mod layout;
pub mod section;

pub use builder::{BuildReport, SectionFailure, TopologyBuilder};
pub use error::{TopologyError, TopologyResult};
pub use layout::Layout;
pub use section::{Section, SectionRow, insert_junctions, junction_name, sections_from_table};
