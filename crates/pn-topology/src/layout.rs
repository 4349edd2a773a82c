//! Cosmetic grid placement of components.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Grid used to place components on the model canvas.
///
/// Each section gets its own row `row_spacing` below the previous one and
/// components step `interval` apart along the row, or down the column for
/// sections listed in `vertical`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub origin_x: f64,
    pub origin_y: f64,
    pub row_spacing: f64,
    pub interval: f64,
    /// Column-pair indices laid out vertically.
    pub vertical: BTreeSet<usize>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            origin_x: 4000.0,
            origin_y: 0.0,
            row_spacing: 100.0,
            interval: 100.0,
            vertical: BTreeSet::new(),
        }
    }
}

impl Layout {
    /// Position of the `position`-th component of the `order`-th section built.
    pub fn place(&self, order: usize, section_index: usize, position: usize) -> (f64, f64) {
        let row_y = self.origin_y + order as f64 * self.row_spacing;
        let step = position as f64 * self.interval;
        if self.vertical.contains(&section_index) {
            (self.origin_x, row_y + step)
        } else {
            (self.origin_x + step, row_y)
        }
    }
}
