//! In-memory workbook document: an ordered list of named cell grids.

use crate::cell::{CellRef, truncate_sheet_name};
use pn_core::{Table, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub cells: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// True when `name` is cut to fit and the cut name is already a sheet.
    pub fn truncation_collides(&self, name: &str) -> bool {
        let short = truncate_sheet_name(name);
        short != name && self.sheet(&short).is_some()
    }

    fn sheet_mut_or_insert(&mut self, name: &str) -> &mut Sheet {
        let idx = match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sheets.push(Sheet {
                    name: name.to_string(),
                    cells: Vec::new(),
                });
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[idx]
    }

    /// Read a sheet as a table.
    ///
    /// The header is the first row holding any value; leading blank columns
    /// and header-less blank columns are dropped, as are blank data rows.
    pub fn read_table(&self, name: &str) -> Option<Table> {
        let sheet = self.sheet(name)?;
        let first_row = sheet
            .cells
            .iter()
            .position(|r| r.iter().any(|v| !v.is_empty()));
        let Some(first_row) = first_row else {
            return Some(Table::default());
        };
        let rows = &sheet.cells[first_row..];
        let first_col = rows
            .iter()
            .filter_map(|r| r.iter().position(|v| !v.is_empty()))
            .min()
            .unwrap_or(0);
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);

        let mut grid: Vec<Vec<Value>> = rows
            .iter()
            .map(|r| {
                let mut row: Vec<Value> = r.iter().skip(first_col).cloned().collect();
                row.resize(width.saturating_sub(first_col), Value::Empty);
                row
            })
            .collect();

        // Blank header cells over blank data are padding, not columns.
        let keep: Vec<bool> = (0..width.saturating_sub(first_col))
            .map(|c| grid.iter().any(|r| !r[c].is_empty()))
            .collect();
        for row in &mut grid {
            let mut c = 0;
            row.retain(|_| {
                let k = keep[c];
                c += 1;
                k
            });
        }

        let mut table = Table::from_grid(grid);
        table.drop_empty_rows();
        Some(table)
    }

    /// Write `table` (header included) with its top-left corner at `anchor`.
    ///
    /// With `clear`, the sheet's previous contents are discarded first.
    /// Returns the sheet name actually used after truncation.
    pub fn write_table(&mut self, table: &Table, name: &str, anchor: CellRef, clear: bool) -> String {
        let short = truncate_sheet_name(name);
        if short != name && self.sheet(&short).is_some() {
            tracing::warn!(
                original = %name,
                sheet = %short,
                "truncated sheet name matches an existing sheet, which is overwritten"
            );
        }
        let name = short.into_owned();
        let sheet = self.sheet_mut_or_insert(&name);
        if clear {
            sheet.cells.clear();
        }
        let grid = table.to_grid();
        let needed_rows = anchor.row + grid.len();
        if sheet.cells.len() < needed_rows {
            sheet.cells.resize(needed_rows, Vec::new());
        }
        for (r, values) in grid.into_iter().enumerate() {
            let row = &mut sheet.cells[anchor.row + r];
            let needed_cols = anchor.col + values.len();
            if row.len() < needed_cols {
                row.resize(needed_cols, Value::Empty);
            }
            for (c, v) in values.into_iter().enumerate() {
                row[anchor.col + c] = v;
            }
        }
        name
    }
}
