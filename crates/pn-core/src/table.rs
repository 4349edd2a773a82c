//! Row/column tables exchanged between the workbook layer and the pipeline stages.
//!
//! A `Table` is a header row plus rectangular rows of `Value` cells. Every row
//! is kept exactly as wide as the header, so column lookups never go out of
//! bounds.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// True for empty cells, blank text, and NaN.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Number(v) => v.is_nan(),
            Value::Bool(_) => false,
        }
    }

    /// Numeric coercion: numbers and numeric text parse, everything else is missing.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Value::Number(v) => *v,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Empty | Value::Bool(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(v) if *v == 0.0 => Some(false),
            Value::Number(v) if *v == 1.0 => Some(true),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Trimmed textual form used for names and labels; `None` for empty cells.
    pub fn label(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            Value::Text(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Total order used for sorting rows: empties last, numbers before text.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                _ if v.is_empty() => 3,
                Value::Bool(_) | Value::Number(_) => 0,
                Value::Text(_) => 1,
                Value::Empty => 3,
            }
        }
        match (self, other) {
            (a, b) if rank(a) != rank(b) => rank(a).cmp(&rank(b)),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) => a.to_string().cmp(&b.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Empty)
    }
}

/// A header row plus rectangular data rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from a header and rows; rows are padded or cut to the header width.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Interpret a raw cell grid: the first row is the header.
    ///
    /// Blank header cells are named `Unnamed: <index>`.
    pub fn from_grid(grid: Vec<Vec<Value>>) -> Self {
        let mut iter = grid.into_iter();
        let Some(header) = iter.next() else {
            return Self::default();
        };
        let width = header.len();
        let columns = header
            .iter()
            .enumerate()
            .map(|(i, cell)| cell.label().unwrap_or_else(|| format!("Unnamed: {i}")))
            .collect::<Vec<_>>();
        let mut table = Self::new(columns);
        for mut row in iter {
            row.resize(width, Value::Empty);
            table.rows.push(row);
        }
        table
    }

    /// Header followed by the data rows, as a raw cell grid.
    pub fn to_grid(&self) -> Vec<Vec<Value>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.columns.iter().map(|c| Value::Text(c.clone())).collect());
        grid.extend(self.rows.iter().cloned());
        grid
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Overwrite one cell. Returns false when the row or column does not exist.
    pub fn set_cell(&mut self, row: usize, column: &str, value: Value) -> bool {
        let Some(col) = self.column_index(column) else {
            return false;
        };
        match self.rows.get_mut(row) {
            Some(r) => {
                r[col] = value;
                true
            }
            None => false,
        }
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[col]).collect())
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
    }

    pub fn insert_row(&mut self, index: usize, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Empty);
        self.rows.insert(index.min(self.rows.len()), row);
    }

    pub fn remove_row(&mut self, index: usize) -> Option<Vec<Value>> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Append a column filled with `fill`; an existing column is left untouched.
    pub fn add_column(&mut self, name: impl Into<String>, fill: Value) -> usize {
        let name = name.into();
        if let Some(idx) = self.column_index(&name) {
            return idx;
        }
        self.columns.push(name);
        for row in &mut self.rows {
            row.push(fill.clone());
        }
        self.columns.len() - 1
    }

    /// Insert a column at `index` with one value per row (missing values are empty).
    pub fn insert_column(&mut self, index: usize, name: impl Into<String>, values: Vec<Value>) {
        let index = index.min(self.columns.len());
        self.columns.insert(index, name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(index, values.next().unwrap_or_default());
        }
    }

    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(col) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(col);
        for row in &mut self.rows {
            row.remove(col);
        }
        true
    }

    /// Keep only the first `width` columns.
    pub fn truncate_columns(&mut self, width: usize) {
        self.columns.truncate(width);
        for row in &mut self.rows {
            row.truncate(width);
        }
    }

    pub fn rename_column(&mut self, old: &str, new: impl Into<String>) -> bool {
        match self.column_index(old) {
            Some(idx) => {
                self.columns[idx] = new.into();
                true
            }
            None => false,
        }
    }

    /// Rewrite every header through `f`.
    pub fn map_columns(&mut self, mut f: impl FnMut(&str) -> String) {
        for col in &mut self.columns {
            *col = f(col);
        }
    }

    /// Project onto the named columns, in the given order. Unknown names are ignored.
    pub fn select(&self, columns: &[&str]) -> Table {
        let picked: Vec<(usize, &str)> = columns
            .iter()
            .filter_map(|name| self.column_index(name).map(|i| (i, *name)))
            .collect();
        Table {
            columns: picked.iter().map(|(_, n)| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| picked.iter().map(|(i, _)| r[*i].clone()).collect())
                .collect(),
        }
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Value]) -> bool) {
        self.rows.retain(|r| keep(r));
    }

    /// Drop rows in which every cell is empty.
    pub fn drop_empty_rows(&mut self) {
        self.rows.retain(|r| r.iter().any(|v| !v.is_empty()));
    }

    /// Carry the last non-empty value of `column` down into empty cells.
    pub fn forward_fill(&mut self, column: &str) -> bool {
        let Some(col) = self.column_index(column) else {
            return false;
        };
        let mut last = Value::Empty;
        for row in &mut self.rows {
            if row[col].is_empty() {
                row[col] = last.clone();
            } else {
                last = row[col].clone();
            }
        }
        true
    }

    /// Stable sort of the data rows.
    pub fn sort_rows_by(&mut self, mut cmp: impl FnMut(&[Value], &[Value]) -> Ordering) {
        self.rows.sort_by(|a, b| cmp(a, b));
    }

    /// Re-header the table on the first row whose leading cell equals `key`.
    ///
    /// Sheets often carry a title block above the real header; the key column
    /// name marks where the data starts.
    pub fn rebase_on_key(&self, key: &str) -> Option<Table> {
        if self.columns.first().map(String::as_str) == Some(key) {
            return Some(self.clone());
        }
        let header_idx = self
            .rows
            .iter()
            .position(|r| r.first().and_then(Value::label).as_deref() == Some(key))?;
        let mut grid = Vec::with_capacity(self.rows.len() - header_idx);
        grid.extend(self.rows[header_idx..].iter().cloned());
        Some(Table::from_grid(grid))
    }

    /// Append the rows of `other`, aligning by column name and adding any new columns.
    pub fn extend_aligned(&mut self, other: &Table) {
        for col in &other.columns {
            self.add_column(col.clone(), Value::Empty);
        }
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();
        for row in &other.rows {
            let mut new_row = vec![Value::Empty; self.columns.len()];
            for (src, dst) in mapping.iter().enumerate() {
                new_row[*dst] = row[src].clone();
            }
            self.rows.push(new_row);
        }
    }

    /// Iterate one row as `(column, value)` pairs.
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.rows.get(row).into_iter().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn numeric_coercion_treats_garbage_as_missing() {
        assert_eq!(Value::from(3.5).as_f64(), Some(3.5));
        assert_eq!(text(" 12 ").as_f64(), Some(12.0));
        assert_eq!(text("n/a").as_f64(), None);
        assert_eq!(Value::Empty.as_f64(), None);
        assert_eq!(Value::Number(f64::NAN).as_f64(), None);
    }

    #[test]
    fn rows_are_padded_to_header_width() {
        let table = Table::from_rows(["a", "b", "c"], vec![vec![Value::from(1.0)]]);
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.cell(0, "c"), Some(&Value::Empty));
    }

    #[test]
    fn rebase_on_key_skips_title_block() {
        let grid = vec![
            vec![text("Flow profile"), Value::Empty],
            vec![Value::Empty, Value::Empty],
            vec![text("Sinks"), text("EO")],
            vec![text("W1"), Value::from(10.0)],
        ];
        let table = Table::from_grid(grid).rebase_on_key("Sinks").unwrap();
        assert_eq!(table.columns(), &["Sinks".to_string(), "EO".to_string()]);
        assert_eq!(table.len(), 1);
        assert!(Table::new(["x"]).rebase_on_key("Sinks").is_none());
    }

    #[test]
    fn forward_fill_carries_last_label() {
        let mut table = Table::from_rows(
            ["eq"],
            vec![
                vec![Value::Empty],
                vec![text("PumpA")],
                vec![Value::Empty],
                vec![text("StrainerB")],
            ],
        );
        table.forward_fill("eq");
        let col: Vec<_> = table.column("eq").unwrap().into_iter().cloned().collect();
        assert_eq!(
            col,
            vec![Value::Empty, text("PumpA"), text("PumpA"), text("StrainerB")]
        );
    }

    #[test]
    fn extend_aligned_unions_columns() {
        let mut a = Table::from_rows(["x", "y"], vec![vec![Value::from(1.0), Value::from(2.0)]]);
        let b = Table::from_rows(["y", "z"], vec![vec![Value::from(3.0), Value::from(4.0)]]);
        a.extend_aligned(&b);
        assert_eq!(a.columns().len(), 3);
        assert_eq!(a.cell(1, "x"), Some(&Value::Empty));
        assert_eq!(a.cell(1, "z"), Some(&Value::from(4.0)));
    }

    #[test]
    fn json_cells_round_trip_untagged() {
        let row = vec![Value::Empty, Value::from(true), Value::from(1.5), text("a")];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,true,1.5,"a"]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn sort_cmp_puts_empties_last() {
        let mut values = vec![Value::Empty, text("b"), Value::from(2.0), text("a")];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values, vec![Value::from(2.0), text("a"), text("b"), Value::Empty]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn cell() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Empty),
            any::<bool>().prop_map(Value::Bool),
            (-1e6_f64..1e6_f64).prop_map(Value::Number),
            "[a-zA-Z0-9 ]{0,6}".prop_map(Value::Text),
        ]
    }

    proptest! {
        #[test]
        fn sort_puts_empties_last(values in prop::collection::vec(cell(), 0..24)) {
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.sort_cmp(b));
            let first_empty = sorted.iter().position(Value::is_empty).unwrap_or(sorted.len());
            prop_assert!(sorted[first_empty..].iter().all(Value::is_empty));
            prop_assert_eq!(sorted.len(), values.len());
        }

        #[test]
        fn rows_always_match_header_width(
            width in 1usize..6,
            rows in prop::collection::vec(prop::collection::vec(cell(), 0..9), 0..8),
        ) {
            let header: Vec<String> = (0..width).map(|i| format!("c{i}")).collect();
            let mut table = Table::from_rows(header, rows);
            table.add_column("extra", Value::Empty);
            table.drop_column("c0");
            prop_assert!(table.rows().iter().all(|r| r.len() == table.width()));
        }
    }
}
