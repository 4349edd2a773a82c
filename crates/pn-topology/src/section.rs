//! Sections and junction insertion.

use pn_core::{ComponentKind, Table};
use pn_tables::{SheetRef, TableResult};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRow {
    pub name: String,
    pub kind: ComponentKind,
    /// Junction added by `insert_junctions`, not present in the table.
    pub synthetic: bool,
}

impl SectionRow {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            synthetic: false,
        }
    }
}

/// One contiguous run of components read from one column pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Zero-based index of the column pair the section came from.
    pub index: usize,
    pub rows: Vec<SectionRow>,
}

impl Section {
    /// This section with junctions inserted between flowlines.
    pub fn with_junctions(self) -> Self {
        Self {
            rows: insert_junctions(self.index, &self.rows),
            index: self.index,
        }
    }
}

/// Read sections from a table of adjacent `(name, type)` column pairs.
///
/// An odd trailing column is dropped with a warning. Rows empty in both
/// columns are skipped; a row with only one of the two is malformed. Type
/// values must name a known component kind. Pairs with no rows yield no
/// section.
pub fn sections_from_table(table: &Table, origin: &SheetRef) -> TableResult<Vec<Section>> {
    let columns = table.columns();
    if columns.len() % 2 == 1 {
        tracing::warn!(
            sheet = %origin,
            column = %columns[columns.len() - 1],
            "odd number of columns, trailing column dropped"
        );
    }

    let mut sections = Vec::new();
    for (index, pair) in columns.chunks_exact(2).enumerate() {
        let (name_col, type_col) = (&pair[0], &pair[1]);
        let names = table.column(name_col).unwrap_or_default();
        let types = table.column(type_col).unwrap_or_default();

        let mut rows = Vec::new();
        for (row, (name, kind)) in names.iter().zip(types.iter()).enumerate() {
            match (name.label(), kind.label()) {
                (None, None) => continue,
                (Some(name), Some(kind)) => {
                    let kind = ComponentKind::from_str(&kind)
                        .map_err(|_| origin.unknown_kind(type_col, &kind).logged())?;
                    rows.push(SectionRow::new(name, kind));
                }
                (Some(name), None) => {
                    return Err(origin
                        .malformed(format!(
                            "component '{name}' in column '{name_col}' (row {}) has no type",
                            row + 1
                        ))
                        .logged());
                }
                (None, Some(kind)) => {
                    return Err(origin
                        .malformed(format!(
                            "type '{kind}' in column '{type_col}' (row {}) has no component name",
                            row + 1
                        ))
                        .logged());
                }
            }
        }

        if rows.is_empty() {
            tracing::debug!(sheet = %origin, section = index, "empty column pair skipped");
            continue;
        }
        sections.push(Section { index, rows });
    }

    tracing::info!(sheet = %origin, sections = sections.len(), "sections read");
    Ok(sections)
}

/// Name of the `sequence`-th synthetic junction of a section.
pub fn junction_name(section_index: usize, sequence: usize) -> String {
    format!("LJ({section_index}_{sequence})")
}

/// Separate flowlines with synthetic junctions.
///
/// A junction goes before a leading flowline, between every two consecutive
/// flowlines, and after a trailing flowline. Sequence numbers restart at 1
/// for each section.
pub fn insert_junctions(section_index: usize, rows: &[SectionRow]) -> Vec<SectionRow> {
    let mut out = Vec::with_capacity(rows.len() + 2);
    let mut sequence = 1;
    let mut push_junction = |out: &mut Vec<SectionRow>| {
        out.push(SectionRow {
            name: junction_name(section_index, sequence),
            kind: ComponentKind::Junction,
            synthetic: true,
        });
        sequence += 1;
    };

    let mut previous: Option<ComponentKind> = None;
    for (i, row) in rows.iter().enumerate() {
        let is_flowline = row.kind.is_flow_carrying();
        if i == 0 && is_flowline {
            push_junction(&mut out);
        }
        if previous.is_some_and(ComponentKind::is_flow_carrying) && is_flowline {
            push_junction(&mut out);
        }
        out.push(row.clone());
        previous = Some(row.kind);
    }
    if previous.is_some_and(ComponentKind::is_flow_carrying) {
        push_junction(&mut out);
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn kind() -> impl Strategy<Value = ComponentKind> {
        prop_oneof![
            3 => Just(ComponentKind::Flowline),
            1 => Just(ComponentKind::Pump),
            1 => Just(ComponentKind::Choke),
            1 => Just(ComponentKind::Sink),
        ]
    }

    fn sequence_of(name: &str) -> usize {
        name.trim_end_matches(')')
            .rsplit('_')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    proptest! {
        #[test]
        fn flowlines_never_touch(kinds in prop::collection::vec(kind(), 0..20), index in 0usize..5) {
            let rows: Vec<SectionRow> = kinds
                .iter()
                .enumerate()
                .map(|(i, k)| SectionRow::new(format!("C{i}"), *k))
                .collect();
            let out = insert_junctions(index, &rows);

            for pair in out.windows(2) {
                prop_assert!(!(pair[0].kind.is_flow_carrying() && pair[1].kind.is_flow_carrying()));
            }
            if let (Some(first), Some(last)) = (out.first(), out.last()) {
                prop_assert!(!first.kind.is_flow_carrying());
                prop_assert!(!last.kind.is_flow_carrying());
            }

            let originals: Vec<&SectionRow> = out.iter().filter(|r| !r.synthetic).collect();
            prop_assert_eq!(originals.len(), rows.len());
            prop_assert!(originals.iter().zip(rows.iter()).all(|(a, b)| *a == b));

            let seqs: Vec<usize> = out.iter().filter(|r| r.synthetic).map(|r| sequence_of(&r.name)).collect();
            prop_assert!(seqs.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(seqs.first().is_none_or(|s| *s == 1));
        }
    }
}
