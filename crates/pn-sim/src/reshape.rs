//! Turn raw run results into the node and profile sheets.
//!
//! Both tables keep the engine's units row as row 0 so unit conversion and
//! downstream summaries can find it.

use pn_core::{Table, Value, params};
use pn_engine::{BoundaryTable, RunResult};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// One row per node with its boundary role in `Type`.
///
/// Nodes whose role the boundary table cannot resolve are dropped. Rows
/// sort by type descending, then name ascending, below the units row.
pub fn reshape_nodes(result: &RunResult, boundaries: &BoundaryTable) -> Table {
    let variables: BTreeSet<&str> = result
        .node
        .values()
        .flat_map(|values| values.keys().map(String::as_str))
        .collect();
    let mut table = Table::new(
        [params::NODE, params::TYPE]
            .into_iter()
            .chain(variables.iter().copied()),
    );

    let mut dropped = Vec::new();
    for (node, values) in &result.node {
        if node == params::UNIT_ROW {
            continue;
        }
        let Some(kind) = boundaries.node_type(node) else {
            dropped.push(node.as_str());
            continue;
        };
        let mut row = vec![Value::from(node.as_str()), Value::from(kind)];
        row.extend(variables.iter().map(|v| values.get(*v).cloned().unwrap_or_default()));
        table.push_row(row);
    }
    if !dropped.is_empty() {
        tracing::warn!(nodes = ?dropped, "nodes without a boundary type dropped from results");
    }

    table.sort_rows_by(|a, b| b[1].sort_cmp(&a[1]).then_with(|| a[0].sort_cmp(&b[0])));

    let units = result.node.get(params::UNIT_ROW);
    let mut unit_row = vec![Value::from(params::UNIT_ROW), Value::Empty];
    unit_row.extend(
        variables
            .iter()
            .map(|v| units.and_then(|u| u.get(*v)).cloned().unwrap_or_default()),
    );
    table.insert_row(0, unit_row);
    table
}

/// One row per distinct equipment per branch.
///
/// `BranchEquipment` is filled down, rows still unlabelled are dropped, and
/// for repeated equipment the last row wins. Rows sort by branch, then
/// equipment, below the units row.
pub fn reshape_profiles(result: &RunResult) -> Table {
    let mut variables: Vec<&str> = Vec::new();
    for table in result.profile.values() {
        for column in table.columns() {
            if column != params::BRANCH_EQUIPMENT && !variables.contains(&column.as_str()) {
                variables.push(column.as_str());
            }
        }
    }
    let mut out = Table::new(
        [params::BRANCH, params::BRANCH_EQUIPMENT]
            .into_iter()
            .chain(variables.iter().copied()),
    );

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (branch, profile) in &result.profile {
        let mut profile = profile.clone();
        if !profile.forward_fill(params::BRANCH_EQUIPMENT) {
            tracing::warn!(branch = %branch, "profile without BranchEquipment column skipped");
            continue;
        }
        let mut last: BTreeMap<String, usize> = BTreeMap::new();
        for row in 0..profile.len() {
            if let Some(equipment) = profile.cell(row, params::BRANCH_EQUIPMENT).and_then(Value::label) {
                last.insert(equipment, row);
            }
        }
        for (equipment, row) in last {
            let mut values = vec![Value::from(branch.as_str()), Value::from(equipment)];
            values.extend(
                variables
                    .iter()
                    .map(|v| profile.cell(row, v).cloned().unwrap_or_default()),
            );
            rows.push(values);
        }
    }
    rows.sort_by(|a, b| match a[0].sort_cmp(&b[0]) {
        Ordering::Equal => a[1].sort_cmp(&b[1]),
        other => other,
    });

    let mut unit_row = vec![Value::from(params::UNIT_ROW), Value::Empty];
    unit_row.extend(
        variables
            .iter()
            .map(|v| result.profile_units.get(*v).map(|u| Value::from(u.as_str())).unwrap_or_default()),
    );
    out.push_row(unit_row);
    for row in rows {
        out.push_row(row);
    }
    out
}
