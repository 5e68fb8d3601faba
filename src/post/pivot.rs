use crate::error::{Error, Result};
use crate::table::naming::Naming;
use crate::table::types::{Cell, Column, Table};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Column holding the element id of a pivoted row.
pub const ELEMENT_ID_COLUMN: &str = "element_id";
/// Column holding the group a pivoted value came from.
pub const ELEMENT_COLUMN: &str = "element";
/// Column holding the pivoted value as text.
pub const VALUE_COLUMN: &str = "value";

/// Two groups of sibling columns that share element ids:
/// `<stem><sep><left><sep>...<id>` and `<stem><sep><right><sep>...<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedGroups {
    pub stem: String,
    pub left: String,
    pub right: String,
}

impl PairedGroups {
    /// `model_features_<id>` / `model_params_<id>` of calibration models.
    pub fn calibration() -> Self {
        PairedGroups {
            stem: "model".to_string(),
            left: "features".to_string(),
            right: "params".to_string(),
        }
    }

    fn groups(&self) -> [&str; 2] {
        [self.left.as_str(), self.right.as_str()]
    }
}

/// Index of the left group in [`PairedGroups::groups`].
const LEFT: usize = 0;

/// Where a column ends up in the pivot.
enum Role {
    Passthrough,
    Member { group: usize, remainder: String },
}

/// Reshape paired sibling columns into long format.
///
/// Each input row yields one output row per (element id, group), with ids in
/// first-seen column order and the left group before the right. Output
/// columns are the columns outside both groups (repeated per output row),
/// then `element_id`, `element` and `value`. A side with no column for an id
/// contributes a null value.
///
/// A left-group id is everything after `<stem><sep><left><sep>`. A right-group
/// column takes the longest separator-aligned suffix of its remainder that is
/// a left-group id, or its whole remainder when none is.
///
/// A bare `<stem><sep><left>` column is first renamed to carry index 1.
pub fn pivot_paired_columns(table: Table, groups: &PairedGroups, naming: &Naming) -> Result<Table> {
    let table = rename_bare_left(table, groups, naming);
    let rows = table.num_rows();

    let mut passthrough: Vec<Column> = Vec::new();
    let mut members: Vec<(usize, String, Column)> = Vec::new();

    for column in table.into_columns() {
        match classify(&column.name, groups, naming)? {
            Role::Passthrough => passthrough.push(column),
            Role::Member { group, remainder } => members.push((group, remainder, column)),
        }
    }

    let element_ids = resolve_ids(&members, naming);
    let mut ids: Vec<String> = Vec::new();
    let mut paired: HashMap<(usize, String), Vec<Cell>> = HashMap::new();
    for ((group, _, column), id) in members.into_iter().zip(element_ids) {
        if !ids.contains(&id) {
            ids.push(id.clone());
        }
        paired.insert((group, id), column.cells);
    }

    if ids.is_empty() {
        warn!(stem = %groups.stem, "no paired columns found, pivot yields no rows");
    }
    debug!(rows, elements = ids.len(), "pivoting paired columns");

    let out_rows = rows * ids.len() * 2;
    let mut passthrough_cells: Vec<Vec<Cell>> = passthrough
        .iter()
        .map(|_| Vec::with_capacity(out_rows))
        .collect();
    let mut id_cells = Vec::with_capacity(out_rows);
    let mut element_cells = Vec::with_capacity(out_rows);
    let mut value_cells = Vec::with_capacity(out_rows);

    for row in 0..rows {
        for id in &ids {
            for (group, group_name) in groups.groups().iter().enumerate() {
                for (out, column) in passthrough_cells.iter_mut().zip(&passthrough) {
                    out.push(column.cells[row].clone());
                }
                id_cells.push(Cell::String(id.clone()));
                element_cells.push(Cell::String(group_name.to_string()));
                let value = paired
                    .get(&(group, id.clone()))
                    .and_then(|cells| cells[row].render())
                    .map(Cell::String)
                    .unwrap_or(Cell::Null);
                value_cells.push(value);
            }
        }
    }

    let mut columns: Vec<Column> = passthrough
        .into_iter()
        .zip(passthrough_cells)
        .map(|(column, cells)| Column::new(column.name, cells))
        .collect();
    columns.push(Column::new(ELEMENT_ID_COLUMN, id_cells));
    columns.push(Column::new(ELEMENT_COLUMN, element_cells));
    columns.push(Column::new(VALUE_COLUMN, value_cells));

    Ok(Table::from_columns(out_rows, columns))
}

/// Give a bare left-group column the index it lost to singleton stripping.
fn rename_bare_left(table: Table, groups: &PairedGroups, naming: &Naming) -> Table {
    let bare = naming.child(&groups.stem, &groups.left);
    let indexed = naming.child(&bare, &naming.index_key(0));
    if table.position(&bare).is_none() || table.position(&indexed).is_some() {
        return table;
    }

    let rows = table.num_rows();
    let columns = table
        .into_columns()
        .into_iter()
        .map(|mut column| {
            if column.name == bare {
                column.name = indexed.clone();
            }
            column
        })
        .collect();
    Table::from_columns(rows, columns)
}

fn classify(name: &str, groups: &PairedGroups, naming: &Naming) -> Result<Role> {
    for (group, group_name) in groups.groups().iter().enumerate() {
        let prefix = naming.child(&groups.stem, group_name);
        if name == prefix {
            return Err(Error::SchemaMismatch {
                column: name.to_string(),
            });
        }
        let Some(rest) = name.strip_prefix(prefix.as_str()) else {
            continue;
        };
        let Some(remainder) = rest.strip_prefix(naming.separator()) else {
            continue;
        };
        if remainder.is_empty() {
            return Err(Error::SchemaMismatch {
                column: name.to_string(),
            });
        }
        return Ok(Role::Member {
            group,
            remainder: remainder.to_string(),
        });
    }
    Ok(Role::Passthrough)
}

/// Element id of every group member, in member order.
///
/// Right-group columns whose remainder is exactly a left-group id claim it
/// first; the rest match by suffix against ids still unclaimed, so no two
/// columns of one group share an id.
fn resolve_ids(members: &[(usize, String, Column)], naming: &Naming) -> Vec<String> {
    let left_ids: Vec<&str> = members
        .iter()
        .filter(|(group, _, _)| *group == LEFT)
        .map(|(_, remainder, _)| remainder.as_str())
        .collect();
    let mut claimed: HashSet<&str> = members
        .iter()
        .filter(|(group, remainder, _)| *group != LEFT && left_ids.contains(&remainder.as_str()))
        .map(|(_, remainder, _)| remainder.as_str())
        .collect();

    let mut resolved = Vec::with_capacity(members.len());
    for (group, remainder, _) in members {
        if *group == LEFT || left_ids.contains(&remainder.as_str()) {
            resolved.push(remainder.clone());
            continue;
        }
        let matched = naming
            .suffixes(remainder)
            .find(|suffix| left_ids.contains(suffix) && !claimed.contains(suffix));
        match matched {
            Some(id) => {
                claimed.insert(id);
                resolved.push(id.to_string());
            }
            None => resolved.push(remainder.clone()),
        }
    }
    resolved
}
