use crate::table::naming::Naming;
use crate::table::types::{Column, Table};
use tracing::debug;

/// Strip singleton index markers from column names.
///
/// A trailing `<sep>1` is dropped when no `<base><sep>2` sibling exists, i.e.
/// when the index only records that a sequence had a single element. The
/// check repeats so `a_1_1` becomes `a` for doubly-singleton nesting. If two
/// columns end up with the same name, the later one overwrites the earlier.
pub fn dedupe_suffix(table: Table, naming: &Naming) -> Table {
    let original: Vec<String> = table.column_names().into_iter().map(String::from).collect();
    let mut out = Table::new(table.num_rows());

    for column in table.into_columns() {
        let name = stripped_name(&column.name, &original, naming);
        if out.push_column(Column::new(name, column.cells)) {
            debug!(column = %column.name, "stripped column name collides, overwriting earlier column");
        }
    }

    out
}

fn stripped_name(name: &str, names: &[String], naming: &Naming) -> String {
    let mut current = name;
    while let Some(base) = naming.strip_singleton(current) {
        if naming.has_second_sibling(base, names.iter().map(String::as_str)) {
            break;
        }
        current = base;
    }
    current.to_string()
}
