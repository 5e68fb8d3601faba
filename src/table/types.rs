use crate::table::naming::Naming;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Number, Value};

/// A single table cell.
///
/// The flattener only produces `Null`, `String`, `Number` and `Boolean`;
/// `Timestamp` is introduced by timestamp coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    String(String),
    Number(Number),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text rendering used by the CSV writer and the pivot's value column.
    /// `Null` has no rendering.
    pub fn render(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::String(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Boolean(b) => Some(b.to_string()),
            Cell::Timestamp(ts) => Some(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        }
    }
}

impl From<Value> for Cell {
    /// Nested values never reach a finished table; if one is converted anyway
    /// it is kept as its JSON text.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Boolean(b),
            Value::Number(n) => Cell::Number(n),
            Value::String(s) => Cell::String(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Cell::String(nested.to_string()),
        }
    }
}

/// A named column; one cell per table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            cells,
        }
    }
}

/// A rectangular table: ordered, uniquely named columns of equal length.
///
/// Row `i` of every column describes the same source record. The row count
/// is stored separately so a table with rows but no columns (records with no
/// fields) keeps its height.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// An empty table of the given height.
    pub fn new(rows: usize) -> Self {
        Table {
            columns: Vec::new(),
            rows,
        }
    }

    /// Build a table from columns, appending each in order.
    ///
    /// Panics if the columns are not all `rows` long.
    pub fn from_columns(rows: usize, columns: Vec<Column>) -> Self {
        let mut table = Table::new(rows);
        for column in columns {
            table.push_column(column);
        }
        table
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        self.column(name).and_then(|c| c.cells.get(row))
    }

    /// Row `index` as `(column name, cell)` pairs in column order.
    pub fn row(&self, index: usize) -> Option<Vec<(&str, &Cell)>> {
        if index >= self.rows {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| (c.name.as_str(), &c.cells[index]))
                .collect(),
        )
    }

    /// Append a column. A column with the same name is overwritten in place
    /// and `true` is returned.
    ///
    /// Panics if the column length differs from the table height.
    pub fn push_column(&mut self, column: Column) -> bool {
        assert_eq!(
            column.cells.len(),
            self.rows,
            "column '{}' has {} cells, table has {} rows",
            column.name,
            column.cells.len(),
            self.rows
        );
        match self.position(&column.name) {
            Some(idx) => {
                self.columns[idx] = column;
                true
            }
            None => {
                self.columns.push(column);
                false
            }
        }
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

/// Configuration for flattening and the shared post-processing passes
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Naming convention for derived columns
    pub naming: Naming,

    /// Whether to strip singleton `<sep>1` markers after flattening
    pub strip_singleton_suffix: bool,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            naming: Naming::default(),
            strip_singleton_suffix: true,
        }
    }
}
