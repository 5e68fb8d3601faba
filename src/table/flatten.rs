use crate::error::Result;
use crate::normalize::normalize;
use crate::table::naming::Naming;
use crate::table::types::{Cell, Column, Table};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

/// Working representation while flattening: named columns of raw values.
type Frame = Vec<(String, Vec<Value>)>;

/// Turns a batch of nested records into a rectangular table
///
/// Flattening works column-wise over the whole batch: every column that holds
/// an object or a sequence in any row is replaced by one sibling column per
/// sub-key found across all rows, and passes repeat until no nested column is
/// left.
pub struct Flattener {
    naming: Naming,
}

impl Flattener {
    pub fn new(naming: Naming) -> Self {
        Flattener { naming }
    }

    /// Flatten a raw response (one record or a sequence of records).
    pub fn flatten_response(&self, response: Value) -> Result<Table> {
        let records = normalize(response)?;
        Ok(self.flatten(records))
    }

    /// Flatten a batch of records. The output has one row per record, in
    /// batch order.
    pub fn flatten(&self, records: Vec<Map<String, Value>>) -> Table {
        let rows = records.len();
        let columns = self
            .flatten_frame(records)
            .into_iter()
            .map(|(name, values)| Column::new(name, values.into_iter().map(Cell::from).collect()))
            .collect();
        Table::from_columns(rows, columns)
    }

    /// Widen until no column holds an object or a sequence.
    fn flatten_frame(&self, records: Vec<Map<String, Value>>) -> Frame {
        let mut frame = Self::initial_frame(records);
        let mut pass = 0usize;

        loop {
            let nested = frame.iter().filter(|(_, values)| is_nested(values)).count();
            if nested == 0 {
                break;
            }
            pass += 1;
            debug!(pass, nested, columns = frame.len(), "widening nested columns");
            frame = self.widen_pass(frame);
        }

        frame
    }

    /// Union of keys across records in first-seen order; absent keys are null.
    fn initial_frame(records: Vec<Map<String, Value>>) -> Frame {
        let rows = records.len();
        let mut frame: Frame = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (row, record) in records.into_iter().enumerate() {
            for (key, value) in record {
                let idx = match positions.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        positions.insert(key.clone(), frame.len());
                        frame.push((key, vec![Value::Null; rows]));
                        frame.len() - 1
                    }
                };
                frame[idx].1[row] = value;
            }
        }

        frame
    }

    /// Widen every nested column once, keeping column order.
    fn widen_pass(&self, frame: Frame) -> Frame {
        let mut next: Frame = Vec::with_capacity(frame.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (name, values) in frame {
            if !is_nested(&values) {
                push_unique(&mut next, &mut positions, name, values);
                continue;
            }
            for (child, child_values) in self.widen(&name, values) {
                push_unique(&mut next, &mut positions, child, child_values);
            }
        }

        next
    }

    /// Split one nested column into its sibling columns.
    fn widen(&self, name: &str, values: Vec<Value>) -> Frame {
        let mut entries: Vec<Option<Map<String, Value>>> = values
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                Value::Object(map) => Some(map),
                Value::Array(items) => Some(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(offset, item)| (self.naming.index_key(offset), item))
                        .collect(),
                ),
                Value::Null => None,
                _ => {
                    trace!(column = name, row, "scalar in nested column, derived columns get null");
                    None
                }
            })
            .collect();

        let mut keys: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for map in entries.iter().flatten() {
            for key in map.keys() {
                if seen.insert(key.clone()) {
                    keys.push(key.clone());
                }
            }
        }

        keys.into_iter()
            .map(|key| {
                let cells = entries
                    .iter_mut()
                    .map(|entry| {
                        entry
                            .as_mut()
                            .and_then(|map| map.remove(&key))
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                (self.naming.child(name, &key), cells)
            })
            .collect()
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Flattener::new(Naming::default())
    }
}

/// A column is nested when any row holds an object or a sequence.
fn is_nested(values: &[Value]) -> bool {
    values.iter().any(|v| v.is_object() || v.is_array())
}

/// Append a column, overwriting an earlier one that has the same name.
fn push_unique(frame: &mut Frame, positions: &mut HashMap<String, usize>, name: String, values: Vec<Value>) {
    match positions.get(&name) {
        Some(&idx) => {
            warn!(column = %name, "derived column name collides with an existing column, keeping the later one");
            frame[idx].1 = values;
        }
        None => {
            positions.insert(name.clone(), frame.len());
            frame.push((name, values));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<Map<String, Value>> {
        normalize(value).unwrap()
    }

    fn cells(values: Value) -> Vec<Cell> {
        match values {
            Value::Array(items) => items.into_iter().map(Cell::from).collect(),
            other => panic!("expected array, got {other}"),
        }
    }

    #[test]
    fn test_nested_object() {
        let table = Flattener::default().flatten(records(json!([
            {"id": 1, "loc": {"lat": 1.0, "lon": 2.0}}
        ])));

        assert_eq!(table.column_names(), vec!["id", "loc_lat", "loc_lon"]);
        assert_eq!(table.num_rows(), 1);
        let row: Vec<Cell> = table.row(0).unwrap().into_iter().map(|(_, c)| c.clone()).collect();
        assert_eq!(row, cells(json!([1, 1.0, 2.0])));
    }

    #[test]
    fn test_scalar_sequence() {
        let table = Flattener::default().flatten(records(json!([
            {"id": 1, "tags": ["a", "b"]}
        ])));

        assert_eq!(table.column_names(), vec!["id", "tags_1", "tags_2"]);
        assert_eq!(table.cell(0, "tags_1"), Some(&Cell::String("a".to_string())));
        assert_eq!(table.cell(0, "tags_2"), Some(&Cell::String("b".to_string())));
    }

    #[test]
    fn test_sequence_of_objects() {
        let table = Flattener::default().flatten(records(json!([
            {"sn": "MOD-1", "sensors": [{"name": "pm", "ok": true}, {"name": "co"}]}
        ])));

        assert_eq!(
            table.column_names(),
            vec!["sn", "sensors_1_name", "sensors_1_ok", "sensors_2_name"]
        );
        assert_eq!(table.cell(0, "sensors_1_ok"), Some(&Cell::Boolean(true)));
    }

    #[test]
    fn test_missing_keys_are_null() {
        let table = Flattener::default().flatten(records(json!([
            {"id": 1, "geo": {"lat": 40.0}},
            {"id": 2, "name": "b", "geo": {"lon": -71.0}}
        ])));

        assert_eq!(table.column_names(), vec!["id", "geo_lat", "geo_lon", "name"]);
        assert_eq!(table.cell(0, "name"), Some(&Cell::Null));
        assert_eq!(table.cell(1, "geo_lat"), Some(&Cell::Null));
        assert_eq!(table.cell(0, "geo_lon"), Some(&Cell::Null));
    }

    #[test]
    fn test_uneven_sequences() {
        let table = Flattener::default().flatten(records(json!([
            {"tags": ["a"]},
            {"tags": ["b", "c", "d"]},
            {"tags": []}
        ])));

        assert_eq!(table.column_names(), vec!["tags_1", "tags_2", "tags_3"]);
        assert_eq!(table.column("tags_3").unwrap().cells, cells(json!([null, "d", null])));
        assert_eq!(table.column("tags_1").unwrap().cells, cells(json!(["a", "b", null])));
    }

    #[test]
    fn test_scalar_rows_in_nested_column() {
        let table = Flattener::default().flatten(records(json!([
            {"meta": {"a": 1}},
            {"meta": "legacy"},
            {"meta": null}
        ])));

        assert_eq!(table.column_names(), vec!["meta_a"]);
        assert_eq!(table.column("meta_a").unwrap().cells, cells(json!([1, null, null])));
    }

    #[test]
    fn test_empty_nested_values_drop_column() {
        let table = Flattener::default().flatten(records(json!([
            {"id": 1, "extra": {}},
            {"id": 2, "extra": []}
        ])));

        assert_eq!(table.column_names(), vec!["id"]);
        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn test_name_collision_keeps_later_column() {
        let table = Flattener::default().flatten(records(json!([
            {"a": {"b": 1}, "a_b": 2}
        ])));

        assert_eq!(table.column_names(), vec!["a_b"]);
        assert_eq!(table.cell(0, "a_b"), Some(&Cell::from(json!(2))));
    }

    #[test]
    fn test_deep_nesting() {
        let mut value = json!(7);
        for _ in 0..300 {
            let mut map = Map::new();
            map.insert("n".to_string(), value);
            value = Value::Object(map);
        }
        let mut record = Map::new();
        record.insert("root".to_string(), value);

        let table = Flattener::default().flatten(vec![record]);

        assert_eq!(table.num_columns(), 1);
        let name = &table.columns()[0].name;
        assert!(name.starts_with("root_n_n"));
        assert_eq!(name.matches("_n").count(), 300);
        assert_eq!(table.columns()[0].cells, cells(json!([7])));
    }

    #[test]
    fn test_custom_separator() {
        let table = Flattener::new(Naming::new(".").unwrap()).flatten(records(json!({
            "model": {"features": ["pm1"]}
        })));

        assert_eq!(table.column_names(), vec!["model.features.1"]);
    }

    #[test]
    fn test_flatten_response_rejects_scalars() {
        let err = Flattener::default().flatten_response(json!(42)).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }

    #[test]
    fn test_empty_batch() {
        let table = Flattener::default().flatten(Vec::new());
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_value() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i32>().prop_map(|n| json!(n)),
                "[a-z]{0,4}".prop_map(Value::String),
            ];
            leaf.prop_recursive(4, 32, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                    prop::collection::btree_map("[a-c]", inner, 0..3)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        fn arb_batch() -> impl Strategy<Value = Vec<Map<String, Value>>> {
            prop::collection::vec(prop::collection::btree_map("[a-c]", arb_value(), 0..4), 0..6)
                .prop_map(|rows| rows.into_iter().map(|m| m.into_iter().collect()).collect())
        }

        fn to_records(table: &Table) -> Vec<Map<String, Value>> {
            (0..table.num_rows())
                .map(|i| {
                    table
                        .row(i)
                        .unwrap()
                        .into_iter()
                        .map(|(name, cell)| (name.to_string(), serde_json::to_value(cell).unwrap()))
                        .collect()
                })
                .collect()
        }

        proptest! {
            #[test]
            fn row_count_is_preserved(batch in arb_batch()) {
                let rows = batch.len();
                let table = Flattener::default().flatten(batch);
                prop_assert_eq!(table.num_rows(), rows);
                for column in table.columns() {
                    prop_assert_eq!(column.cells.len(), rows);
                }
            }

            #[test]
            fn output_has_no_nested_cells(batch in arb_batch()) {
                let frame = Flattener::default().flatten_frame(batch);
                for (name, values) in &frame {
                    for value in values {
                        prop_assert!(
                            !value.is_object() && !value.is_array(),
                            "nested value in column {}", name
                        );
                    }
                }
            }

            #[test]
            fn column_names_are_deterministic(batch in arb_batch()) {
                let first = Flattener::default().flatten(batch.clone());
                let second = Flattener::default().flatten(batch);
                prop_assert_eq!(first.column_names(), second.column_names());
            }

            #[test]
            fn flat_tables_are_terminal(batch in arb_batch()) {
                let table = Flattener::default().flatten(batch);
                let again = Flattener::default().flatten(to_records(&table));
                prop_assert_eq!(table, again);
            }
        }
    }
}
