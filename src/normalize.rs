//! Arity normalization of raw responses.
//!
//! An endpoint answers either with one record (its fields visible at the top
//! level) or with a sequence of records. The shape is decided once, here,
//! before anything is flattened.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// A raw response with its arity made explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Single(Map<String, Value>),
    Many(Vec<Map<String, Value>>),
}

impl Response {
    /// Classify a raw response by shape.
    ///
    /// Objects are single records; sequences must hold only objects.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(record) => Ok(Response::Single(record)),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(Error::InvalidInput(format!(
                        "element {} of the response is {}, expected a record",
                        idx,
                        kind_of(&other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Response::Many),
            other => Err(Error::InvalidInput(format!(
                "response is {}, expected a record or a sequence of records",
                kind_of(&other)
            ))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Response::Single(_) => 1,
            Response::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<Map<String, Value>> {
        match self {
            Response::Single(record) => vec![record],
            Response::Many(records) => records,
        }
    }
}

/// Turn a raw response into a uniform batch of records.
pub fn normalize(response: Value) -> Result<Vec<Map<String, Value>>> {
    Response::from_value(response).map(Response::into_records)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a record",
    }
}
