//! Error types for the table pipeline.

use thiserror::Error;

/// Errors raised while turning a response into a table.
///
/// Every variant is terminal for the pipeline run that produced it: no
/// partial table is returned alongside an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The response is neither a record nor a sequence of records.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A timestamp column holds a value that does not parse.
    #[error("Parse error in column '{column}' at row {row}: cannot parse '{value}' as a timestamp")]
    ParseError {
        column: String,
        row: usize,
        value: String,
    },

    /// A column belongs to a pivot group but does not follow its naming pattern.
    #[error("Schema mismatch: column '{column}' does not match model_(features|params)_<id>")]
    SchemaMismatch { column: String },
}

pub type Result<T> = std::result::Result<T, Error>;
