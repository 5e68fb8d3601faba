//! # quantaq-table - Flat tables from air-quality API responses
//!
//! Responses from the monitoring API are nested JSON: records holding
//! records, sequences of records, and optional fields. This crate turns a
//! response into a rectangular table with deterministic column names.
//!
//! ## Modules
//!
//! - **normalize**: single-record vs. multi-record responses
//! - **table**: table types, the flattener, and table writers
//! - **post**: suffix cleanup, timestamp coercion, wide-to-long pivot
//! - **pipeline**: per-kind processing
//! - **client**: the fetch seam and a client composing fetch + pipeline
//!
//! ## Quick Start
//!
//! ```rust
//! use quantaq_table::{process, FlattenConfig, Kind};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let response = json!([
//!     {"id": 1, "loc": {"lat": 1.0, "lon": 2.0}, "tags": ["a", "b"]}
//! ]);
//!
//! let table = process(Kind::Devices, response, &FlattenConfig::default())?;
//! assert_eq!(table.column_names(), vec!["id", "loc_lat", "loc_lon", "tags_1", "tags_2"]);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::BufRead;

pub mod client;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod post;
pub mod table;

// Re-export commonly used types for convenience
pub use client::{Client, Fetch, MemoryFetcher};
pub use error::Error;
pub use normalize::{normalize, Response};
pub use pipeline::{process, Kind};
pub use table::{Cell, Column, FlattenConfig, Flattener, Naming, OutputFormat, Table, TableWriter};

/// Read newline-delimited JSON into one response
///
/// Each non-empty line is a record, or a sequence of records (one page).
/// Pages are concatenated in line order.
pub fn read_ndjson<R: BufRead>(reader: R) -> Result<Value> {
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", idx + 1))?;

        match value {
            Value::Array(page) => records.extend(page),
            record => records.push(record),
        }
    }

    Ok(Value::Array(records))
}
