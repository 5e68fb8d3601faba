//! Post-processing of flattened tables
//!
//! These passes run after flattening and rely on its column naming
//! convention: singleton-suffix cleanup, timestamp coercion with column
//! reordering, and the wide-to-long pivot of paired sibling columns.

pub mod cleanup;
pub mod coerce;
pub mod pivot;

pub use cleanup::dedupe_suffix;
pub use coerce::{coerce_timestamps, columns_with_prefix, parse_timestamp, reorder_columns};
pub use pivot::{pivot_paired_columns, PairedGroups};
