//! Tables built from nested records
//!
//! This module holds the cell, column and table types, the naming convention
//! for derived columns, the flattener that widens nested columns, and writers
//! that export a finished table.

pub mod types;
pub mod naming;
pub mod flatten;
pub mod writer;

pub use types::{Cell, Column, FlattenConfig, Table};
pub use naming::Naming;
pub use flatten::Flattener;
pub use writer::{OutputFormat, TableWriter};
