//! Response kinds and the post-processing each one receives.

use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::post::coerce::{ACCOUNT_TIMESTAMP_COLUMNS, DEVICE_DATA_TIMESTAMP_PREFIX};
use crate::post::{
    coerce_timestamps, columns_with_prefix, dedupe_suffix, pivot_paired_columns, reorder_columns,
    PairedGroups,
};
use crate::table::{FlattenConfig, Flattener, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The response category of a fetched batch.
///
/// Chosen by the caller from the endpoint it fetched; never inferred from
/// the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Account,
    Teams,
    Devices,
    DeviceData,
    CalibrationModels,
    Logs,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Account,
        Kind::Teams,
        Kind::Devices,
        Kind::DeviceData,
        Kind::CalibrationModels,
        Kind::Logs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Account => "account",
            Kind::Teams => "teams",
            Kind::Devices => "devices",
            Kind::DeviceData => "device_data",
            Kind::CalibrationModels => "calibration_models",
            Kind::Logs => "logs",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    /// Accepts the snake_case name or its kebab-case spelling.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("unknown response kind '{}'", s)))
    }
}

/// Turn one raw response into the table for its kind.
///
/// Normalizes arity, flattens, applies the kind's own step, then strips
/// singleton suffixes as the final pass (unless disabled):
/// - account: parse `last_seen` and `member_since`
/// - device_data: parse every `timestamp*` column and move them first
/// - devices: move `sn` first
/// - calibration_models: pivot features/params into long format
///
/// The kind step sees the indexed names, so a one-element `params`
/// sequence is still `model_params_1` when the pivot reads it.
pub fn process(kind: Kind, response: Value, config: &FlattenConfig) -> Result<Table> {
    let records = normalize(response)?;
    debug!(%kind, records = records.len(), "processing response");

    let table = Flattener::new(config.naming.clone()).flatten(records);

    let mut table = match kind {
        Kind::Account => coerce_timestamps(table, &ACCOUNT_TIMESTAMP_COLUMNS)?,
        Kind::DeviceData => {
            let stamps = columns_with_prefix(&table, DEVICE_DATA_TIMESTAMP_PREFIX);
            let table = coerce_timestamps(table, &stamps)?;
            reorder_columns(table, &stamps)
        }
        Kind::Devices => reorder_columns(table, &["sn"]),
        Kind::CalibrationModels => {
            pivot_paired_columns(table, &PairedGroups::calibration(), &config.naming)?
        }
        Kind::Teams | Kind::Logs => table,
    };
    if config.strip_singleton_suffix {
        table = dedupe_suffix(table, &config.naming);
    }

    debug!(%kind, rows = table.num_rows(), columns = table.num_columns(), "table ready");
    Ok(table)
}
