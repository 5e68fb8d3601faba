use crate::error::{Error, Result};
use crate::table::types::{Cell, Column, Table};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// YYYY[-]MM[-]DD HH:MM:SS[.fraction]; 'T' is accepted in place of the space.
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})-?([0-9]{2})-?([0-9]{2})[ T]([0-9]{2}):([0-9]{2}):([0-9]{2})(?:\.([0-9]+))?$").unwrap()
});

/// Columns of account responses that hold timestamps.
pub const ACCOUNT_TIMESTAMP_COLUMNS: [&str; 2] = ["last_seen", "member_since"];

/// Name prefix of device-data timestamp columns.
pub const DEVICE_DATA_TIMESTAMP_PREFIX: &str = "timestamp";

/// Parse a timestamp in the API's fixed format.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let caps = TIMESTAMP_REGEX.captures(s)?;
    let field = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?;
    let nanos = caps.get(7).map(|m| fraction_nanos(m.as_str())).unwrap_or(0);
    let time = NaiveTime::from_hms_nano_opt(field(4)?, field(5)?, field(6)?, nanos)?;

    Some(date.and_time(time))
}

/// Fractional-second digits as nanoseconds; digits past the ninth are dropped.
fn fraction_nanos(digits: &str) -> u32 {
    let mut padded: String = digits.chars().take(9).collect();
    while padded.len() < 9 {
        padded.push('0');
    }
    padded.parse().unwrap_or(0)
}

/// Parse every non-null value of the named columns into a timestamp.
///
/// Columns that are not in the table are skipped. A value that does not parse
/// fails the whole call.
pub fn coerce_timestamps<S: AsRef<str>>(mut table: Table, columns: &[S]) -> Result<Table> {
    for name in columns {
        let name = name.as_ref();
        match table.column_mut(name) {
            Some(column) => coerce_column(column)?,
            None => debug!(column = name, "timestamp column not present, skipping"),
        }
    }
    Ok(table)
}

fn coerce_column(column: &mut Column) -> Result<()> {
    for (row, cell) in column.cells.iter_mut().enumerate() {
        let parsed = match cell {
            Cell::Null | Cell::Timestamp(_) => continue,
            Cell::String(s) => parse_timestamp(s),
            _ => None,
        };
        match parsed {
            Some(ts) => *cell = Cell::Timestamp(ts),
            None => {
                return Err(Error::ParseError {
                    column: column.name.clone(),
                    row,
                    value: cell.render().unwrap_or_default(),
                })
            }
        }
    }
    Ok(())
}

/// Names of the columns starting with `prefix`, in table order.
pub fn columns_with_prefix(table: &Table, prefix: &str) -> Vec<String> {
    table
        .column_names()
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .map(String::from)
        .collect()
}

/// Move the named columns that exist to the front, in the order given.
/// All other columns keep their relative order.
pub fn reorder_columns<S: AsRef<str>>(table: Table, leading: &[S]) -> Table {
    let rows = table.num_rows();
    let mut rest: Vec<Option<Column>> = table.into_columns().into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(rest.len());

    for name in leading {
        let name = name.as_ref();
        if let Some(slot) = rest
            .iter_mut()
            .find(|slot| matches!(slot, Some(column) if column.name == name))
        {
            ordered.extend(slot.take());
        }
    }
    ordered.extend(rest.into_iter().flatten());

    Table::from_columns(rows, ordered)
}
