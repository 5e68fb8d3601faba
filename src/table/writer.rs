use crate::table::types::Table;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::Write;

/// Output encodings for a finished table
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Header line followed by one comma-separated line per row
    Csv,
    /// One JSON object per row, keys in column order
    Ndjson,
}

/// Writes tables to an output stream
pub struct TableWriter<W: Write> {
    writer: W,
}

impl<W: Write> TableWriter<W> {
    pub fn new(writer: W) -> Self {
        TableWriter { writer }
    }

    pub fn write_table(&mut self, table: &Table, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Csv => self.write_csv(table),
            OutputFormat::Ndjson => self.write_ndjson(table),
        }
    }

    /// Write a header and one record per row. Nulls are empty fields.
    pub fn write_csv(&mut self, table: &Table) -> Result<()> {
        if table.num_columns() == 0 {
            return Ok(());
        }

        let mut csv = csv::Writer::from_writer(&mut self.writer);
        csv.write_record(table.column_names())
            .context("Failed to write CSV header")?;

        for row in 0..table.num_rows() {
            let record: Vec<String> = table
                .columns()
                .iter()
                .map(|c| c.cells[row].render().unwrap_or_default())
                .collect();
            csv.write_record(&record)
                .context("Failed to write CSV record")?;
        }

        csv.flush().context("Failed to flush CSV writer")
    }

    /// Write each row as a JSON object on its own line.
    pub fn write_ndjson(&mut self, table: &Table) -> Result<()> {
        for row in 0..table.num_rows() {
            let mut data = Map::new();
            for column in table.columns() {
                let value = serde_json::to_value(&column.cells[row])
                    .context("Failed to serialize cell")?;
                data.insert(column.name.clone(), value);
            }

            let json = serde_json::to_string(&Value::Object(data))
                .context("Failed to serialize row")?;
            writeln!(self.writer, "{}", json)
                .context("Failed to write row")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
