//! quantaq-table: Turn saved API responses into flat tables
//!
//! Usage:
//!   # Read a device-data response from a file, write CSV to stdout
//!   quantaq-table --kind device-data data.json
//!
//!   # Read pages from stdin, one JSON document per line
//!   cat pages.jsonl | quantaq-table --kind devices --ndjson
//!
//!   # Keep singleton indices and emit one JSON object per row
//!   quantaq-table --kind teams --keep-singleton-suffix --format ndjson teams.json

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use quantaq_table::{process, read_ndjson, FlattenConfig, Kind, Naming, OutputFormat, TableWriter};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "quantaq-table")]
#[command(about = "Flatten nested API responses into tables", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Response kind, selects the post-processing applied
    #[arg(long, value_enum)]
    kind: Kind,

    /// Process newline-delimited JSON (one record or page per line)
    #[arg(long)]
    ndjson: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Separator for derived column names (default: "_")
    #[arg(long)]
    separator: Option<String>,

    /// Keep trailing "_1" indices from single-element sequences
    #[arg(long)]
    keep_singleton_suffix: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build config
    let mut config = FlattenConfig::default();
    if let Some(sep) = args.separator {
        config.naming = Naming::new(sep)?;
    }
    config.strip_singleton_suffix = !args.keep_singleton_suffix;

    let reader = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?,
        )) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let response = if args.ndjson {
        read_ndjson(BufReader::new(reader))?
    } else {
        read_document(reader)?
    };

    let table = process(args.kind, response, &config)?;
    info!(
        kind = %args.kind,
        rows = table.num_rows(),
        columns = table.num_columns(),
        "table built"
    );

    let stdout = std::io::stdout();
    let mut writer = TableWriter::new(stdout.lock());
    writer.write_table(&table, args.format)?;
    writer.flush()?;

    Ok(())
}

/// Read one JSON document using SIMD-accelerated parsing
fn read_document(reader: Box<dyn Read>) -> Result<Value> {
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    // Deserialize straight into serde_json::Value so key order survives
    simd_json::serde::from_slice::<Value>(&mut content).context("Failed to parse JSON")
}
