//! Tabular export of option records.
//!
//! Records become a three-column frame (`Option`, `Gross`, `Settle Price`)
//! that can be written as CSV or Parquet, or serialized to JSON.

use std::fs;
use std::io::Write;
use std::path::Path;

use polars::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

use super::types::OptionRecord;

/// Column names of the record frame.
pub const RECORD_COLUMNS: [&str; 3] = ["Option", "Gross", "Settle Price"];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build a DataFrame from records, preserving their order.
pub fn records_to_dataframe(records: &[OptionRecord]) -> Result<DataFrame, ExportError> {
    let mut labels: Vec<&str> = Vec::with_capacity(records.len());
    let mut gross: Vec<i64> = Vec::with_capacity(records.len());
    let mut settle: Vec<f64> = Vec::with_capacity(records.len());

    for record in records {
        labels.push(&record.label);
        gross.push(record.gross_interest);
        settle.push(record.settle_price.to_f64().unwrap_or(f64::NAN));
    }

    let df = DataFrame::new(vec![
        Series::new(RECORD_COLUMNS[0].into(), labels).into(),
        Series::new(RECORD_COLUMNS[1].into(), gross).into(),
        Series::new(RECORD_COLUMNS[2].into(), settle).into(),
    ])?;

    Ok(df)
}

/// Write records as CSV with a header row to a file.
pub fn write_csv(records: &[OptionRecord], path: &Path) -> Result<(), ExportError> {
    create_parent(path)?;
    let file = fs::File::create(path)?;
    write_csv_to(records, file)
}

/// Write records as CSV with a header row to any writer.
pub fn write_csv_to<W: Write>(records: &[OptionRecord], writer: W) -> Result<(), ExportError> {
    let mut df = records_to_dataframe(records)?;
    CsvWriter::new(writer)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}

/// Write records as zstd-compressed Parquet.
pub fn write_parquet(records: &[OptionRecord], path: &Path) -> Result<(), ExportError> {
    let mut df = records_to_dataframe(records)?;
    create_parent(path)?;
    let file = fs::File::create(path)?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(Some(ZstdLevel::try_new(3)?)))
        .finish(&mut df)?;
    Ok(())
}

/// Serialize records as a pretty-printed JSON array.
pub fn to_json(records: &[OptionRecord]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn create_parent(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
