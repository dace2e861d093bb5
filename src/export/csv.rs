//! CSV export.
//!
//! Writes a header row followed by one row per result:
//! `original,final,status,error`. Missing values are written as empty fields.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;

use crate::models::UrlResult;

const HEADER: [&str; 4] = ["original", "final", "status", "error"];

/// Writes `results` to the CSV file at `path`, replacing it if it exists.
///
/// Returns the number of result rows written.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_csv(path: &Path, results: &[UrlResult]) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_csv_to(file, results)
        .with_context(|| format!("Failed to write results to {}", path.display()))
}

/// Writes `results` as CSV to any writer.
pub fn write_csv_to<W: Write>(out: W, results: &[UrlResult]) -> Result<usize> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(HEADER)?;
    for result in results {
        let status = result.status.map(|s| s.to_string()).unwrap_or_default();
        writer.write_record([
            result.original.as_str(),
            result.final_url.as_deref().unwrap_or_default(),
            status.as_str(),
            result.error.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(results.len())
}
