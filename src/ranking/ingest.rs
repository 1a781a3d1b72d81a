//! CSV course list parsing
//!
//! One course name per row, first column only, no header row. Blank lines
//! never reach the caller; blank cells do, so they can be counted.

use crate::error::{RankingError, Result};
use csv::{ReaderBuilder, Trim};
use std::io::Read;

/// Read the raw first cell of every non-empty CSV record
pub fn read_first_column<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(reader);

    let mut cells = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|err| RankingError::InvalidUpload {
            reason: format!("Malformed CSV: {err}"),
        })?;
        cells.push(record.get(0).unwrap_or_default().to_string());
    }

    Ok(cells)
}

/// Check an uploaded file name the way the upload form expects
pub fn validate_upload_name(file_name: Option<&str>) -> Result<()> {
    match file_name {
        None => Err(RankingError::InvalidUpload {
            reason: "No file provided".to_string(),
        }
        .into()),
        Some("") => Err(RankingError::InvalidUpload {
            reason: "No file selected".to_string(),
        }
        .into()),
        Some(name) if !name.ends_with(".csv") => Err(RankingError::InvalidUpload {
            reason: "File must be a CSV".to_string(),
        }
        .into()),
        Some(_) => Ok(()),
    }
}
