//! CSV sample ingest.
//!
//! Turns a CSV file into a clean vector of finite samples:
//! - one column is selected by header name (first column by default)
//! - rows whose value is missing or not a finite number are skipped and
//!   reported as row errors
//! - no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: samples + which column they came from + row errors.
#[derive(Debug, Clone)]
pub struct IngestedSamples {
    pub values: Vec<f64>,
    pub column: String,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedSamples {
    pub fn rows_used(&self) -> usize {
        self.values.len()
    }
}

/// Load samples from a CSV file.
pub fn load_samples(path: &Path, column: Option<&str>) -> Result<IngestedSamples, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_samples(file, column)
}

/// Read samples from any CSV source with a header row.
pub fn read_samples<R: Read>(source: R, column: Option<&str>) -> Result<IngestedSamples, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let (idx, column) = resolve_column(&headers, column)?;

    let mut values = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (i, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = i + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_value(&record, idx, &column) {
            Ok(v) => values.push(v),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if values.is_empty() {
        return Err(AppError::new(
            2,
            format!("No valid samples found in column `{column}`."),
        ));
    }

    Ok(IngestedSamples {
        values,
        column,
        row_errors,
        rows_read,
    })
}

fn resolve_column(headers: &StringRecord, column: Option<&str>) -> Result<(usize, String), AppError> {
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect();

    match column {
        Some(name) => {
            let key = normalize_header_name(name);
            let idx = header_map
                .get(&key)
                .copied()
                .ok_or_else(|| AppError::new(2, format!("Missing column: `{name}`")))?;
            Ok((idx, key))
        }
        None => {
            let first = headers
                .get(0)
                .ok_or_else(|| AppError::new(2, "CSV has no columns."))?;
            Ok((0, normalize_header_name(first)))
        }
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn parse_value(record: &StringRecord, idx: usize, column: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing value for `{column}`."))?;
    let v = raw
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{raw}' for `{column}`."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite value '{raw}' for `{column}`."))
    }
}
