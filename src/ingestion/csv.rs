//! Delimited-text parsing into a raw [`DataSet`].

use std::path::Path;

use crate::error::{ExtractionError, ExtractionResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Parse decoded delimited text into a raw [`DataSet`].
///
/// Rules:
///
/// - The first record is the header row.
/// - Every record must have as many cells as the header.
/// - Cells are kept as trimmed text; blank cells become [`Value::Null`].
/// - Records whose cells are all blank are skipped (and logged); kept rows remember their line.
///
/// `origin` only labels errors.
pub fn parse_delimited(text: &str, delimiter: u8, origin: &Path) -> ExtractionResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    read_table(&mut rdr, origin)
}

/// Read a raw [`DataSet`] from an existing CSV reader configured with `has_headers(true)`.
pub fn read_table<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    origin: &Path,
) -> ExtractionResult<DataSet> {
    let csv_err = |source| ExtractionError::Csv {
        path: origin.to_path_buf(),
        source,
    };
    let headers = rdr.headers().map_err(csv_err)?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ExtractionError::Empty {
            path: origin.to_path_buf(),
            reason: "no header row".to_string(),
        });
    }

    let schema = Schema::new(
        headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8))
            .collect(),
    );

    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut lines: Vec<usize> = Vec::new();
    let mut blank_rows = 0usize;
    for result in rdr.records() {
        let record = result.map_err(csv_err)?;
        let row: Vec<Value> = record.iter().map(raw_value).collect();
        if row.iter().all(Value::is_null) {
            blank_rows += 1;
            continue;
        }
        let line = record
            .position()
            .map_or(rows.len() + blank_rows + 2, |p| p.line() as usize);
        lines.push(line);
        rows.push(row);
    }
    if blank_rows > 0 {
        tracing::debug!(blank_rows, path = %origin.display(), "skipped rows with no values");
    }

    if rows.is_empty() {
        return Err(ExtractionError::Empty {
            path: origin.to_path_buf(),
            reason: "header row present but no data rows".to_string(),
        });
    }

    Ok(DataSet::with_row_lines(schema, rows, lines))
}

fn raw_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::Utf8(trimmed.to_owned())
    }
}
