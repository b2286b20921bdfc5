// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use csv::{ReaderBuilder, StringRecord};
use datadash_app::{CellValue, Dataset, Row};
use std::io::Read;
use tracing::info;

use crate::{DecodeError, FileKind, normalize_headers};

/// First record is the header row. Blank lines are skipped and every data
/// record must have exactly as many fields as the header.
pub fn decode_csv<R: Read>(file_name: &str, reader: R) -> Result<Dataset, DecodeError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let raw_headers = csv_reader.headers().map_err(csv_error)?.clone();
    let headers = normalize_headers(raw_headers.iter().map(str::to_owned));

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while csv_reader.read_record(&mut record).map_err(csv_error)? {
        if record.len() != headers.len() {
            return Err(DecodeError::Csv {
                row: record.position().map_or(0, |position| position.line()),
                message: format!(
                    "expected {} fields but parsed {}",
                    headers.len(),
                    record.len()
                ),
            });
        }
        rows.push(Row::from_pairs(
            headers
                .iter()
                .map(String::as_str)
                .zip(record.iter().map(CellValue::infer)),
        ));
    }

    if headers.is_empty() || rows.is_empty() {
        return Err(DecodeError::EmptyFile(FileKind::Csv));
    }

    info!(file = file_name, rows = rows.len(), "decoded csv");
    Ok(Dataset::new(file_name, headers, rows))
}

fn csv_error(err: csv::Error) -> DecodeError {
    DecodeError::Csv {
        row: err.position().map_or(0, |position| position.line()),
        message: err.to_string(),
    }
}
