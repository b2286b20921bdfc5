// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use calamine::{Data, DataType, Range, Reader, open_workbook_auto};
use datadash_app::{CellValue, Dataset, Row};
use std::path::Path;
use tracing::info;

use crate::{DecodeError, FileKind, normalize_headers};

pub(crate) fn decode_workbook(file_name: &str, path: &Path) -> Result<Dataset, DecodeError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| DecodeError::Workbook(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DecodeError::Workbook("workbook has no worksheets".to_owned()))?
        .map_err(|err| DecodeError::Workbook(err.to_string()))?;

    let dataset = decode_range(file_name, &range)?;
    info!(file = file_name, rows = dataset.row_count(), "decoded workbook");
    Ok(dataset)
}

/// First row of the used range is the header row. Cells past the end of a
/// short row read as missing.
pub fn decode_range(file_name: &str, range: &Range<Data>) -> Result<Dataset, DecodeError> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(DecodeError::EmptyFile(FileKind::Spreadsheet));
    };
    let headers = normalize_headers(header_row.iter().map(header_text));

    let records: Vec<Row> = rows
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
        .map(|cells| {
            Row::from_pairs(headers.iter().enumerate().map(|(index, header)| {
                let value = cells.get(index).map_or(CellValue::Missing, cell_value);
                (header.as_str(), value)
            }))
        })
        .collect();

    if records.is_empty() {
        return Err(DecodeError::EmptyFile(FileKind::Spreadsheet));
    }
    Ok(Dataset::new(file_name, headers, records))
}

fn header_text(cell: &Data) -> String {
    cell.as_string().unwrap_or_else(|| cell.to_string())
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Missing,
        Data::Int(value) => CellValue::number(*value as f64),
        Data::Float(value) if value.is_finite() => CellValue::number(*value),
        Data::String(text) if text.trim().is_empty() => CellValue::Missing,
        Data::String(text) => CellValue::Text(text.clone()),
        other => CellValue::Text(other.to_string()),
    }
}
