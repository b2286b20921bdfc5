// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Turns a CSV or spreadsheet file into a [`Dataset`].

mod delimited;
mod workbook;

use datadash_app::Dataset;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub use delimited::decode_csv;
pub use workbook::decode_range;

pub const MAX_FILE_SIZE: u64 = 50 << 20;

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    /// Chosen by extension alone, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if extension == "csv" {
            Some(Self::Csv)
        } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
            Some(Self::Spreadsheet)
        } else {
            None
        }
    }

    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Csv => "CSV file is empty or has no data rows.",
            Self::Spreadsheet => "Excel file needs a header row and at least one data row.",
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{}", .0.empty_message())]
    EmptyFile(FileKind),
    #[error("Unsupported file type. Please upload a CSV or Excel file.")]
    UnsupportedExtension { path: PathBuf },
    #[error("Error parsing CSV: row {row}: {message}")]
    Csv { row: u64, message: String },
    #[error("Error reading spreadsheet: {0}")]
    Workbook(String),
    #[error("file is {size} bytes, over the {limit}-byte limit; raise [data] max_file_size to load it")]
    TooLarge { size: u64, limit: u64 },
    #[error("Failed to read the file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub max_file_size: u64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

pub fn decode_file(path: &Path, options: DecodeOptions) -> Result<Dataset, DecodeError> {
    let kind = FileKind::from_path(path).ok_or_else(|| DecodeError::UnsupportedExtension {
        path: path.to_path_buf(),
    })?;

    let io_error = |source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = fs::metadata(path).map_err(io_error)?.len();
    if size > options.max_file_size {
        return Err(DecodeError::TooLarge {
            size,
            limit: options.max_file_size,
        });
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!(file = %file_name, size, ?kind, "decoding");

    match kind {
        FileKind::Csv => {
            let file = fs::File::open(path).map_err(io_error)?;
            decode_csv(&file_name, io::BufReader::new(file))
        }
        FileKind::Spreadsheet => workbook::decode_workbook(&file_name, path),
    }
}

/// Blank headers become `column_<n>` and repeats get a numeric suffix, so
/// every header is a distinct row key.
pub(crate) fn normalize_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut headers: Vec<String> = Vec::new();
    for (index, header) in raw.into_iter().enumerate() {
        let base = match header.trim() {
            "" => format!("column_{}", index + 1),
            trimmed => trimmed.to_owned(),
        };
        let mut candidate = base.clone();
        let mut suffix = 1;
        while headers.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        headers.push(candidate);
    }
    headers
}
