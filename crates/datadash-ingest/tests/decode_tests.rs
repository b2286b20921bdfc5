// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use datadash_app::{CellValue, ViewState, build_context};
use datadash_ingest::{DecodeError, DecodeOptions, FileKind, decode_file};
use datadash_testkit::{CatalogFaker, stock_rows, temp_csv, temp_file_path, temp_text_file};
use serde_json::{Value, json};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn decodes_generated_catalog_from_disk() -> Result<()> {
    let catalog = CatalogFaker::new(9).catalog(40);
    let (_dir, path) = temp_csv(&catalog)?;

    let decoded = decode_file(&path, DecodeOptions::default())?;
    assert_eq!(decoded.file_name, "catalog.csv");
    assert_eq!(decoded.headers, catalog.headers);
    assert_eq!(decoded.rows.len(), 40);
    for (original, read_back) in catalog.rows.iter().zip(&decoded.rows) {
        assert_eq!(original.get("sku"), read_back.get("sku"));
        assert_eq!(original.get("stock"), read_back.get("stock"));
    }
    Ok(())
}

#[test]
fn missing_cells_survive_the_trip_through_csv() -> Result<()> {
    let (_dir, path) = temp_csv(&stock_rows())?;
    let decoded = decode_file(&path, DecodeOptions::default())?;
    assert!(decoded.rows[1].get("stock").is_missing());
    assert_eq!(decoded.rows[2].get("stock"), &CellValue::number(2.0));
    Ok(())
}

#[test]
fn unsupported_extension_is_rejected_before_reading() -> Result<()> {
    let (_dir, path) = temp_text_file("notes.txt", "name\nA\n")?;
    let err = decode_file(&path, DecodeOptions::default()).expect_err("txt is not supported");
    assert!(matches!(err, DecodeError::UnsupportedExtension { .. }));
    assert_eq!(
        err.to_string(),
        "Unsupported file type. Please upload a CSV or Excel file."
    );
    Ok(())
}

#[test]
fn oversized_file_is_rejected() -> Result<()> {
    let (_dir, path) = temp_text_file("big.csv", "name,notes\nA,0123456789\n")?;
    let err = decode_file(&path, DecodeOptions { max_file_size: 8 })
        .expect_err("file is over the limit");
    assert!(matches!(err, DecodeError::TooLarge { limit: 8, .. }));
    Ok(())
}

#[test]
fn missing_file_reports_the_path() -> Result<()> {
    let (_dir, path) = temp_file_path("absent.csv")?;
    let err = decode_file(&path, DecodeOptions::default()).expect_err("file does not exist");
    assert!(matches!(err, DecodeError::Io { .. }));
    assert!(err.to_string().contains("absent.csv"));
    Ok(())
}

#[test]
fn empty_csv_uses_the_csv_message() -> Result<()> {
    let (_dir, path) = temp_text_file("empty.csv", "")?;
    let err = decode_file(&path, DecodeOptions::default()).expect_err("empty");
    assert!(matches!(err, DecodeError::EmptyFile(FileKind::Csv)));
    Ok(())
}

#[test]
fn corrupt_workbook_is_a_workbook_error() -> Result<()> {
    let (_dir, path) = temp_text_file("broken.xlsx", "this is not a zip archive")?;
    let err = decode_file(&path, DecodeOptions::default()).expect_err("not a workbook");
    assert!(matches!(err, DecodeError::Workbook(_)));
    Ok(())
}

#[test]
fn numeric_text_is_filtered_and_exported_as_written() -> Result<()> {
    let (_dir, path) = temp_text_file(
        "codes.csv",
        "name,price,code\nLamp,24.50,1e3\nChair,80,7\n",
    )?;
    let dataset = decode_file(&path, DecodeOptions::default())?;
    assert_eq!(dataset.rows[0].get("price").display_text(), "24.50");
    assert_eq!(dataset.rows[0].get("code").display_text(), "1e3");

    for query in ["24.50", "1e3"] {
        let mut view = ViewState::default();
        view.request_filter(query);
        let snapshot = build_context(&dataset, &view, None);
        assert_eq!(snapshot.data_snapshot.len(), 1, "query {query:?}");

        let json: Value = serde_json::from_str(&snapshot.to_pretty_json()?)?;
        assert_eq!(
            json["dataSnapshot"],
            json!([{"name": "Lamp", "price": "24.50", "code": "1e3"}])
        );
    }

    let mut view = ViewState::default();
    view.request_filter("chair");
    let json: Value =
        serde_json::from_str(&build_context(&dataset, &view, None).to_pretty_json()?)?;
    assert_eq!(
        json["dataSnapshot"],
        json!([{"name": "Chair", "price": 80, "code": 7}])
    );
    Ok(())
}

#[test]
fn decodes_the_first_sheet_of_a_real_workbook() -> Result<()> {
    let dataset = decode_file(&fixture("stock.xlsx"), DecodeOptions::default())?;
    assert_eq!(dataset.file_name, "stock.xlsx");
    assert_eq!(dataset.headers, vec!["name", "stock", "price"]);
    assert_eq!(dataset.rows.len(), 3);
    assert_eq!(dataset.rows[0].get("name"), &CellValue::from("Lamp"));
    assert_eq!(dataset.rows[0].get("stock").as_number(), Some(4.0));
    assert_eq!(dataset.rows[0].get("price").as_number(), Some(24.5));
    assert!(dataset.rows[1].get("stock").is_missing());
    assert_eq!(dataset.rows[2].get("stock").as_number(), Some(0.0));
    assert!(
        dataset
            .rows
            .iter()
            .all(|row| row.get("name").display_text() != "ignored")
    );
    Ok(())
}
