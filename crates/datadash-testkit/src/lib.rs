// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use datadash_app::{
    AnalysisResult, Anomaly, CellValue, ChartKind, ChartPoint, ChartSpec, DataOverview, Dataset,
    KeyInsight, Row,
};
use std::fs;
use std::path::{Path, PathBuf};
use time::macros::{date, format_description};
use time::{Date, Duration};

pub const CATALOG_HEADERS: [&str; 8] = [
    "sku",
    "product_name",
    "category",
    "price",
    "stock",
    "supplier",
    "image_url",
    "last_restocked",
];

const CATEGORIES: [&str; 8] = [
    "Lighting",
    "Furniture",
    "Kitchen",
    "Outdoor",
    "Storage",
    "Textiles",
    "Office",
    "Decor",
];

const ADJECTIVES: [&str; 14] = [
    "Classic", "Compact", "Rustic", "Modern", "Nordic", "Vintage", "Sturdy", "Slim", "Cozy",
    "Deluxe", "Folding", "Woven", "Matte", "Brushed",
];

const NOUNS: [&str; 16] = [
    "Lamp", "Chair", "Kettle", "Shelf", "Basket", "Rug", "Desk", "Planter", "Stool", "Mirror",
    "Pan", "Throw", "Bench", "Clock", "Crate", "Vase",
];

const SUPPLIERS: [&str; 8] = [
    "Northwind Supply",
    "Harbor Goods",
    "Summit Wholesale",
    "Greenleaf Trading",
    "Apex Distribution",
    "Heritage Imports",
    "Lakeside Makers",
    "Canyon Crafts",
];

const REFERENCE_DAY: Date = date!(2026 - 01 - 01);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    /// True roughly `percent` times out of a hundred.
    fn chance(&mut self, percent: usize) -> bool {
        self.int_n(100) < percent
    }
}

/// One generated catalog line. Optional fields come out as missing cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub stock: Option<i64>,
    pub supplier: String,
    pub image_url: Option<String>,
    pub last_restocked: Option<Date>,
}

impl Product {
    pub fn to_row(&self) -> Row {
        let restocked = self.last_restocked.and_then(|day| {
            day.format(format_description!("[year]-[month]-[day]"))
                .ok()
        });
        Row::from_pairs([
            ("sku", CellValue::from(self.sku.as_str())),
            ("product_name", CellValue::from(self.name.as_str())),
            ("category", CellValue::from(self.category.as_str())),
            ("price", CellValue::from(self.price_cents as f64 / 100.0)),
            ("stock", CellValue::from(self.stock)),
            ("supplier", CellValue::from(self.supplier.as_str())),
            ("image_url", CellValue::from(self.image_url.clone())),
            ("last_restocked", CellValue::from(restocked)),
        ])
    }
}

/// Seeded product-catalog generator. Equal seeds give equal catalogs.
#[derive(Debug, Clone)]
pub struct CatalogFaker {
    rng: DeterministicRng,
    seed: u64,
    next_sku: u64,
}

impl CatalogFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
            next_sku: 1000,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn product(&mut self) -> Product {
        self.next_sku += 1 + self.rng.int_n(7) as u64;
        let category = self.pick(&CATEGORIES);
        let name = format!("{} {}", self.pick(&ADJECTIVES), self.pick(&NOUNS));
        let sku = format!(
            "{}-{:05}",
            category[..3].to_ascii_uppercase(),
            self.next_sku
        );

        let stock = if self.rng.chance(8) {
            None
        } else if self.rng.chance(12) {
            Some(0)
        } else {
            Some(self.int_range(1, 60))
        };
        let image_url = (!self.rng.chance(20)).then(|| {
            format!(
                "https://images.example.com/catalog/{}.jpg",
                sku.to_ascii_lowercase()
            )
        });
        let last_restocked = (!self.rng.chance(10))
            .then(|| REFERENCE_DAY - Duration::days(self.int_range(0, 364)));

        Product {
            sku,
            name,
            category: category.to_owned(),
            price_cents: self.int_range(299, 49_999),
            stock,
            supplier: self.pick(&SUPPLIERS).to_owned(),
            image_url,
            last_restocked,
        }
    }

    pub fn catalog(&mut self, count: usize) -> Dataset {
        let rows = (0..count).map(|_| self.product().to_row()).collect();
        Dataset::new("catalog.csv", catalog_headers(), rows)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn catalog_headers() -> Vec<String> {
    CATALOG_HEADERS.iter().map(|header| (*header).to_owned()).collect()
}

/// Three rows where the middle one has no stock value.
pub fn stock_rows() -> Dataset {
    let rows = vec![
        Row::from_pairs([("name", CellValue::from("A")), ("stock", CellValue::from(5_i64))]),
        Row::from_pairs([("name", CellValue::from("B")), ("stock", CellValue::Missing)]),
        Row::from_pairs([("name", CellValue::from("C")), ("stock", CellValue::from(2_i64))]),
    ];
    Dataset::new("stock.csv", vec!["name".to_owned(), "stock".to_owned()], rows)
}

pub fn sample_analysis() -> AnalysisResult {
    AnalysisResult {
        data_overview: DataOverview {
            description: "Product catalog with pricing and stock levels.".to_owned(),
            quality_issues: vec!["Some rows have no stock count.".to_owned()],
        },
        key_insights: vec![KeyInsight {
            insight: "Kitchen items carry the highest prices.".to_owned(),
            supporting_data: "Median kitchen price is $212.40.".to_owned(),
        }],
        potential_anomalies: vec![Anomaly {
            anomaly: "Zero stock on popular items".to_owned(),
            details: "Four lighting products are out of stock.".to_owned(),
        }],
        actionable_recommendations: vec!["Reorder out-of-stock lighting.".to_owned()],
        suggested_agent_tasks: Some(vec!["Draft a purchase order for lighting.".to_owned()]),
        suggested_visualizations: vec![ChartSpec {
            title: "Products per category".to_owned(),
            kind: ChartKind::Bar,
            data: vec![
                ChartPoint {
                    label: "Lighting".to_owned(),
                    value: 12.0,
                },
                ChartPoint {
                    label: "Kitchen".to_owned(),
                    value: 7.0,
                },
            ],
        }],
    }
}

/// Writes `dataset` as CSV with a header row. Missing cells become empty
/// fields.
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create csv file {}", path.display()))?;
    writer
        .write_record(&dataset.headers)
        .context("write csv header")?;
    for row in &dataset.rows {
        writer
            .write_record(
                dataset
                    .headers
                    .iter()
                    .map(|header| row.get(header).display_text().into_owned()),
            )
            .context("write csv row")?;
    }
    writer.flush().context("flush csv file")?;
    Ok(())
}

/// Keep the returned `TempDir` alive for as long as the path is used.
pub fn temp_file_path(file_name: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join(file_name);
    Ok((dir, path))
}

pub fn temp_csv(dataset: &Dataset) -> Result<(tempfile::TempDir, PathBuf)> {
    let (dir, path) = temp_file_path(&dataset.file_name)?;
    write_csv(dataset, &path)?;
    Ok((dir, path))
}

pub fn temp_text_file(file_name: &str, contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let (dir, path) = temp_file_path(file_name)?;
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}
