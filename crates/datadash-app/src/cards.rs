// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Product-card view of a row. Which column plays which role is guessed from
//! header names; the guess sits behind [`CardFieldStrategy`] so a caller with
//! a known schema can pin it down instead.

use crate::{CellValue, Row};

pub const UNNAMED_PRODUCT: &str = "Unnamed Product";
pub const LOW_STOCK_LIMIT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRole {
    Image,
    Name,
    Price,
    Category,
    Stock,
}

impl CardRole {
    pub const ALL: [Self; 5] = [
        Self::Image,
        Self::Name,
        Self::Price,
        Self::Category,
        Self::Stock,
    ];

    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Image => &["image", "img", "picture", "url"],
            Self::Name => &["name", "title", "product"],
            Self::Price => &["price", "cost", "amount"],
            Self::Category => &["category", "type"],
            Self::Stock => &["stock", "inventory", "quantity"],
        }
    }
}

pub trait CardFieldStrategy {
    fn find_field<'h>(&self, headers: &'h [String], role: CardRole) -> Option<&'h str>;
}

/// First header whose normalized name contains one of the role keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCardFields;

impl CardFieldStrategy for KeywordCardFields {
    fn find_field<'h>(&self, headers: &'h [String], role: CardRole) -> Option<&'h str> {
        headers
            .iter()
            .find(|header| {
                let normalized = header.to_lowercase().replace('_', " ");
                role.keywords()
                    .iter()
                    .any(|keyword| normalized.contains(keyword))
            })
            .map(String::as_str)
    }
}

/// Fixed column names per role, for schemas the keywords guess wrong.
#[derive(Debug, Clone, Default)]
pub struct ExplicitCardFields {
    pub image: Option<String>,
    pub name: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub stock: Option<String>,
}

impl CardFieldStrategy for ExplicitCardFields {
    fn find_field<'h>(&self, headers: &'h [String], role: CardRole) -> Option<&'h str> {
        let wanted = match role {
            CardRole::Image => self.image.as_deref(),
            CardRole::Name => self.name.as_deref(),
            CardRole::Price => self.price.as_deref(),
            CardRole::Category => self.category.as_deref(),
            CardRole::Stock => self.stock.as_deref(),
        }?;
        headers
            .iter()
            .find(|header| header.as_str() == wanted)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StockBadge {
    InStock(f64),
    Low(f64),
    OutOfStock,
}

impl StockBadge {
    pub fn from_level(level: f64) -> Self {
        if level > LOW_STOCK_LIMIT {
            Self::InStock(level)
        } else if level > 0.0 {
            Self::Low(level)
        } else {
            Self::OutOfStock
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::InStock(level) | Self::Low(level) => {
                format!("{} in stock", crate::format_number(level))
            }
            Self::OutOfStock => "Out of stock".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
    pub name: String,
    pub price: Option<String>,
    pub category: Option<String>,
    pub stock: Option<StockBadge>,
    pub image_url: Option<String>,
}

impl ProductCard {
    pub fn from_row(row: &Row, headers: &[String], strategy: &dyn CardFieldStrategy) -> Self {
        let cell = |role| {
            strategy
                .find_field(headers, role)
                .map(|column| row.get(column))
                .filter(|value| !value.is_missing())
        };

        let name = cell(CardRole::Name)
            .map(|value| value.display_text().into_owned())
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| UNNAMED_PRODUCT.to_owned());

        let price = cell(CardRole::Price)
            .and_then(numeric)
            .map(|value| format!("${value:.2}"));

        let category = cell(CardRole::Category).map(|value| value.display_text().into_owned());

        let stock = cell(CardRole::Stock)
            .and_then(numeric)
            .map(StockBadge::from_level);

        let image_url = cell(CardRole::Image)
            .map(|value| value.display_text().into_owned())
            .filter(|url| url.starts_with("http") || url.starts_with("data:"));

        Self {
            name,
            price,
            category,
            stock,
            image_url,
        }
    }
}

fn numeric(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(number) => Some(number.value()),
        CellValue::Text(text) => text
            .trim()
            .trim_start_matches('$')
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite()),
        CellValue::Missing => None,
    }
}
