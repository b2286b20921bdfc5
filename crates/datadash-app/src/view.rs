// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Filter, sort and paginate over a borrowed [`Dataset`].
//!
//! Every function here is total: empty inputs, unknown sort columns and
//! out-of-range pages all produce a well-formed (possibly empty) result.

use std::cmp::Ordering;

use crate::{CellValue, Dataset, Row, SortDirection, SortSpec, ViewMode};

pub const DEFAULT_TABLE_PAGE_SIZE: usize = 15;
pub const DEFAULT_GRID_PAGE_SIZE: usize = 12;

/// Rows where at least one present value contains `query`, ignoring case.
/// An empty query keeps every row in input order.
pub fn apply_filter<'a>(rows: &'a [Row], query: &str) -> Vec<&'a Row> {
    if query.is_empty() {
        return rows.iter().collect();
    }

    let needle = query.to_lowercase();
    rows.iter()
        .filter(|row| {
            row.values()
                .any(|value| value.display_text().to_lowercase().contains(&needle))
        })
        .collect()
}

/// Stable reorder by `spec.column`. Missing values always trail, whichever
/// way the direction points.
pub fn apply_sort<'a>(mut rows: Vec<&'a Row>, spec: Option<&SortSpec>) -> Vec<&'a Row> {
    let Some(spec) = spec else {
        return rows;
    };

    rows.sort_by(|left, right| {
        compare_cells(
            left.get(&spec.column),
            right.get(&spec.column),
            spec.direction,
        )
    });
    rows
}

/// Missing sorts last in both directions. Two numbers compare numerically,
/// two texts lexicographically. A number against text puts the number first
/// so the ordering stays total for mixed columns.
pub fn compare_cells(left: &CellValue, right: &CellValue, direction: SortDirection) -> Ordering {
    let present = match (left, right) {
        (CellValue::Missing, CellValue::Missing) => return Ordering::Equal,
        (CellValue::Missing, _) => return Ordering::Greater,
        (_, CellValue::Missing) => return Ordering::Less,
        (CellValue::Number(a), CellValue::Number(b)) => a.value().total_cmp(&b.value()),
        (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
        (CellValue::Number(_), CellValue::Text(_)) => Ordering::Less,
        (CellValue::Text(_), CellValue::Number(_)) => Ordering::Greater,
    };

    match direction {
        SortDirection::Ascending => present,
        SortDirection::Descending => present.reverse(),
    }
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// The 1-based page `page` of `rows`. Pages past the end are empty.
pub fn paginate<T>(rows: &[T], page_size: usize, page: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size).min(rows.len());
    let end = start.saturating_add(page_size).min(rows.len());
    &rows[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizes {
    pub table: usize,
    pub grid: usize,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE_PAGE_SIZE,
            grid: DEFAULT_GRID_PAGE_SIZE,
        }
    }
}

impl PageSizes {
    pub const fn for_mode(self, mode: ViewMode) -> usize {
        match mode {
            ViewMode::Table => self.table,
            ViewMode::Grid => self.grid,
        }
    }
}

/// One visible page plus the numbers the pager needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection<'a> {
    pub rows: Vec<&'a Row>,
    pub matching_rows: usize,
    pub total_rows: usize,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
}

impl Projection<'_> {
    /// 1-based index of the first row on this page, 0 when the page is empty.
    pub fn first_row_number(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            (self.page - 1) * self.page_size + 1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    filter: String,
    sort: Option<SortSpec>,
    mode: ViewMode,
    page: usize,
    page_sizes: PageSizes,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(PageSizes::default(), ViewMode::Table)
    }
}

impl ViewState {
    pub fn new(page_sizes: PageSizes, mode: ViewMode) -> Self {
        Self {
            filter: String::new(),
            sort: None,
            mode,
            page: 1,
            page_sizes: PageSizes {
                table: page_sizes.table.max(1),
                grid: page_sizes.grid.max(1),
            },
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_sizes(&self) -> PageSizes {
        self.page_sizes
    }

    pub fn page_size(&self) -> usize {
        self.page_sizes.for_mode(self.mode)
    }

    /// Ascending on a new column; flips to descending only when the same
    /// column is already ascending.
    pub fn request_sort(&mut self, column: &str) {
        let direction = match &self.sort {
            Some(current)
                if current.column == column && current.direction == SortDirection::Ascending =>
            {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        self.sort = Some(SortSpec {
            column: column.to_owned(),
            direction,
        });
        self.page = 1;
    }

    pub fn request_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
        self.page = 1;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            self.mode = mode;
            self.page = 1;
        }
    }

    /// Moves to `page` when it lies within the current page range.
    pub fn go_to_page(&mut self, page: usize, dataset: &Dataset) -> bool {
        let count = self.page_count(dataset);
        if page == 0 || page > count {
            return false;
        }
        self.page = page;
        true
    }

    pub fn next_page(&mut self, dataset: &Dataset) -> bool {
        self.go_to_page(self.page + 1, dataset)
    }

    pub fn prev_page(&mut self, dataset: &Dataset) -> bool {
        self.page > 1 && self.go_to_page(self.page - 1, dataset)
    }

    /// Clears filter, sort and page; page sizes and view mode survive.
    pub fn reset(&mut self) {
        self.filter.clear();
        self.sort = None;
        self.page = 1;
    }

    pub fn page_count(&self, dataset: &Dataset) -> usize {
        page_count(
            apply_filter(&dataset.rows, &self.filter).len(),
            self.page_size(),
        )
    }

    /// Full filtered and sorted sequence, before pagination.
    pub fn ordered_rows<'a>(&self, dataset: &'a Dataset) -> Vec<&'a Row> {
        let filtered = apply_filter(&dataset.rows, &self.filter);
        apply_sort(filtered, self.sort.as_ref())
    }

    pub fn project<'a>(&self, dataset: &'a Dataset) -> Projection<'a> {
        let ordered = self.ordered_rows(dataset);
        let page_size = self.page_size();
        let count = page_count(ordered.len(), page_size);
        let page = self.page.clamp(1, count);
        let rows = paginate(&ordered, page_size, page).to_vec();
        Projection {
            rows,
            matching_rows: ordered.len(),
            total_rows: dataset.rows.len(),
            page,
            page_count: count,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PageSizes, ViewState, apply_filter, apply_sort, compare_cells, page_count, paginate,
    };
    use crate::{CellValue, Dataset, Row, SortDirection, SortSpec, ViewMode};
    use std::cmp::Ordering;

    fn stock_rows() -> Vec<Row> {
        vec![
            Row::from_pairs([("name", CellValue::from("A")), ("stock", CellValue::from(5.0))]),
            Row::from_pairs([("name", CellValue::from("B")), ("stock", CellValue::Missing)]),
            Row::from_pairs([("name", CellValue::from("C")), ("stock", CellValue::from(2.0))]),
        ]
    }

    fn names(rows: &[&Row]) -> Vec<String> {
        rows.iter()
            .map(|row| row.get("name").display_text().into_owned())
            .collect()
    }

    fn numbered_dataset(count: usize) -> Dataset {
        let rows = (0..count)
            .map(|index| {
                Row::from_pairs([
                    ("id", CellValue::from(index as f64)),
                    ("label", CellValue::from(format!("row-{index}"))),
                ])
            })
            .collect();
        Dataset::new("numbers.csv", vec!["id".to_owned(), "label".to_owned()], rows)
    }

    #[test]
    fn empty_filter_is_identity() {
        let rows = stock_rows();
        let filtered = apply_filter(&rows, "");
        assert_eq!(names(&filtered), vec!["A", "B", "C"]);
    }

    #[test]
    fn filter_matches_case_insensitively_across_fields() {
        let rows = stock_rows();
        let filtered = apply_filter(&rows, "b");
        assert_eq!(names(&filtered), vec!["B"]);
    }

    #[test]
    fn filter_matches_stringified_numbers() {
        let rows = stock_rows();
        let filtered = apply_filter(&rows, "5");
        assert_eq!(names(&filtered), vec!["A"]);
    }

    #[test]
    fn missing_values_never_match_a_non_empty_query() {
        let rows = vec![Row::from_pairs([("note", CellValue::Missing)])];
        assert!(apply_filter(&rows, "null").is_empty());
        assert!(apply_filter(&rows, "undefined").is_empty());
    }

    #[test]
    fn every_filtered_row_contains_the_query() {
        let rows = vec![
            Row::from_pairs([("city", "Austin"), ("state", "TX")]),
            Row::from_pairs([("city", "Boston"), ("state", "MA")]),
            Row::from_pairs([("city", "Tucson"), ("state", "AZ")]),
        ];
        for query in ["ON", "a", "tx", "zz"] {
            for row in apply_filter(&rows, query) {
                assert!(row.values().any(|value| {
                    value
                        .display_text()
                        .to_lowercase()
                        .contains(&query.to_lowercase())
                }));
            }
        }
    }

    #[test]
    fn sort_by_stock_ascending_puts_missing_last() {
        let rows = stock_rows();
        let sorted = apply_sort(
            apply_filter(&rows, ""),
            Some(&SortSpec::ascending("stock")),
        );
        assert_eq!(names(&sorted), vec!["C", "A", "B"]);
    }

    #[test]
    fn sort_descending_still_puts_missing_last() {
        let rows = stock_rows();
        let sorted = apply_sort(
            apply_filter(&rows, ""),
            Some(&SortSpec::descending("stock")),
        );
        assert_eq!(names(&sorted), vec!["A", "C", "B"]);
    }

    #[test]
    fn rows_without_the_sort_column_trail() {
        let rows = vec![
            Row::from_pairs([("name", "no-price")]),
            Row::from_pairs([("name", "cheap"), ("price", "1")]),
            Row::from_pairs([("name", "dear"), ("price", "9")]),
        ];
        for spec in [SortSpec::ascending("price"), SortSpec::descending("price")] {
            let sorted = apply_sort(apply_filter(&rows, ""), Some(&spec));
            assert_eq!(names(&sorted).last().map(String::as_str), Some("no-price"));
        }
    }

    #[test]
    fn sorting_twice_with_the_same_spec_is_a_no_op() {
        let rows = vec![
            Row::from_pairs([("k", CellValue::from(3.0))]),
            Row::from_pairs([("k", CellValue::from("b"))]),
            Row::from_pairs([("k", CellValue::Missing)]),
            Row::from_pairs([("k", CellValue::from(1.0))]),
            Row::from_pairs([("k", CellValue::from("a"))]),
        ];
        let spec = SortSpec::descending("k");
        let once = apply_sort(apply_filter(&rows, ""), Some(&spec));
        let twice = apply_sort(once.clone(), Some(&spec));
        assert_eq!(once, twice);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let rows = vec![
            Row::from_pairs([("name", "first"), ("group", "x")]),
            Row::from_pairs([("name", "second"), ("group", "x")]),
            Row::from_pairs([("name", "third"), ("group", "a")]),
        ];
        let sorted = apply_sort(apply_filter(&rows, ""), Some(&SortSpec::ascending("group")));
        assert_eq!(names(&sorted), vec!["third", "first", "second"]);
    }

    #[test]
    fn numbers_compare_numerically_not_lexically() {
        assert_eq!(
            compare_cells(
                &CellValue::from(9.0),
                &CellValue::from(10.0),
                SortDirection::Ascending
            ),
            Ordering::Less
        );
        assert_eq!(
            compare_cells(
                &CellValue::from("9"),
                &CellValue::from("10"),
                SortDirection::Ascending
            ),
            Ordering::Greater
        );
    }

    #[test]
    fn no_sort_spec_is_identity() {
        let rows = stock_rows();
        let sorted = apply_sort(apply_filter(&rows, ""), None);
        assert_eq!(names(&sorted), vec!["A", "B", "C"]);
    }

    #[test]
    fn pagination_splits_five_rows_into_three_pages() {
        let rows: Vec<usize> = (0..5).collect();
        assert_eq!(page_count(rows.len(), 2), 3);
        assert_eq!(paginate(&rows, 2, 1), &[0, 1]);
        assert_eq!(paginate(&rows, 2, 2), &[2, 3]);
        assert_eq!(paginate(&rows, 2, 3), &[4]);
        assert!(paginate(&rows, 2, 4).is_empty());
    }

    #[test]
    fn pages_partition_rows_without_gaps_or_duplicates() {
        for len in 0..25 {
            let rows: Vec<usize> = (0..len).collect();
            for size in 1..7 {
                let pages = page_count(len, size);
                let joined: Vec<usize> = (1..=pages)
                    .flat_map(|page| paginate(&rows, size, page).iter().copied())
                    .collect();
                assert_eq!(joined, rows, "len={len} size={size}");
            }
        }
    }

    #[test]
    fn empty_input_has_one_page() {
        let rows: Vec<usize> = Vec::new();
        assert_eq!(page_count(0, 15), 1);
        assert!(paginate(&rows, 15, 1).is_empty());
    }

    #[test]
    fn request_sort_toggles_then_resets_on_new_column() {
        let mut view = ViewState::default();

        view.request_sort("price");
        assert_eq!(view.sort(), Some(&SortSpec::ascending("price")));

        view.request_sort("price");
        assert_eq!(view.sort(), Some(&SortSpec::descending("price")));

        view.request_sort("price");
        assert_eq!(view.sort(), Some(&SortSpec::ascending("price")));

        view.request_sort("price");
        view.request_sort("name");
        assert_eq!(view.sort(), Some(&SortSpec::ascending("name")));
    }

    #[test]
    fn filter_sort_and_mode_changes_reset_page() {
        let dataset = numbered_dataset(40);
        let mut view = ViewState::default();

        assert!(view.go_to_page(3, &dataset));
        view.request_filter("row");
        assert_eq!(view.page(), 1);

        assert!(view.go_to_page(2, &dataset));
        view.request_sort("id");
        assert_eq!(view.page(), 1);

        assert!(view.go_to_page(2, &dataset));
        view.set_view_mode(ViewMode::Grid);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn out_of_range_pages_are_rejected() {
        let dataset = numbered_dataset(20);
        let mut view = ViewState::default();

        assert!(!view.go_to_page(0, &dataset));
        assert!(!view.go_to_page(3, &dataset));
        assert!(view.next_page(&dataset));
        assert_eq!(view.page(), 2);
        assert!(!view.next_page(&dataset));
        assert!(view.prev_page(&dataset));
        assert!(!view.prev_page(&dataset));
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn page_count_follows_filtered_size() {
        let dataset = numbered_dataset(40);
        let mut view = ViewState::default();
        assert_eq!(view.page_count(&dataset), 3);

        view.request_filter("row-1");
        // row-1 and row-10 through row-19
        assert_eq!(view.page_count(&dataset), 1);
    }

    #[test]
    fn projection_pages_filtered_and_sorted_rows() {
        let dataset = numbered_dataset(5);
        let mut view = ViewState::new(PageSizes { table: 2, grid: 2 }, ViewMode::Table);
        view.request_sort("id");
        view.request_sort("id");
        assert!(view.go_to_page(3, &dataset));

        let projection = view.project(&dataset);
        assert_eq!(projection.page_count, 3);
        assert_eq!(projection.matching_rows, 5);
        assert_eq!(projection.first_row_number(), 5);
        assert_eq!(
            projection.rows[0].get("label"),
            &CellValue::from("row-0")
        );
    }

    #[test]
    fn projection_of_empty_dataset_is_a_single_empty_page() {
        let dataset = Dataset::default();
        let mut view = ViewState::default();
        view.request_filter("anything");
        view.request_sort("missing-column");

        let projection = view.project(&dataset);
        assert!(projection.rows.is_empty());
        assert_eq!(projection.page, 1);
        assert_eq!(projection.page_count, 1);
        assert_eq!(projection.first_row_number(), 0);
    }

    #[test]
    fn grid_mode_uses_grid_page_size() {
        let dataset = numbered_dataset(30);
        let mut view = ViewState::default();
        assert_eq!(view.page_count(&dataset), 2);
        view.set_view_mode(ViewMode::Grid);
        assert_eq!(view.page_size(), 12);
        assert_eq!(view.page_count(&dataset), 3);
    }
}
