// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Plain-text renderings of session state. Every function returns a
//! `String` so the shell decides where it goes.

use datadash_app::{
    AnalysisResult, AppState, CardFieldStrategy, ChartKind, ChartSpec, ChatMessage, ChatRole,
    PendingKind, ProductCard, Projection, Session, SortSpec, StockBadge, TodoList, format_number,
};
use std::fmt::Write as _;

const MAX_CELL_WIDTH: usize = 24;
const BAR_WIDTH: usize = 30;
const GRID_COLUMNS: usize = 3;
const CARD_WIDTH: usize = 26;

pub fn status_line(app: &AppState, session: &Session) -> String {
    let mut line = format!("datadash [{}] {}", app.theme.as_str(), app.nav.label());

    if session.has_data() {
        let dataset = session.dataset();
        let _ = write!(
            line,
            " | {} ({} rows, {} columns)",
            dataset.file_name,
            dataset.row_count(),
            dataset.headers.len()
        );
    } else {
        line.push_str(" | no file loaded");
    }

    match session.pending() {
        Some(PendingKind::Analysis) => line.push_str(" | analyzing..."),
        Some(PendingKind::Chat) => line.push_str(" | waiting for reply..."),
        None => {}
    }
    if let Some(status) = &app.status_line {
        let _ = write!(line, " | {status}");
    }
    line
}

pub fn table(projection: &Projection<'_>, headers: &[String], sort: Option<&SortSpec>) -> String {
    if projection.rows.is_empty() {
        return format!("No matching rows.\n{}", pager(projection));
    }

    let titles: Vec<String> = headers
        .iter()
        .map(|header| match sort {
            Some(spec) if spec.column == *header => {
                format!("{} {}", header, spec.direction.arrow())
            }
            _ => header.clone(),
        })
        .collect();

    let cells: Vec<Vec<String>> = projection
        .rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|header| truncate(&row.get(header).display_text(), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = titles
        .iter()
        .enumerate()
        .map(|(index, title)| {
            cells
                .iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(title.chars().count().min(MAX_CELL_WIDTH)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, &titles, &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out.push_str(&pager(projection));
    out
}

pub fn grid(
    projection: &Projection<'_>,
    headers: &[String],
    strategy: &dyn CardFieldStrategy,
) -> String {
    if projection.rows.is_empty() {
        return format!("No matching products.\n{}", pager(projection));
    }

    let cards: Vec<Vec<String>> = projection
        .rows
        .iter()
        .map(|row| card_lines(&ProductCard::from_row(row, headers, strategy)))
        .collect();

    let mut out = String::new();
    for chunk in cards.chunks(GRID_COLUMNS) {
        let height = chunk.iter().map(Vec::len).max().unwrap_or(0);
        for line in 0..height {
            let parts: Vec<String> = chunk
                .iter()
                .map(|card| {
                    let text = card.get(line).map_or("", String::as_str);
                    format!("{text:<CARD_WIDTH$}")
                })
                .collect();
            out.push_str(parts.join("  ").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(&pager(projection));
    out
}

fn card_lines(card: &ProductCard) -> Vec<String> {
    let mut lines = vec![
        format!("+{}+", "-".repeat(CARD_WIDTH - 2)),
        boxed(&card.name),
    ];
    if let Some(category) = &card.category {
        lines.push(boxed(category));
    }
    lines.push(boxed(card.price.as_deref().unwrap_or("no price")));
    if let Some(stock) = card.stock {
        let marker = match stock {
            StockBadge::InStock(_) => "",
            StockBadge::Low(_) => " (low)",
            StockBadge::OutOfStock => " (!)",
        };
        lines.push(boxed(&format!("{}{marker}", stock.label())));
    }
    lines.push(boxed(if card.image_url.is_some() {
        "[image]"
    } else {
        "[no image]"
    }));
    lines.push(format!("+{}+", "-".repeat(CARD_WIDTH - 2)));
    lines
}

fn boxed(text: &str) -> String {
    let inner = CARD_WIDTH - 4;
    format!("| {:<inner$} |", truncate(text, inner))
}

fn pager(projection: &Projection<'_>) -> String {
    let first = projection.first_row_number();
    let last = if first == 0 {
        0
    } else {
        first + projection.rows.len() - 1
    };
    let mut line = format!(
        "Rows {first}-{last} of {} | Page {} of {}",
        projection.matching_rows, projection.page, projection.page_count
    );
    if projection.matching_rows != projection.total_rows {
        let _ = write!(line, " (filtered from {})", projection.total_rows);
    }
    line.push('\n');
    line
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", truncate(cell, width)))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_owned();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

pub fn analysis(result: &AnalysisResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Data Overview");
    let _ = writeln!(out, "  {}", result.data_overview.description);
    if !result.data_overview.quality_issues.is_empty() {
        let _ = writeln!(out, "  Data Quality Issues:");
        for issue in &result.data_overview.quality_issues {
            let _ = writeln!(out, "  - {issue}");
        }
    }

    if !result.key_insights.is_empty() {
        let _ = writeln!(out, "\nKey Insights & Trends");
        for item in &result.key_insights {
            let _ = writeln!(out, "  * {}\n    {}", item.insight, item.supporting_data);
        }
    }

    if !result.suggested_visualizations.is_empty() {
        let _ = writeln!(out, "\nVisualizations");
        for chart in &result.suggested_visualizations {
            let _ = writeln!(out, "  {}", chart.title);
            out.push_str(&visualization(chart));
        }
    }

    if !result.potential_anomalies.is_empty() {
        let _ = writeln!(out, "\nPotential Anomalies");
        for item in &result.potential_anomalies {
            let _ = writeln!(out, "  ! {}\n    {}", item.anomaly, item.details);
        }
    }

    if !result.actionable_recommendations.is_empty() {
        let _ = writeln!(out, "\nActionable Recommendations");
        for recommendation in &result.actionable_recommendations {
            let _ = writeln!(out, "  - {recommendation}");
        }
    }

    if let Some(tasks) = &result.suggested_agent_tasks
        && !tasks.is_empty()
    {
        let _ = writeln!(out, "\nSuggested Agent Tasks (add with `todo add <text>`)");
        for task in tasks {
            let _ = writeln!(out, "  - {task}");
        }
    }
    out
}

pub fn visualization(chart: &ChartSpec) -> String {
    match chart.kind {
        ChartKind::Bar if !chart.data.is_empty() => bar_chart(chart),
        ChartKind::Pie if !chart.data.is_empty() => {
            let mut out = String::from("    Pie Chart Data:\n");
            for point in &chart.data {
                let _ = writeln!(out, "    - {}: {}", point.label, format_number(point.value));
            }
            out
        }
        _ => format!("    Unsupported chart type: '{}'.\n", chart.kind.as_str()),
    }
}

fn bar_chart(chart: &ChartSpec) -> String {
    let max = chart
        .data
        .iter()
        .map(|point| point.value)
        .fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return "    Not enough data to display chart.\n".to_owned();
    }

    let label_width = chart
        .data
        .iter()
        .map(|point| point.label.chars().count().min(MAX_CELL_WIDTH))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for point in &chart.data {
        let filled = ((point.value.max(0.0) / max) * BAR_WIDTH as f64).round() as usize;
        let _ = writeln!(
            out,
            "    {:>label_width$} | {} {}",
            truncate(&point.label, MAX_CELL_WIDTH),
            "#".repeat(filled),
            format_number(point.value)
        );
    }
    out
}

pub fn transcript(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        let speaker = match message.role {
            ChatRole::User => "you",
            ChatRole::Model => "ai",
        };
        let _ = writeln!(out, "{speaker}> {}", message.text);
    }
    out
}

pub fn todos(list: &TodoList) -> String {
    if list.is_empty() {
        return "No action items yet. Add one with `todo add <text>`.\n".to_owned();
    }
    let mut out = format!("Action items ({} open)\n", list.open_count());
    for item in list.items() {
        let mark = if item.completed { 'x' } else { ' ' };
        let _ = writeln!(out, "  [{mark}] {}. {}", item.id, item.text);
    }
    out
}
