// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{AnalysisResult, Dataset, Row, SortSpec, ViewMode, ViewState};

/// Point-in-time export of the dashboard for an external agent. Built on
/// demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub schema: Vec<String>,
    pub view_settings: ViewSettings,
    pub data_snapshot: Vec<Row>,
    pub initial_analysis: Option<AnalysisResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    pub filter_query: String,
    pub sort_config: Option<SortSpec>,
    pub view_mode: ViewMode,
}

impl ContextSnapshot {
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize context snapshot")
    }
}

/// Snapshot of every row that passes the current filter, in sorted order.
/// Pagination does not apply.
pub fn build_context(
    dataset: &Dataset,
    view: &ViewState,
    analysis: Option<&AnalysisResult>,
) -> ContextSnapshot {
    ContextSnapshot {
        schema: dataset.headers.clone(),
        view_settings: ViewSettings {
            filter_query: view.filter().to_owned(),
            sort_config: view.sort().cloned(),
            view_mode: view.mode(),
        },
        data_snapshot: view.ordered_rows(dataset).into_iter().cloned().collect(),
        initial_analysis: analysis.cloned(),
    }
}
