//! Presentation: turns a normalized table into the rendered dashboard view.

pub mod chart;
pub mod page;
pub mod table;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::color::{score_to_style, StyleDescriptor};
use crate::normalize::{LongRow, NormalizedTable};
use crate::snapshot::latest_snapshot;

pub use chart::ChartOptions;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub ticker: String,
    pub score: f64,
    pub style: StyleDescriptor,
}

/// Everything one successful refresh cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub refreshed_at: DateTime<Utc>,
    pub latest_timestamp: Option<DateTime<Utc>>,
    pub snapshot: Vec<SnapshotRow>,
    pub series: Vec<LongRow>,
    pub row_count: usize,
    pub tickers: Vec<String>,
    #[serde(skip)]
    pub chart_svg: String,
    #[serde(skip)]
    pub table_html: String,
}

impl DashboardView {
    pub fn build(data: &NormalizedTable, opts: &ChartOptions, now: DateTime<Utc>) -> Self {
        let series = data.to_long_form();
        let snap = latest_snapshot(data);

        let timeline: Vec<DateTime<Utc>> = data.rows().iter().map(|r| r.timestamp).collect();
        let chart_svg = chart::render_facets(&series, &timeline, opts);
        let table_html = table::render_snapshot_table(&snap);

        let snapshot = snap
            .into_iter()
            .map(|(ticker, score)| SnapshotRow {
                style: score_to_style(score),
                ticker,
                score,
            })
            .collect();

        Self {
            refreshed_at: now,
            latest_timestamp: data.latest_timestamp(),
            snapshot,
            series,
            row_count: data.len(),
            tickers: data.columns().iter().cloned().collect(),
            chart_svg,
            table_html,
        }
    }
}
