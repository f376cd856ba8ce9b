//! Latest-values view of a normalized table.

use std::cmp::Ordering;

use crate::normalize::NormalizedTable;

/// `(ticker, score)` pairs from the most recent row, highest score first.
///
/// Absent and NaN values are dropped; equal scores are ordered by ticker
/// name ascending. An empty table gives an empty snapshot.
pub fn latest_snapshot(table: &NormalizedTable) -> Vec<(String, f64)> {
    let Some(row) = table.last_row() else {
        return Vec::new();
    };

    let mut out: Vec<(String, f64)> = row
        .values
        .iter()
        .filter(|(_, v)| !v.is_nan())
        .map(|(k, v)| (k.clone(), *v))
        .collect();

    out.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    out
}
