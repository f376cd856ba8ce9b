//! # Normalizer
//! Turns a batch of raw records into one chronological, sparse table:
//! one row per instant, one optional column per ticker.
//!
//! Pure in-memory transformation; knows nothing about sources or config.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::ingest::types::RawRecord;

/// Why a batch could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Record at `index` (input order) has a timestamp we cannot parse.
    MalformedRecord {
        index: usize,
        timestamp: String,
        reason: String,
    },
    /// Nothing to normalize; snapshot extraction is undefined on empty data.
    EmptyDataset,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MalformedRecord {
                index,
                timestamp,
                reason,
            } => write!(
                f,
                "malformed record #{index}: timestamp '{timestamp}' ({reason})"
            ),
            NormalizeError::EmptyDataset => write!(f, "empty dataset: no records to normalize"),
        }
    }
}

impl std::error::Error for NormalizeError {}

/// One row: instant + sparse ticker values. A missing key means "absent".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub timestamp: DateTime<Utc>,
    pub values: BTreeMap<String, f64>,
}

impl Row {
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.values.get(ticker).copied()
    }
}

/// Long-form triple used by the chart (one per present value).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRow {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub score: f64,
}

/// Rows sorted strictly ascending by timestamp; columns are the union of
/// tickers seen in the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTable {
    rows: Vec<Row>,
    columns: BTreeSet<String>,
}

impl NormalizedTable {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last_row(&self) -> Option<&Row> {
        self.rows.last()
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.rows.last().map(|r| r.timestamp)
    }

    /// Melt into `(timestamp, ticker, score)` triples, ordered by ticker then
    /// time. Absent cells produce no triple.
    pub fn to_long_form(&self) -> Vec<LongRow> {
        let mut out = Vec::new();
        for ticker in &self.columns {
            for row in &self.rows {
                if let Some(score) = row.get(ticker) {
                    out.push(LongRow {
                        timestamp: row.timestamp,
                        ticker: ticker.clone(),
                        score,
                    });
                }
            }
        }
        out
    }
}

/// Parse an ISO-8601-ish timestamp into a UTC instant.
///
/// Accepts RFC 3339 (with `T` or a space separator) and naive date-times or
/// bare dates, which are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // %#z takes `Z`, `+00`, `+0000` and `+00:00`
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f%#z",
        "%Y-%m-%d %H:%M:%S%.f%#z",
        "%Y-%m-%dT%H:%M%#z",
        "%Y-%m-%d %H:%M%#z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(d) => d
            .and_hms_opt(0, 0, 0)
            .map(|n| n.and_utc())
            .ok_or_else(|| "date out of range".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Build the normalized table from a batch of raw records.
///
/// Records sharing an instant merge into one row; a ticker present in more
/// than one of them keeps the value from the later record. Fails on the first
/// unparseable timestamp without producing a partial table.
pub fn normalize(records: &[RawRecord]) -> Result<NormalizedTable, NormalizeError> {
    if records.is_empty() {
        return Err(NormalizeError::EmptyDataset);
    }

    let mut by_time: BTreeMap<DateTime<Utc>, BTreeMap<String, f64>> = BTreeMap::new();
    let mut columns = BTreeSet::new();

    for (index, rec) in records.iter().enumerate() {
        let ts = parse_timestamp(&rec.timestamp).map_err(|reason| {
            NormalizeError::MalformedRecord {
                index,
                timestamp: rec.timestamp.clone(),
                reason,
            }
        })?;

        let row = by_time.entry(ts).or_default();
        for (ticker, score) in &rec.scores {
            columns.insert(ticker.clone());
            // null / NaN stay absent
            if let Some(v) = score.filter(|v| !v.is_nan()) {
                row.insert(ticker.clone(), v);
            }
        }
    }

    let rows = by_time
        .into_iter()
        .map(|(timestamp, values)| Row { timestamp, values })
        .collect();

    Ok(NormalizedTable { rows, columns })
}
