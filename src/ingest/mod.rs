// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{RawRecord, RecordSource};
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_records_total", "Raw records fetched from sources.");
        describe_counter!("ingest_source_errors_total", "Source fetch/parse errors.");
        describe_histogram!("ingest_fetch_ms", "Source fetch time in milliseconds.");
    });
}

/// Parse a newline-delimited JSON body into raw records.
///
/// Blank lines are skipped. The first malformed line fails the whole body and
/// the error names its 1-based line number.
pub fn parse_jsonl(body: &str) -> Result<Vec<RawRecord>> {
    let mut out = Vec::new();
    for (i, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let rec: RawRecord = serde_json::from_str(line)
            .with_context(|| format!("parsing JSON line {}", i + 1))?;
        out.push(rec);
    }
    Ok(out)
}

/// Fetch once from the given source, recording telemetry. Errors propagate
/// to the caller unchanged (no retries).
pub async fn fetch_once(source: &dyn RecordSource) -> Result<Vec<RawRecord>> {
    ensure_metrics_described();

    let t0 = std::time::Instant::now();
    let res = source.fetch_records().await;
    histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    match res {
        Ok(records) => {
            counter!("ingest_records_total").increment(records.len() as u64);
            tracing::debug!(source = source.name(), records = records.len(), "fetched records");
            Ok(records)
        }
        Err(e) => {
            counter!("ingest_source_errors_total").increment(1);
            Err(e.context(format!("fetching from {}", source.name())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_jsonl_skips_blank_lines() {
        let body = r#"
{"timestamp":"2024-01-01T00:00:00Z","scores":{"AAA":0.5}}

{"timestamp":"2024-01-02T00:00:00Z","scores":{"AAA":0.2,"BBB":-0.3}}
"#;
        let recs = parse_jsonl(body).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].scores.get("BBB"), Some(&Some(-0.3)));
    }

    #[test]
    fn parse_jsonl_keeps_null_scores_as_none() {
        let body = r#"{"timestamp":"2024-01-01T00:00:00Z","scores":{"AAA":null}}"#;
        let recs = parse_jsonl(body).unwrap();
        assert_eq!(recs[0].scores.get("AAA"), Some(&None));
    }

    #[test]
    fn parse_jsonl_reports_line_number() {
        let body = "{\"timestamp\":\"2024-01-01T00:00:00Z\",\"scores\":{}}\n{oops";
        let err = parse_jsonl(body).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"), "got: {err:#}");
    }
}
