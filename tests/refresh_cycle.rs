// tests/refresh_cycle.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sentiment_dashboard::{
    audit::{AuditSink, MemoryAuditSink},
    ingest::providers::JsonlProvider,
    refresh::{current_view, empty_view, run_cycle, spawn_refresh_loop, RefreshCfg},
    render::ChartOptions,
    RawRecord, RecordSource,
};

const FIXTURE: &str = r#"{"timestamp":"2024-01-01T00:00:00Z","scores":{"AAA":0.5}}
{"timestamp":"2024-01-02T00:00:00Z","scores":{"AAA":0.2,"BBB":-0.3}}
"#;

struct FailingSource;

#[async_trait::async_trait]
impl RecordSource for FailingSource {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        anyhow::bail!("upstream unavailable")
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Fails its first fetch, serves the fixture afterwards.
#[derive(Default)]
struct FlakySource {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl RecordSource for FlakySource {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            anyhow::bail!("upstream warming up");
        }
        JsonlProvider::from_fixture(FIXTURE).fetch_records().await
    }
    fn name(&self) -> &'static str {
        "flaky"
    }
}

#[tokio::test]
async fn successful_cycle_publishes_view_and_logs_latest_time() {
    let state = empty_view();
    let mem = Arc::new(MemoryAuditSink::new());
    let sink: Arc<dyn AuditSink> = mem.clone();
    let source = JsonlProvider::from_fixture(FIXTURE);

    let report = run_cycle(&state, &source, &sink, &ChartOptions::default())
        .await
        .expect("cycle ok");
    assert_eq!(report.rows, 2);
    assert_eq!(report.tickers, 2);
    report.audit.await.expect("audit task");

    let view = current_view(&state).expect("view published");
    let names: Vec<&str> = view.snapshot.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(names, ["AAA", "BBB"]);
    assert!(view.chart_svg.contains(">BBB</text>"));
    assert!(view.table_html.contains("<td>AAA</td><td>0.200</td>"));

    let events = mem.recorded();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, "dashboard_refresh");
    assert_eq!(events[0].timestamp, "2024-01-02T00:00:00Z");
}

#[tokio::test]
async fn failed_fetch_keeps_previous_view_and_skips_audit() {
    let state = empty_view();
    let mem = Arc::new(MemoryAuditSink::new());
    let sink: Arc<dyn AuditSink> = mem.clone();

    let ok = run_cycle(&state, &JsonlProvider::from_fixture(FIXTURE), &sink, &ChartOptions::default())
        .await
        .unwrap();
    ok.audit.await.unwrap();
    let before = current_view(&state).unwrap().refreshed_at;

    let err = run_cycle(&state, &FailingSource, &sink, &ChartOptions::default())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("upstream unavailable"));

    assert_eq!(current_view(&state).unwrap().refreshed_at, before);
    assert_eq!(mem.recorded().len(), 1);
}

#[tokio::test]
async fn malformed_batch_aborts_without_partial_render() {
    let state = empty_view();
    let sink: Arc<dyn AuditSink> = Arc::new(MemoryAuditSink::new());
    let bad = JsonlProvider::from_fixture(
        r#"{"timestamp":"2024-01-01T00:00:00Z","scores":{"AAA":0.5}}
{"timestamp":"not-a-date","scores":{"AAA":0.1}}"#,
    );

    let err = run_cycle(&state, &bad, &sink, &ChartOptions::default())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("malformed record #1"), "{err:#}");
    assert!(current_view(&state).is_none());
}

#[tokio::test]
async fn empty_body_is_an_error() {
    let state = empty_view();
    let sink: Arc<dyn AuditSink> = Arc::new(MemoryAuditSink::new());
    let err = run_cycle(&state, &JsonlProvider::from_fixture("\n\n"), &sink, &ChartOptions::default())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("empty dataset"));
}

#[tokio::test]
async fn failing_audit_sink_does_not_fail_the_cycle() {
    let state = empty_view();
    let sink: Arc<dyn AuditSink> = Arc::new(MemoryAuditSink::failing());
    let report = run_cycle(&state, &JsonlProvider::from_fixture(FIXTURE), &sink, &ChartOptions::default())
        .await
        .expect("render succeeds even if audit fails");
    report.audit.await.expect("audit task swallows the error");
    assert!(current_view(&state).is_some());
}

#[tokio::test(start_paused = true)]
async fn refresh_loop_runs_at_once_and_recovers_on_next_tick() {
    let state = empty_view();
    let source = Arc::new(FlakySource::default());
    let mem = Arc::new(MemoryAuditSink::new());
    let cfg = RefreshCfg {
        interval: Duration::from_secs(300),
        ..RefreshCfg::default()
    };
    let handle = spawn_refresh_loop(state.clone(), source.clone(), mem.clone(), cfg);

    // first cycle fires without waiting an interval, and fails
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(current_view(&state).is_none());
    assert!(mem.recorded().is_empty());

    // the loop survives the failure and publishes on the next tick
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    let view = current_view(&state).expect("view after recovery");
    assert_eq!(view.row_count, 2);
    assert_eq!(mem.recorded().len(), 1);

    handle.abort();
}
