// src/refresh.rs
//! Refresh driver: one fetch → normalize → render → publish → audit cycle per
//! tick. Cycles run inline in a single task, so they never overlap.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::audit::{emit_refresh_event, AuditSink};
use crate::ingest::{self, types::RecordSource};
use crate::normalize::normalize;
use crate::render::{ChartOptions, DashboardView};

/// Last successfully rendered view; `None` until the first cycle succeeds.
pub type SharedView = Arc<RwLock<Option<DashboardView>>>;

pub fn empty_view() -> SharedView {
    Arc::new(RwLock::new(None))
}

/// Clone of the current view, if any.
pub fn current_view(state: &SharedView) -> Option<DashboardView> {
    match state.read() {
        Ok(g) => g.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn publish(state: &SharedView, view: DashboardView) {
    match state.write() {
        Ok(mut g) => *g = Some(view),
        Err(poisoned) => *poisoned.into_inner() = Some(view),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RefreshCfg {
    pub interval: Duration,
    pub chart: ChartOptions,
}

impl Default for RefreshCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            chart: ChartOptions::default(),
        }
    }
}

/// What a successful cycle did. `audit` is the detached log write.
#[derive(Debug)]
pub struct CycleReport {
    pub rows: usize,
    pub tickers: usize,
    pub latest_timestamp: DateTime<Utc>,
    pub audit: JoinHandle<()>,
}

/// Fetch, normalize and render without touching shared state.
pub async fn build_view(source: &dyn RecordSource, chart: &ChartOptions) -> Result<DashboardView> {
    let records = ingest::fetch_once(source).await?;
    let table = normalize(&records)?;
    Ok(DashboardView::build(&table, chart, Utc::now()))
}

/// One full cycle. On error nothing is published and no audit event is
/// emitted; the previous view stays in place.
pub async fn run_cycle(
    state: &SharedView,
    source: &dyn RecordSource,
    audit: &Arc<dyn AuditSink>,
    chart: &ChartOptions,
) -> Result<CycleReport> {
    let view = build_view(source, chart).await?;

    let latest = view.latest_timestamp.unwrap_or(view.refreshed_at);
    let rows = view.row_count;
    let tickers = view.tickers.len();
    publish(state, view);

    let audit = emit_refresh_event(Arc::clone(audit), latest);

    Ok(CycleReport {
        rows,
        tickers,
        latest_timestamp: latest,
        audit,
    })
}

/// Spawn the periodic refresher. The first tick fires immediately; a slow
/// cycle delays the next tick rather than bursting to catch up.
pub fn spawn_refresh_loop(
    state: SharedView,
    source: Arc<dyn RecordSource>,
    audit: Arc<dyn AuditSink>,
    cfg: RefreshCfg,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;

            let t0 = Instant::now();
            match run_cycle(&state, source.as_ref(), &audit, &cfg.chart).await {
                Ok(report) => {
                    counter!("dashboard_refresh_total").increment(1);
                    gauge!("dashboard_last_refresh_ts").set(Utc::now().timestamp() as f64);
                    gauge!("dashboard_tickers").set(report.tickers as f64);
                    tracing::info!(
                        target: "refresh",
                        rows = report.rows,
                        tickers = report.tickers,
                        latest = %report.latest_timestamp,
                        "dashboard refreshed"
                    );
                }
                Err(e) => {
                    counter!("dashboard_refresh_errors_total").increment(1);
                    tracing::warn!(
                        target: "refresh",
                        source = source.name(),
                        error = %format!("{e:#}"),
                        "refresh cycle failed; keeping previous view"
                    );
                }
            }
            histogram!("dashboard_refresh_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        }
    })
}
