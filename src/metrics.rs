use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

static METRICS: OnceCell<Metrics> = OnceCell::new();

impl Metrics {
    /// Install the Prometheus recorder (once per process) and return the
    /// shared handle. `refresh_secs` is exposed as a static gauge.
    pub fn init(refresh_secs: u64) -> anyhow::Result<Self> {
        let m = METRICS.get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

            describe_counter!("dashboard_refresh_total", "Successful refresh cycles.");
            describe_counter!(
                "dashboard_refresh_errors_total",
                "Refresh cycles aborted by a fetch or normalization error."
            );
            describe_counter!(
                "dashboard_audit_errors_total",
                "Audit log writes that failed (swallowed)."
            );
            describe_histogram!("dashboard_refresh_ms", "Refresh cycle time in milliseconds.");
            describe_gauge!(
                "dashboard_last_refresh_ts",
                "Unix ts of the last successful refresh."
            );
            describe_gauge!("dashboard_tickers", "Tickers in the last rendered table.");

            Ok::<_, anyhow::Error>(Metrics { handle })
        })?;

        gauge!("dashboard_refresh_interval_secs").set(refresh_secs as f64);
        Ok(m.clone())
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
