//! Sentiment dashboard: binary entrypoint.
//! Boots the refresh loop and the Axum HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentiment_dashboard::{
    config::DashboardConfig,
    metrics::Metrics,
    refresh::{empty_view, spawn_refresh_loop, RefreshCfg},
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "sentiment-dashboard")]
#[command(about = "Self-refreshing sentiment score dashboard")]
#[command(version)]
struct Cli {
    /// Interface to bind
    #[arg(long, env = "DASHBOARD_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "DASHBOARD_PORT", default_value_t = 8050)]
    port: u16,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

/// Compact logs by default, JSON when LOG_FORMAT=json. RUST_LOG wins over
/// the built-in filter.
fn init_tracing(debug: bool) {
    let default = if debug {
        "sentiment_dashboard=debug,refresh=debug,info"
    } else {
        "sentiment_dashboard=info,refresh=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let cfg = DashboardConfig::from_env().context("loading dashboard config")?;
    tracing::info!(
        source = %cfg.source,
        refresh_secs = cfg.refresh_secs,
        audit = cfg.audit && cfg.store.is_some(),
        "dashboard config loaded"
    );

    let metrics = Metrics::init(cfg.refresh_secs)?;
    let source = cfg.build_source()?;
    let audit = cfg.build_audit_sink();

    let view = empty_view();
    let refresh = RefreshCfg {
        interval: cfg.refresh_interval(),
        ..RefreshCfg::default()
    };
    let _refresher = spawn_refresh_loop(view.clone(), source, audit, refresh);

    let state = AppState::new(view, cfg.refresh_interval());
    let router = sentiment_dashboard::app(state, &metrics);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "dashboard listening");

    axum::serve(listener, router).await.context("http server")?;
    Ok(())
}
