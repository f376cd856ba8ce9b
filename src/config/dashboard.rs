// src/config/dashboard.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditSink, NoopAuditSink, TableStoreAuditSink};
use crate::ingest::providers::jsonl::DEFAULT_JSONL_URL;
use crate::ingest::providers::{JsonlProvider, StoreCredentials, TableStoreProvider};
use crate::ingest::types::RecordSource;

pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

pub const ENV_STORE_URL: &str = "SUPABASE_URL";
pub const ENV_STORE_KEY: &str = "SUPABASE_KEY";
pub const ENV_SOURCE: &str = "DASHBOARD_SOURCE";
pub const ENV_JSONL_URL: &str = "DASHBOARD_JSONL_URL";
pub const ENV_REFRESH_SECS: &str = "DASHBOARD_REFRESH_SECS";

fn default_jsonl_url() -> String {
    DEFAULT_JSONL_URL.to_string()
}
fn default_window_days() -> u32 {
    7
}
fn default_scores_table() -> String {
    "sentiment_scores".to_string()
}
fn default_visit_logs_table() -> String {
    "visit_logs".to_string()
}
fn default_refresh_secs() -> u64 {
    300
}
fn default_audit() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Jsonl,
    TableStore,
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "file" => Ok(SourceKind::Jsonl),
            "table_store" | "table-store" | "store" | "supabase" => Ok(SourceKind::TableStore),
            other => Err(anyhow!("unknown record source '{other}'")),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Jsonl => write!(f, "jsonl"),
            SourceKind::TableStore => write!(f, "table_store"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default = "default_jsonl_url")]
    pub jsonl_url: String,
    /// Trailing query window for the table store.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_scores_table")]
    pub scores_table: String,
    #[serde(default = "default_visit_logs_table")]
    pub visit_logs_table: String,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Write a visit-log row per refresh (needs store credentials).
    #[serde(default = "default_audit")]
    pub audit: bool,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub store: Option<StoreCredentials>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            jsonl_url: default_jsonl_url(),
            window_days: default_window_days(),
            scores_table: default_scores_table(),
            visit_logs_table: default_visit_logs_table(),
            refresh_secs: default_refresh_secs(),
            audit: default_audit(),
            store: None,
        }
    }
}

impl DashboardConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        let cfg: DashboardConfig = toml::from_str(&data)
            .with_context(|| format!("parsing dashboard config {}", path.display()))?;
        Ok(cfg)
    }

    /// File lookup:
    /// 1) $DASHBOARD_CONFIG_PATH (must exist)
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from_file(&pb);
        }
        let p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if p.exists() {
            return Self::load_from_file(&p);
        }
        Ok(Self::default())
    }

    /// Overlay environment values; `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        if let Some(s) = non_empty(ENV_SOURCE) {
            self.source = s.parse()?;
        }
        if let Some(u) = non_empty(ENV_JSONL_URL) {
            self.jsonl_url = u.trim().to_string();
        }
        if let Some(r) = non_empty(ENV_REFRESH_SECS) {
            self.refresh_secs = r
                .trim()
                .parse()
                .with_context(|| format!("{ENV_REFRESH_SECS} must be an integer, got '{r}'"))?;
        }
        if let (Some(url), Some(key)) = (non_empty(ENV_STORE_URL), non_empty(ENV_STORE_KEY)) {
            self.store = Some(StoreCredentials::new(url.trim(), key.trim()));
        }
        Ok(self)
    }

    pub fn validate(mut self) -> Result<Self> {
        if self.refresh_secs == 0 {
            self.refresh_secs = default_refresh_secs();
        }
        if self.window_days == 0 {
            self.window_days = default_window_days();
        }
        if self.source == SourceKind::TableStore && self.store.is_none() {
            bail!("table_store source needs {ENV_STORE_URL} and {ENV_STORE_KEY}");
        }
        Ok(self)
    }

    /// File + process environment, validated.
    pub fn from_env() -> Result<Self> {
        Self::load_default()?
            .apply_env(|k| std::env::var(k).ok())?
            .validate()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn build_source(&self) -> Result<Arc<dyn RecordSource>> {
        match self.source {
            SourceKind::Jsonl => Ok(Arc::new(JsonlProvider::from_url(self.jsonl_url.clone()))),
            SourceKind::TableStore => {
                let creds = self
                    .store
                    .clone()
                    .ok_or_else(|| anyhow!("table_store source without credentials"))?;
                Ok(Arc::new(TableStoreProvider::new(
                    creds,
                    self.scores_table.clone(),
                    self.window_days,
                )))
            }
        }
    }

    pub fn build_audit_sink(&self) -> Arc<dyn AuditSink> {
        match (&self.store, self.audit) {
            (Some(creds), true) => Arc::new(TableStoreAuditSink::new(
                creds.clone(),
                self.visit_logs_table.clone(),
            )),
            _ => Arc::new(NoopAuditSink),
        }
    }
}
