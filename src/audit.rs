// src/audit.rs
//! Best-effort access log: one row per successful dashboard refresh.
//! Writes are detached from the refresh cycle; failures are only logged.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::ingest::providers::StoreCredentials;

pub const REFRESH_EVENT: &str = "dashboard_refresh";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,
}

impl AuditEvent {
    pub fn refresh(ts: DateTime<Utc>) -> Self {
        Self {
            timestamp: ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            event: REFRESH_EVENT.to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Single-row insert into the visit-log table of the hosted store.
pub struct TableStoreAuditSink {
    creds: StoreCredentials,
    table: String,
    client: Client,
}

impl TableStoreAuditSink {
    pub fn new(creds: StoreCredentials, table: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            creds,
            table: table.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl AuditSink for TableStoreAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        let rb = self
            .client
            .post(self.creds.table_endpoint(&self.table))
            .header("Prefer", "return=minimal")
            .json(event);
        self.creds
            .authorize(rb)
            .send()
            .await
            .context("audit insert")?
            .error_for_status()
            .context("audit insert non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "table_store"
    }
}

/// Used when there is no store to log to.
pub struct NoopAuditSink;

#[async_trait::async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _event: &AuditEvent) -> Result<()> {
        tracing::trace!("audit disabled");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

// --- Test helper ---
/// Collects events in memory; optionally fails every write.
pub struct MemoryAuditSink {
    pub events: Mutex<Vec<AuditEvent>>,
    fail: bool,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(vec![]),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            events: Mutex::new(vec![]),
            fail: true,
        }
    }

    pub fn recorded(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        if self.fail {
            anyhow::bail!("memory sink configured to fail");
        }
        if let Ok(mut v) = self.events.lock() {
            v.push(event.clone());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Fire-and-forget: spawn the write and return at once. The handle is only
/// useful to tests; dropping it does not cancel the write.
pub fn emit_refresh_event(sink: Arc<dyn AuditSink>, ts: DateTime<Utc>) -> JoinHandle<()> {
    let event = AuditEvent::refresh(ts);
    tokio::spawn(async move {
        match sink.record(&event).await {
            Ok(()) => tracing::debug!(sink = sink.name(), ts = %event.timestamp, "audit event written"),
            Err(e) => {
                counter!("dashboard_audit_errors_total").increment(1);
                tracing::warn!(sink = sink.name(), error = %format!("{e:#}"), "audit write failed");
            }
        }
    })
}
