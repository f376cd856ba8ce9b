use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use reqwest::{Client, Request};
use std::time::Duration;

use crate::ingest::types::{RawRecord, RecordSource};

/// Service URL + key for the hosted table store (PostgREST-style REST API).
#[derive(Clone)]
pub struct StoreCredentials {
    pub url: String,
    pub key: String,
}

impl std::fmt::Debug for StoreCredentials {
    // never print the key
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("url", &self.url)
            .field("key_len", &self.key.len())
            .finish()
    }
}

impl StoreCredentials {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            key: key.into(),
        }
    }

    /// `{url}/rest/v1/{table}`
    pub fn table_endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// Attach the auth headers the store expects on every call.
    pub fn authorize(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        rb.header("apikey", &self.key).bearer_auth(&self.key)
    }
}

/// Windowed query against the scores table: rows with
/// `timestamp >= now - window`, ascending.
pub struct TableStoreProvider {
    creds: StoreCredentials,
    table: String,
    window: ChronoDuration,
    client: Client,
}

impl TableStoreProvider {
    pub fn new(creds: StoreCredentials, table: impl Into<String>, window_days: u32) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            creds,
            table: table.into(),
            window: ChronoDuration::days(i64::from(window_days)),
            client,
        }
    }

    /// Lower bound of the query window for a given "now".
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// Build (but do not send) the select request for the window ending at `now`.
    pub fn build_request(&self, now: DateTime<Utc>) -> Result<Request> {
        let since = self
            .window_start(now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let rb = self
            .client
            .get(self.creds.table_endpoint(&self.table))
            .query(&[
                ("select", "timestamp,scores".to_string()),
                ("timestamp", format!("gte.{since}")),
                ("order", "timestamp.asc".to_string()),
            ]);
        self.creds
            .authorize(rb)
            .build()
            .context("building table store query")
    }
}

#[async_trait]
impl RecordSource for TableStoreProvider {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        let req = self.build_request(Utc::now())?;
        let rows: Vec<RawRecord> = self
            .client
            .execute(req)
            .await
            .context("table store query")?
            .error_for_status()
            .context("table store non-2xx")?
            .json()
            .await
            .context("decoding table store rows")?;
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "table_store"
    }
}
