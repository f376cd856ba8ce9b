use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::ingest::parse_jsonl;
use crate::ingest::types::{RawRecord, RecordSource};

/// Default location of the published score file.
pub const DEFAULT_JSONL_URL: &str =
    "https://raw.githubusercontent.com/igorrivin/sentiment-dashboard/main/sentiment_scores.jsonl";

/// Static JSON-lines file source. The whole file is refetched every cycle.
pub struct JsonlProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: Client },
}

impl JsonlProvider {
    pub fn from_url(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    /// Serve records from an in-memory body instead of the network.
    pub fn from_fixture(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }
}

#[async_trait]
impl RecordSource for JsonlProvider {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        match &self.mode {
            Mode::Fixture(body) => parse_jsonl(body),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("jsonl http get()")?
                    .error_for_status()
                    .context("jsonl non-2xx")?
                    .text()
                    .await
                    .context("jsonl http .text()")?;
                parse_jsonl(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_mode_parses_body() {
        let p = JsonlProvider::from_fixture(
            r#"{"timestamp":"2024-01-01T00:00:00Z","scores":{"AAA":0.5}}"#,
        );
        let recs = p.fetch_records().await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].timestamp, "2024-01-01T00:00:00Z");
    }
}
