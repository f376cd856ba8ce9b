// src/ingest/types.rs
use anyhow::Result;
use std::collections::BTreeMap;

/// One observation batch as delivered by a record source.
///
/// `scores` keys vary between records; a JSON `null` score deserializes to
/// `None` and is treated as an absent ticker downstream.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct RawRecord {
    pub timestamp: String, // ISO-8601, parsed by the normalizer
    #[serde(default)]
    pub scores: BTreeMap<String, Option<f64>>,
}

impl RawRecord {
    /// Convenience constructor used by fixtures and tests.
    pub fn new<T, I, K>(timestamp: T, scores: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            timestamp: timestamp.into(),
            scores: scores
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v)))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>>;
    fn name(&self) -> &'static str;
}
