//! Mention sources: producers of raw extracted records for a target.

pub mod json_file;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

pub use json_file::JsonFileSource;

/// Common interface for everything that can hand the pipeline raw mentions.
///
/// Implementations are free to be slow or non-deterministic (registry
/// scrapers, model-based extraction); the pipeline only sees the values.
#[async_trait]
pub trait MentionSource: Send + Sync {
    /// Raw mention values for `target`. An empty vector is a valid answer.
    async fn fetch(&self, target: &str) -> anyhow::Result<Vec<Value>>;

    /// Short label for logs.
    fn name(&self) -> &str;
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// In-memory source keyed by target (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct MockMentionSource {
    data: HashMap<String, Vec<Value>>,
}

impl MockMentionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the records returned for a target.
    pub fn with(mut self, target: &str, records: Vec<Value>) -> Self {
        self.data.insert(target.to_lowercase(), records);
        self
    }
}

#[async_trait]
impl MentionSource for MockMentionSource {
    async fn fetch(&self, target: &str) -> anyhow::Result<Vec<Value>> {
        Ok(self.data.get(&target.to_lowercase()).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
