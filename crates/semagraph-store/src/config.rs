//! Store configuration
//!
//! Endpoint URLs are derived Fuseki-style from a base URL and dataset
//! name: `{base}/{dataset}/query` and `{base}/{dataset}/update`. The
//! same base also anchors the named-graph layout: one graph per shape
//! and one data graph per target class.

use semagraph_core::model::{Iri, Namespace};
use url::Url;

/// Bounded exponential backoff for idempotent read queries
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts beyond the first
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (zero-based): base doubled per
    /// attempt, capped
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        let exp = self.base_delay_ms.saturating_mul(1u64 << attempt.min(16));
        exp.min(self.max_delay_ms)
    }
}

/// Connection settings for one SPARQL dataset
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub dataset: String,
    pub namespace: Namespace,
    pub timeout_seconds: u64,
    pub retry: RetryPolicy,
}

impl StoreConfig {
    pub fn new(base_url: &str, dataset: &str) -> Self {
        StoreConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            dataset: dataset.to_string(),
            namespace: Namespace::default(),
            timeout_seconds: 30,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validity check for the derived endpoints
    pub fn validate(&self) -> Result<(), url::ParseError> {
        Url::parse(&self.query_endpoint())?;
        Url::parse(&self.update_endpoint())?;
        Ok(())
    }

    pub fn query_endpoint(&self) -> String {
        format!("{}/{}/query", self.base_url, self.dataset)
    }

    pub fn update_endpoint(&self) -> String {
        format!("{}/{}/update", self.base_url, self.dataset)
    }

    /// Named graph holding the shape for one target class
    pub fn shapes_graph_iri(&self, target_class: &Iri) -> Iri {
        Iri::new(format!(
            "{}/{}/shapes/{}",
            self.base_url,
            self.dataset,
            target_class.local_name()
        ))
    }

    /// Named graph holding instance data for one target class
    pub fn data_graph_iri(&self, target_class: &Iri) -> Iri {
        Iri::new(format!(
            "{}/{}/data/{}",
            self.base_url,
            self.dataset,
            target_class.local_name()
        ))
    }
}
