//! SPARQL protocol client
//!
//! All network I/O against the triple store goes through
//! `GraphStoreClient`. Read-only queries are retried transparently on
//! transient transport failures with bounded exponential backoff;
//! updates are never auto-retried, because re-sending a non-idempotent
//! insert risks duplicate triples. A failed commit is surfaced and the
//! whole unit must be re-submitted explicitly.

use crate::config::StoreConfig;
use crate::transaction::TransactionUnit;
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use reqwest::Client;
use semagraph_core::model::{Iri, Literal, Term, Triple};
use semagraph_core::turtle::parse_turtle;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One SELECT result row: variable name to bound term
pub type BindingRow = HashMap<String, Term>;

/// Store operations used by the registry and engine layers
#[async_trait]
pub trait GraphStoreClient: Send + Sync {
    /// Execute a SELECT query (read-only, retried on transient faults)
    async fn select(&self, query: &str) -> StoreResult<Vec<BindingRow>>;

    /// Execute an ASK query (read-only, retried on transient faults)
    async fn ask(&self, query: &str) -> StoreResult<bool>;

    /// Execute a CONSTRUCT query (read-only, retried on transient
    /// faults)
    async fn construct(&self, query: &str) -> StoreResult<Vec<Triple>>;

    /// Execute a raw SPARQL update. Never auto-retried.
    async fn update(&self, update: &str) -> StoreResult<()>;

    /// Connection probe
    async fn ping(&self) -> StoreResult<bool> {
        self.ask("ASK { ?s ?p ?o }").await
    }

    /// Start staging an atomic unit of triple changes
    fn begin_unit(&self) -> TransactionUnit {
        TransactionUnit::new()
    }

    /// Commit a unit as one update request. Consumes the unit; a failed
    /// commit must be retried by re-submitting a whole new unit.
    async fn commit(&self, unit: TransactionUnit) -> StoreResult<()> {
        if unit.is_empty() {
            return Ok(());
        }
        let inserts = unit.insert_count();
        self.update(&unit.to_update_string())
            .await
            .map_err(|e| match e {
                StoreError::Api { status, message } => StoreError::Transaction(format!(
                    "commit rejected with status {}: {}",
                    status, message
                )),
                other => other,
            })?;
        info!(inserts, "committed unit");
        Ok(())
    }

    /// Discard a staged unit. Nothing was sent, so nothing needs
    /// undoing on the store side.
    async fn rollback(&self, unit: TransactionUnit) -> StoreResult<()> {
        debug!(inserts = unit.insert_count(), "rolled back unit");
        drop(unit);
        Ok(())
    }
}

/// SPARQL 1.1 protocol client over HTTP
pub struct SparqlHttpClient {
    config: StoreConfig,
    client: Client,
}

impl SparqlHttpClient {
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        config
            .validate()
            .map_err(|e| StoreError::Config(format!("invalid endpoint: {}", e)))?;
        Ok(SparqlHttpClient {
            config,
            client: Client::new(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// POST a read-only query, retrying transient transport failures
    /// with bounded exponential backoff
    async fn run_query(&self, query: &str, accept: &str) -> StoreResult<reqwest::Response> {
        let retry = &self.config.retry;
        let mut attempt = 0u32;
        loop {
            let result = self
                .client
                .post(self.config.query_endpoint())
                .header("Content-Type", "application/sparql-query")
                .header("Accept", accept)
                .body(query.to_string())
                .timeout(Duration::from_secs(self.config.timeout_seconds))
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let message = response.text().await.unwrap_or_default();
                        return Err(StoreError::Api {
                            status: status.as_u16(),
                            message,
                        });
                    }
                    return Ok(response);
                }
                Err(e) if is_transient(&e) && attempt < retry.max_retries => {
                    let delay = retry.delay_ms(attempt);
                    warn!(attempt, delay_ms = delay, error = %e, "transient query failure, backing off");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(StoreError::Connection(format!(
                        "query failed after {} attempt(s): {}",
                        attempt + 1,
                        e
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl GraphStoreClient for SparqlHttpClient {
    async fn select(&self, query: &str) -> StoreResult<Vec<BindingRow>> {
        debug!(endpoint = %self.config.query_endpoint(), "select");
        let response = self
            .run_query(query, "application/sparql-results+json")
            .await?;
        let payload: SparqlResultsJson = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let bindings = payload
            .results
            .ok_or_else(|| StoreError::Decode("response carries no bindings".to_string()))?
            .bindings;
        Ok(bindings.into_iter().map(convert_row).collect())
    }

    async fn ask(&self, query: &str) -> StoreResult<bool> {
        let response = self
            .run_query(query, "application/sparql-results+json")
            .await?;
        let payload: SparqlResultsJson = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        payload
            .boolean
            .ok_or_else(|| StoreError::Decode("response carries no boolean".to_string()))
    }

    async fn construct(&self, query: &str) -> StoreResult<Vec<Triple>> {
        let response = self.run_query(query, "text/turtle").await?;
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        parse_turtle(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn update(&self, update: &str) -> StoreResult<()> {
        debug!(endpoint = %self.config.update_endpoint(), "update");
        let response = self
            .client
            .post(self.config.update_endpoint())
            .header("Content-Type", "application/sparql-update")
            .body(update.to_string())
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await
            .map_err(|e| StoreError::Connection(format!("update failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// `application/sparql-results+json` payload
#[derive(Debug, Deserialize)]
pub(crate) struct SparqlResultsJson {
    pub(crate) results: Option<JsonBindings>,
    pub(crate) boolean: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonBindings {
    pub(crate) bindings: Vec<HashMap<String, JsonTerm>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonTerm {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) value: String,
    pub(crate) datatype: Option<String>,
    #[serde(rename = "xml:lang")]
    pub(crate) lang: Option<String>,
}

fn convert_row(row: HashMap<String, JsonTerm>) -> BindingRow {
    row.into_iter()
        .map(|(var, term)| (var, convert_term(term)))
        .collect()
}

/// SPARQL JSON binding value to an RDF term
fn convert_term(term: JsonTerm) -> Term {
    match term.kind.as_str() {
        "uri" => Term::Iri(Iri::new(term.value)),
        "bnode" => Term::Blank(term.value),
        // "literal" and the legacy "typed-literal"
        _ => Term::Literal(Literal {
            value: term.value,
            datatype: term.datatype.map(Iri::new),
            language: term.lang,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;

    #[test]
    fn test_client_rejects_invalid_endpoints() {
        let config = StoreConfig::new("not a url", "ds");
        assert!(matches!(
            SparqlHttpClient::new(config),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_client_accepts_fuseki_style_config() {
        let config = StoreConfig::new("http://localhost:3030", "semantic")
            .with_timeout(5)
            .with_retry(RetryPolicy::default());
        let client = SparqlHttpClient::new(config).unwrap();
        assert_eq!(
            client.config().query_endpoint(),
            "http://localhost:3030/semantic/query"
        );
    }

    #[test]
    fn test_select_payload_parsing() {
        let raw = r#"{
            "head": { "vars": ["s", "age"] },
            "results": { "bindings": [
                {
                    "s": { "type": "uri", "value": "http://example.org/p1" },
                    "age": {
                        "type": "literal",
                        "value": "42",
                        "datatype": "http://www.w3.org/2001/XMLSchema#integer"
                    }
                }
            ] }
        }"#;
        let payload: SparqlResultsJson = serde_json::from_str(raw).unwrap();
        let rows: Vec<BindingRow> = payload
            .results
            .unwrap()
            .bindings
            .into_iter()
            .map(convert_row)
            .collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0]["s"],
            Term::Iri(Iri::new("http://example.org/p1"))
        );
        let age = rows[0]["age"].as_literal().unwrap();
        assert_eq!(age.value, "42");
        assert_eq!(
            age.datatype.as_ref().unwrap().as_str(),
            "http://www.w3.org/2001/XMLSchema#integer"
        );
    }

    #[test]
    fn test_ask_payload_parsing() {
        let payload: SparqlResultsJson =
            serde_json::from_str(r#"{ "head": {}, "boolean": true }"#).unwrap();
        assert_eq!(payload.boolean, Some(true));
    }

    #[test]
    fn test_bnode_binding_conversion() {
        let term = convert_term(JsonTerm {
            kind: "bnode".to_string(),
            value: "b0".to_string(),
            datatype: None,
            lang: None,
        });
        assert_eq!(term, Term::Blank("b0".to_string()));
    }
}
