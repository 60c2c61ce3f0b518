//! In-memory stand-in for the SPARQL endpoint. It executes the exact
//! query and update strings the engine emits, so registry and engine
//! tests exercise the real wire-text round trip without a live store.

use async_trait::async_trait;
use semagraph_core::model::{Iri, Term, Triple};
use semagraph_core::turtle::parse_turtle;
use semagraph_core::vocab::rdf;
use semagraph_store::{BindingRow, GraphStoreClient, StoreError, StoreResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    graphs: Mutex<HashMap<String, Vec<Triple>>>,
    update_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }

    pub fn graph_len(&self, graph: &str) -> usize {
        self.graphs
            .lock()
            .unwrap()
            .get(graph)
            .map(|t| t.len())
            .unwrap_or(0)
    }

    pub fn graph_triples(&self, graph: &str) -> Vec<Triple> {
        self.graphs
            .lock()
            .unwrap()
            .get(graph)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed a graph directly, bypassing the update counter; stands in
    /// for writes made by a different process
    pub fn seed_graph(&self, graph: &str, triples: Vec<Triple>) {
        self.graphs
            .lock()
            .unwrap()
            .insert(graph.to_string(), triples);
    }
}

fn extract<'a>(haystack: &'a str, prefix: &str) -> Option<&'a str> {
    let start = haystack.find(prefix)? + prefix.len();
    let end = haystack[start..].find('>')?;
    Some(&haystack[start..start + end])
}

/// Parse the `GRAPH <g> { ... }` blocks of a DELETE DATA/INSERT DATA
/// operation the engine renders
fn parse_data_blocks(op: &str) -> Vec<(String, Vec<Triple>)> {
    let mut blocks = Vec::new();
    let mut rest = op;
    while let Some(start) = rest.find("GRAPH <") {
        let after = &rest[start + "GRAPH <".len()..];
        let iri_end = after.find('>').expect("unterminated graph IRI");
        let graph = after[..iri_end].to_string();
        let body_start = after.find('{').expect("missing graph block") + 1;
        let body = &after[body_start..];
        let body_end = body.find("\n  }").expect("unterminated graph block");
        let triples = parse_turtle(&body[..body_end]).expect("unparsable block");
        blocks.push((graph, triples));
        rest = &body[body_end..];
    }
    blocks
}

#[async_trait]
impl GraphStoreClient for MemoryStore {
    async fn select(&self, query: &str) -> StoreResult<Vec<BindingRow>> {
        let graph = extract(query, "GRAPH <")
            .ok_or_else(|| StoreError::Api {
                status: 400,
                message: "query names no graph".to_string(),
            })?
            .to_string();
        let class = extract(query, "?s a <")
            .ok_or_else(|| StoreError::Api {
                status: 400,
                message: "query names no class".to_string(),
            })?
            .to_string();

        let graphs = self.graphs.lock().unwrap();
        let triples = graphs.get(&graph).cloned().unwrap_or_default();
        let subjects: HashSet<&Iri> = triples
            .iter()
            .filter(|t| {
                t.predicate.as_str() == rdf::TYPE
                    && t.object.as_iri().is_some_and(|iri| iri.as_str() == class)
            })
            .map(|t| &t.subject)
            .collect();

        let rows = triples
            .iter()
            .filter(|t| subjects.contains(&t.subject))
            .map(|t| {
                let mut row = BindingRow::new();
                row.insert("s".to_string(), Term::Iri(t.subject.clone()));
                row.insert("p".to_string(), Term::Iri(t.predicate.clone()));
                row.insert("o".to_string(), t.object.clone());
                row
            })
            .collect();
        Ok(rows)
    }

    async fn ask(&self, _query: &str) -> StoreResult<bool> {
        let graphs = self.graphs.lock().unwrap();
        Ok(graphs.values().any(|triples| !triples.is_empty()))
    }

    async fn construct(&self, query: &str) -> StoreResult<Vec<Triple>> {
        let graph = extract(query, "GRAPH <").ok_or_else(|| StoreError::Api {
            status: 400,
            message: "query names no graph".to_string(),
        })?;
        Ok(self.graph_triples(graph))
    }

    async fn update(&self, update: &str) -> StoreResult<()> {
        self.update_count.fetch_add(1, Ordering::SeqCst);
        let mut graphs = self.graphs.lock().unwrap();
        for op in update.split(" ;\n") {
            if let Some(graph) = op.strip_prefix("DROP SILENT GRAPH <") {
                let graph = graph.trim_end_matches('>');
                graphs.remove(graph);
            } else if op.starts_with("DELETE DATA") {
                for (graph, triples) in parse_data_blocks(op) {
                    if let Some(stored) = graphs.get_mut(&graph) {
                        stored.retain(|t| !triples.contains(t));
                    }
                }
            } else if op.starts_with("INSERT DATA") {
                for (graph, triples) in parse_data_blocks(op) {
                    graphs.entry(graph).or_default().extend(triples);
                }
            }
        }
        Ok(())
    }
}
