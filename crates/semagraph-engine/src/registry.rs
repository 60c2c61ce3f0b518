//! Shape registry
//!
//! Single authority gating which shapes reach the store. Registration
//! is exclusive per target class: concurrent calls for the same
//! identifier serialize on an entry-level lock, and all but the first
//! collapse into a cache hit, since the content hash is checked before
//! any store write. Registrations for unrelated classes proceed fully
//! in parallel.

use crate::EngineError;
use semagraph_core::descriptor::{ContentHash, ShapeDescriptor};
use semagraph_core::model::Iri;
use semagraph_shacl::ShapeGenerator;
use semagraph_store::{GraphStoreClient, StoreConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// What a registration call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created,
    Unchanged,
    Updated,
}

/// Result of one registration call
#[derive(Debug, Clone)]
pub struct Registration {
    pub outcome: RegistrationOutcome,
    pub content_hash: ContentHash,
    /// Named graph the shape lives in
    pub graph: Iri,
}

/// Cached registry state for one target class. Entries are created on
/// first successful registration, updated only when the content hash
/// changes, and never deleted automatically.
#[derive(Debug, Clone)]
struct RegistryEntry {
    descriptor: Arc<ShapeDescriptor>,
    graph: Iri,
    synced_hash: ContentHash,
}

/// Cache and identity layer over generated shapes, backed by the store
pub struct ShapeRegistry {
    client: Arc<dyn GraphStoreClient>,
    config: StoreConfig,
    generator: ShapeGenerator,
    entries: RwLock<HashMap<Iri, RegistryEntry>>,
    /// Per-target-class critical sections
    locks: Mutex<HashMap<Iri, Arc<tokio::sync::Mutex<()>>>>,
}

impl ShapeRegistry {
    pub fn new(
        client: Arc<dyn GraphStoreClient>,
        config: StoreConfig,
        generator: ShapeGenerator,
    ) -> Self {
        ShapeRegistry {
            client,
            config,
            generator,
            entries: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, target_class: &Iri) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock map poisoned");
        locks
            .entry(target_class.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Register a shape, writing to the store only when its content
    /// hash differs from what is already synchronized.
    pub async fn register(&self, descriptor: &ShapeDescriptor) -> Result<Registration, EngineError> {
        let target_class = descriptor.target_class.clone();
        let hash = descriptor.content_hash();
        let graph = self.config.shapes_graph_iri(&target_class);

        let lock = self.lock_for(&target_class);
        let _guard = lock.lock().await;

        if let Some(entry) = self.entries.read().await.get(&target_class) {
            if entry.synced_hash == hash {
                debug!(%target_class, %hash, "registration collapsed into cache hit");
                return Ok(Registration {
                    outcome: RegistrationOutcome::Unchanged,
                    content_hash: hash,
                    graph: entry.graph.clone(),
                });
            }
        }

        // fresh read: what does the store hold right now?
        let stored_hash = self.fetch_stored_hash(&graph).await?;
        let cached_hash = self
            .entries
            .read()
            .await
            .get(&target_class)
            .map(|entry| entry.synced_hash);

        let outcome = match stored_hash {
            Some(stored) if stored == hash => RegistrationOutcome::Unchanged,
            Some(stored) => {
                // a hash we did not put there means a concurrent writer
                // committed a divergent shape; the caller retries with
                // fresh state
                if cached_hash != Some(stored) {
                    return Err(EngineError::ShapeConflict {
                        target_class,
                        ours: hash,
                        theirs: stored,
                    });
                }
                RegistrationOutcome::Updated
            }
            None => RegistrationOutcome::Created,
        };

        if outcome != RegistrationOutcome::Unchanged {
            // atomic replace: drop and re-insert the shape graph in one
            // update request
            let mut unit = self.client.begin_unit();
            unit.drop_graph(graph.clone());
            unit.insert_all(&graph, self.generator.descriptor_to_triples(descriptor));
            self.client.commit(unit).await?;
            info!(%target_class, %hash, ?outcome, "shape written to store");
        }

        self.entries.write().await.insert(
            target_class,
            RegistryEntry {
                descriptor: Arc::new(descriptor.clone()),
                graph: graph.clone(),
                synced_hash: hash,
            },
        );

        Ok(Registration {
            outcome,
            content_hash: hash,
            graph,
        })
    }

    /// Resolve a shape by target class: cache first, then the store.
    /// Store hits populate the cache.
    pub async fn resolve(
        &self,
        target_class: &Iri,
    ) -> Result<Option<Arc<ShapeDescriptor>>, EngineError> {
        if let Some(entry) = self.entries.read().await.get(target_class) {
            return Ok(Some(entry.descriptor.clone()));
        }

        let graph = self.config.shapes_graph_iri(target_class);
        let triples = self.client.construct(&graph_dump_query(&graph)).await?;
        if triples.is_empty() {
            return Ok(None);
        }
        let descriptor = Arc::new(self.generator.descriptor_from_triples(&triples)?);
        let hash = descriptor.content_hash();
        self.entries.write().await.insert(
            target_class.clone(),
            RegistryEntry {
                descriptor: descriptor.clone(),
                graph,
                synced_hash: hash,
            },
        );
        debug!(%target_class, %hash, "shape resolved from store");
        Ok(Some(descriptor))
    }

    /// Synchronized content hash for a target class, if registered
    pub async fn synced_hash(&self, target_class: &Iri) -> Option<ContentHash> {
        self.entries
            .read()
            .await
            .get(target_class)
            .map(|entry| entry.synced_hash)
    }

    async fn fetch_stored_hash(&self, graph: &Iri) -> Result<Option<ContentHash>, EngineError> {
        let triples = self.client.construct(&graph_dump_query(graph)).await?;
        if triples.is_empty() {
            return Ok(None);
        }
        let descriptor = self.generator.descriptor_from_triples(&triples)?;
        Ok(Some(descriptor.content_hash()))
    }
}

/// CONSTRUCT the full contents of one named graph
pub(crate) fn graph_dump_query(graph: &Iri) -> String {
    format!(
        "CONSTRUCT {{ ?s ?p ?o }} WHERE {{ GRAPH <{}> {{ ?s ?p ?o }} }}",
        graph
    )
}
