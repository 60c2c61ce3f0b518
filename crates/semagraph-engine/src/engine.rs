//! High-level orchestration
//!
//! `SemanticEngine` wires the generator, registry, store client and
//! validation engine together: register schemas, persist data records
//! as instance triples, re-validate records against stored shapes, and
//! fetch records back out of the data graphs.

use crate::registry::{graph_dump_query, Registration, ShapeRegistry};
use crate::EngineError;
use async_trait::async_trait;
use semagraph_core::model::{Iri, Term, Triple};
use semagraph_core::record::{DataRecord, Value};
use semagraph_core::vocab::{rdf, xsd};
use semagraph_core::ShapeDescriptor;
use semagraph_schema::{SchemaAdapter, SchemaDef};
use semagraph_shacl::{
    GeneratorConfig, ShapeError, ShapeGenerator, ShapeResolver, ValidationEngine, ValidationReport,
};
use semagraph_store::{
    GraphStoreClient, SparqlHttpClient, StoreConfig, TransactionUnit,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Orchestrating entry point over one store and namespace
pub struct SemanticEngine {
    client: Arc<dyn GraphStoreClient>,
    config: StoreConfig,
    generator: ShapeGenerator,
    registry: Arc<ShapeRegistry>,
    validator: ValidationEngine,
}

impl SemanticEngine {
    /// Connect to a SPARQL endpoint with the default generator settings
    pub fn new(config: StoreConfig) -> Result<Self, EngineError> {
        let client: Arc<dyn GraphStoreClient> =
            Arc::new(SparqlHttpClient::new(config.clone())?);
        Ok(Self::with_client(client, config))
    }

    /// Use an explicit client; the seam test doubles go through
    pub fn with_client(client: Arc<dyn GraphStoreClient>, config: StoreConfig) -> Self {
        let generator_config = GeneratorConfig::new(config.namespace.clone());
        Self::with_generator(client, config, generator_config)
    }

    pub fn with_generator(
        client: Arc<dyn GraphStoreClient>,
        config: StoreConfig,
        generator_config: GeneratorConfig,
    ) -> Self {
        let generator = ShapeGenerator::new(generator_config);
        let registry = Arc::new(ShapeRegistry::new(
            client.clone(),
            config.clone(),
            generator.clone(),
        ));
        SemanticEngine {
            client,
            config,
            generator,
            registry,
            validator: ValidationEngine::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ShapeRegistry> {
        &self.registry
    }

    /// Connection probe against the store
    pub async fn ping(&self) -> Result<bool, EngineError> {
        Ok(self.client.ping().await?)
    }

    /// Generate and register a schema together with every schema it
    /// references, children first. Idempotent: re-registering an
    /// unchanged schema writes nothing.
    pub async fn register_schema(
        &self,
        schema: &SchemaDef,
        adapter: &dyn SchemaAdapter,
    ) -> Result<Vec<Registration>, EngineError> {
        let shapes = self.generator.generate_closure(schema, adapter)?;
        let mut registrations = Vec::with_capacity(shapes.len());
        for shape in &shapes {
            registrations.push(self.registry.register(shape).await?);
        }
        info!(schema = %schema.name, count = registrations.len(), "schema registered");
        Ok(registrations)
    }

    /// Persist a record as instance triples: one atomic unit covering
    /// the record and every nested sub-record. Returns the minted
    /// instance IRI. The record's target class must be registered.
    pub async fn store_record(&self, record: &DataRecord) -> Result<Iri, EngineError> {
        let target_class = record_class(record)?;
        self.registry
            .resolve(&target_class)
            .await?
            .ok_or_else(|| EngineError::UnregisteredShape(target_class.clone()))?;

        let mut unit = self.client.begin_unit();
        let instance = self.record_to_unit(record, &target_class, &mut unit)?;
        self.client.commit(unit).await?;
        debug!(%instance, "record stored");
        Ok(instance)
    }

    /// Register the schema if needed, then persist the record
    pub async fn register_and_store(
        &self,
        schema: &SchemaDef,
        adapter: &dyn SchemaAdapter,
        record: &DataRecord,
    ) -> Result<Iri, EngineError> {
        self.register_schema(schema, adapter).await?;
        self.store_record(record).await
    }

    /// Independently re-validate a record against its registered shape.
    /// Validation failure is a report, not an error; errors mean the
    /// store or a nested shape was unreachable.
    pub async fn validate_record(
        &self,
        record: &DataRecord,
    ) -> Result<ValidationReport, EngineError> {
        let target_class = record_class(record)?;
        let shape = self
            .registry
            .resolve(&target_class)
            .await?
            .ok_or_else(|| EngineError::UnregisteredShape(target_class.clone()))?;
        let resolver = RegistryResolver {
            registry: self.registry.clone(),
        };
        Ok(self.validator.validate(record, &shape, &resolver).await?)
    }

    /// Fetch records of one class, optionally narrowed by a SPARQL
    /// filter fragment spliced into the graph pattern
    pub async fn fetch_records_matching(
        &self,
        target_class: &Iri,
        filter_fragment: Option<&str>,
    ) -> Result<Vec<DataRecord>, EngineError> {
        let graph = self.config.data_graph_iri(target_class);
        let query = records_query(&graph, target_class, filter_fragment);
        let rows = self.client.select(&query).await?;

        let mut grouped: BTreeMap<Iri, DataRecord> = BTreeMap::new();
        for row in rows {
            let (Some(Term::Iri(subject)), Some(Term::Iri(predicate)), Some(object)) =
                (row.get("s"), row.get("p"), row.get("o"))
            else {
                continue;
            };
            if predicate.as_str() == rdf::TYPE {
                continue;
            }
            let record = grouped
                .entry(subject.clone())
                .or_insert_with(|| DataRecord::new(target_class.clone()));
            let name = predicate.local_name().to_string();
            let value = term_to_value(object);
            match record.fields.get_mut(&name) {
                None => {
                    record.fields.insert(name, value);
                }
                Some(Value::Seq(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.clone();
                    *existing = Value::Seq(vec![first, value]);
                }
            }
        }
        Ok(grouped.into_values().collect())
    }

    /// Export the registered shape of one class as canonical Turtle
    pub async fn export_shape(&self, target_class: &Iri) -> Result<String, EngineError> {
        let graph = self.config.shapes_graph_iri(target_class);
        let triples = self.client.construct(&graph_dump_query(&graph)).await?;
        if triples.is_empty() {
            return Err(EngineError::UnregisteredShape(target_class.clone()));
        }
        let shape = self.generator.descriptor_from_triples(&triples)?;
        Ok(self.generator.export_turtle(&shape))
    }

    /// Drop the data graph of one class. Shape graphs are never
    /// deleted automatically.
    pub async fn clear_data(&self, target_class: &Iri) -> Result<(), EngineError> {
        let mut unit = self.client.begin_unit();
        unit.drop_graph(self.config.data_graph_iri(target_class));
        Ok(self.client.commit(unit).await?)
    }

    /// Lower a record into instance triples inside the unit, recursing
    /// through nested records. Each record mints a fresh instance IRI.
    fn record_to_unit(
        &self,
        record: &DataRecord,
        target_class: &Iri,
        unit: &mut TransactionUnit,
    ) -> Result<Iri, EngineError> {
        let graph = self.config.data_graph_iri(target_class);
        let instance = Iri::new(format!("{}/{}", target_class, Uuid::new_v4()));
        unit.insert(
            &graph,
            Triple::new(instance.clone(), Iri::new(rdf::TYPE), Term::Iri(target_class.clone())),
        );

        for (name, value) in &record.fields {
            let predicate = self.config.namespace.property_iri(name);
            self.value_to_unit(value, &instance, &predicate, &graph, name, unit)?;
        }
        Ok(instance)
    }

    fn value_to_unit(
        &self,
        value: &Value,
        instance: &Iri,
        predicate: &Iri,
        graph: &Iri,
        field: &str,
        unit: &mut TransactionUnit,
    ) -> Result<(), EngineError> {
        match value {
            Value::Seq(items) => {
                for item in items {
                    self.value_to_unit(item, instance, predicate, graph, field, unit)?;
                }
            }
            Value::Record(nested) => {
                let nested_class = nested.target_class.clone().ok_or_else(|| {
                    EngineError::UntypedRecord(format!(
                        "nested record under field '{}' carries no target class",
                        field
                    ))
                })?;
                let nested_iri = self.record_to_unit(nested, &nested_class, unit)?;
                unit.insert(
                    graph,
                    Triple::new(instance.clone(), predicate.clone(), Term::Iri(nested_iri)),
                );
            }
            scalar => {
                // every non-container value has a literal form
                if let Some(literal) = scalar.as_literal() {
                    unit.insert(
                        graph,
                        Triple::new(instance.clone(), predicate.clone(), Term::Literal(literal)),
                    );
                }
            }
        }
        Ok(())
    }
}

/// Resolver backed by the registry (and through it, the store)
struct RegistryResolver {
    registry: Arc<ShapeRegistry>,
}

#[async_trait]
impl ShapeResolver for RegistryResolver {
    async fn resolve(&self, target_class: &Iri) -> Result<Option<ShapeDescriptor>, ShapeError> {
        self.registry
            .resolve(target_class)
            .await
            .map(|shape| shape.map(|arc| (*arc).clone()))
            .map_err(|e| ShapeError::Resolver(e.to_string()))
    }
}

fn record_class(record: &DataRecord) -> Result<Iri, EngineError> {
    record
        .target_class
        .clone()
        .ok_or_else(|| EngineError::UntypedRecord("record carries no target class".to_string()))
}

/// SELECT query fetching every statement about instances of one class
pub fn records_query(graph: &Iri, target_class: &Iri, filter_fragment: Option<&str>) -> String {
    let filter = filter_fragment
        .map(|f| format!(" {}", f.trim()))
        .unwrap_or_default();
    format!(
        "SELECT ?s ?p ?o WHERE {{ GRAPH <{}> {{ ?s a <{}> . ?s ?p ?o .{} }} }}",
        graph, target_class, filter
    )
}

/// SPARQL binding term to a record value. IRI objects (nested instance
/// links) come back as their IRI string; they are not re-expanded into
/// nested records.
fn term_to_value(term: &Term) -> Value {
    match term {
        Term::Iri(iri) => Value::Str(iri.as_str().to_string()),
        Term::Blank(label) => Value::Str(format!("_:{}", label)),
        Term::Literal(lit) => match lit.datatype.as_ref().map(|d| d.as_str()) {
            Some(xsd::INTEGER) => lit
                .value
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Str(lit.value.clone())),
            Some(xsd::DECIMAL) => lit
                .value
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::Str(lit.value.clone())),
            Some(xsd::BOOLEAN) => Value::Bool(lit.value == "true"),
            Some(xsd::DATE_TIME) => Value::DateTime(lit.value.clone()),
            _ => Value::Str(lit.value.clone()),
        },
    }
}
