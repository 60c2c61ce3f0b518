mod common;

use common::MemoryStore;
use semagraph_core::descriptor::ConstraintKind;
use semagraph_core::model::{Iri, Namespace};
use semagraph_core::record::{DataRecord, Value};
use semagraph_core::vocab::rdf;
use semagraph_engine::{EngineError, SemanticEngine};
use semagraph_schema::{
    ConstraintDef, FieldDef, NumericBound, PrimitiveKind, SchemaDef, SchemaSet, TypeExpr,
};
use semagraph_store::StoreConfig;
use std::sync::Arc;

fn store_config() -> StoreConfig {
    StoreConfig::new("http://localhost:3030", "semantic")
        .with_namespace(Namespace::new("http://example.org/"))
}

fn engine_over(store: Arc<MemoryStore>) -> SemanticEngine {
    SemanticEngine::with_client(store, store_config())
}

fn person_schema() -> SchemaDef {
    SchemaDef::new("Person")
        .field(
            FieldDef::new("name", TypeExpr::Primitive(PrimitiveKind::Str))
                .with_constraint(ConstraintDef::MinLength(1)),
        )
        .field(
            FieldDef::new("age", TypeExpr::Primitive(PrimitiveKind::Int))
                .with_constraint(ConstraintDef::MinInclusive(NumericBound::Int(0)))
                .with_constraint(ConstraintDef::MaxExclusive(NumericBound::Int(150))),
        )
}

fn person_class() -> Iri {
    Iri::new("http://example.org/Person")
}

#[tokio::test]
async fn store_record_commits_one_unit_with_type_triple() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_over(store.clone());
    let adapter = SchemaSet::new().with(person_schema());
    engine
        .register_schema(&person_schema(), &adapter)
        .await
        .unwrap();
    let writes_before = store.update_count();

    let record = DataRecord::new(person_class())
        .set("name", "John")
        .set("age", 30i64);
    let instance = engine.store_record(&record).await.unwrap();

    assert_eq!(store.update_count(), writes_before + 1);
    let data = store.graph_triples("http://localhost:3030/semantic/data/Person");
    assert!(data.iter().any(|t| {
        t.subject == instance
            && t.predicate.as_str() == rdf::TYPE
            && t.object.as_iri() == Some(&person_class())
    }));
    assert!(data
        .iter()
        .any(|t| t.predicate.as_str() == "http://example.org/name"));
}

#[tokio::test]
async fn storing_an_unregistered_class_fails() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_over(store);
    let record = DataRecord::new(person_class()).set("name", "John");
    let err = engine.store_record(&record).await.unwrap_err();
    assert!(matches!(err, EngineError::UnregisteredShape(_)));
}

#[tokio::test]
async fn nested_records_land_in_the_same_unit() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_over(store.clone());

    let address = SchemaDef::new("Address").field(FieldDef::new(
        "state",
        TypeExpr::Primitive(PrimitiveKind::Str),
    ));
    let person = SchemaDef::new("Person").field(FieldDef::new(
        "addresses",
        TypeExpr::list(TypeExpr::Nested("Address".to_string())),
    ));
    let adapter = SchemaSet::new().with(address).with(person.clone());
    engine.register_schema(&person, &adapter).await.unwrap();
    let writes_before = store.update_count();

    let record = DataRecord::new(person_class()).set(
        "addresses",
        Value::Seq(vec![
            Value::Record(
                DataRecord::new(Iri::new("http://example.org/Address")).set("state", "NY"),
            ),
            Value::Record(
                DataRecord::new(Iri::new("http://example.org/Address")).set("state", "CA"),
            ),
        ]),
    );
    let instance = engine.store_record(&record).await.unwrap();

    // one commit covered the person and both nested addresses
    assert_eq!(store.update_count(), writes_before + 1);
    let person_graph = store.graph_triples("http://localhost:3030/semantic/data/Person");
    let address_graph = store.graph_triples("http://localhost:3030/semantic/data/Address");
    let links = person_graph
        .iter()
        .filter(|t| t.subject == instance && t.predicate.as_str() == "http://example.org/addresses")
        .count();
    assert_eq!(links, 2);
    let address_instances = address_graph
        .iter()
        .filter(|t| t.predicate.as_str() == rdf::TYPE)
        .count();
    assert_eq!(address_instances, 2);
}

#[tokio::test]
async fn nested_record_without_class_is_rejected_before_any_write() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_over(store.clone());
    let adapter = SchemaSet::new().with(person_schema());
    engine
        .register_schema(&person_schema(), &adapter)
        .await
        .unwrap();
    let writes_before = store.update_count();

    let record = DataRecord::new(person_class())
        .set("name", "John")
        .set("extra", Value::Record(DataRecord::untyped()));
    let err = engine.store_record(&record).await.unwrap_err();

    assert!(matches!(err, EngineError::UntypedRecord(_)));
    assert_eq!(store.update_count(), writes_before);
}

#[tokio::test]
async fn validate_record_resolves_shape_from_store() {
    let store = Arc::new(MemoryStore::new());
    let writer = engine_over(store.clone());
    let adapter = SchemaSet::new().with(person_schema());
    writer
        .register_schema(&person_schema(), &adapter)
        .await
        .unwrap();

    // separate engine, cold cache: the shape must come from the store
    let validator = engine_over(store.clone());
    let record = DataRecord::new(person_class())
        .set("name", "John")
        .set("age", -5i64);
    let report = validator.validate_record(&record).await.unwrap();

    assert!(!report.conforms());
    assert_eq!(report.violation_count(), 1);
    assert_eq!(report.results[0].path, "age");
    assert_eq!(report.results[0].kind, ConstraintKind::MinInclusive);
}

#[tokio::test]
async fn validating_an_unregistered_class_is_an_error_not_a_report() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_over(store);
    let record = DataRecord::new(person_class()).set("name", "John");
    let err = engine.validate_record(&record).await.unwrap_err();
    assert!(matches!(err, EngineError::UnregisteredShape(_)));
}

#[tokio::test]
async fn fetch_records_reassembles_stored_instances() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_over(store.clone());
    let adapter = SchemaSet::new().with(person_schema());
    engine
        .register_schema(&person_schema(), &adapter)
        .await
        .unwrap();

    engine
        .store_record(
            &DataRecord::new(person_class())
                .set("name", "John")
                .set("age", 30i64),
        )
        .await
        .unwrap();
    engine
        .store_record(
            &DataRecord::new(person_class())
                .set("name", "Mary")
                .set("age", 25i64),
        )
        .await
        .unwrap();

    let records = engine
        .fetch_records_matching(&person_class(), None)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    let mut names: Vec<String> = records
        .iter()
        .map(|r| match r.get("name") {
            Some(Value::Str(s)) => s.clone(),
            other => panic!("unexpected name value {:?}", other),
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["John", "Mary"]);
    assert!(records
        .iter()
        .all(|r| matches!(r.get("age"), Some(Value::Int(_)))));
}

#[tokio::test]
async fn export_shape_round_trips_through_turtle() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_over(store.clone());
    let adapter = SchemaSet::new().with(person_schema());
    let registered = engine
        .register_schema(&person_schema(), &adapter)
        .await
        .unwrap();

    let turtle = engine.export_shape(&person_class()).await.unwrap();
    assert!(turtle.contains("sh:minLength"));

    // import path: parse the export and compare hashes
    let generator = semagraph_shacl::ShapeGenerator::new(
        semagraph_shacl::GeneratorConfig::new(Namespace::new("http://example.org/")),
    );
    let imported = generator.import_turtle(&turtle).unwrap();
    assert_eq!(imported.content_hash(), registered[0].content_hash);
}

#[tokio::test]
async fn clear_data_drops_only_the_data_graph() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_over(store.clone());
    let adapter = SchemaSet::new().with(person_schema());
    engine
        .register_schema(&person_schema(), &adapter)
        .await
        .unwrap();
    engine
        .store_record(
            &DataRecord::new(person_class())
                .set("name", "John")
                .set("age", 30i64),
        )
        .await
        .unwrap();

    engine.clear_data(&person_class()).await.unwrap();

    assert_eq!(store.graph_len("http://localhost:3030/semantic/data/Person"), 0);
    assert!(store.graph_len("http://localhost:3030/semantic/shapes/Person") > 0);
}
