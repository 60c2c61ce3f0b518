//! # semagraph - schemas as shapes, stores as truth
//!
//! semagraph compiles typed, constrained schema definitions into SHACL
//! shapes, registers them (and conforming data instances) in a SPARQL
//! 1.1 store over HTTP, and independently re-validates instances
//! against the stored shapes - a defense-in-depth verifier, not a
//! pass-through.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use semagraph::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::new("http://localhost:3030", "semantic")
//!         .with_namespace(Namespace::new("http://example.org/"));
//!     let engine = SemanticEngine::new(config)?;
//!
//!     let person = SchemaDef::new("Person")
//!         .field(
//!             FieldDef::new("name", TypeExpr::Primitive(PrimitiveKind::Str))
//!                 .with_constraint(ConstraintDef::MinLength(1)),
//!         )
//!         .field(
//!             FieldDef::new("age", TypeExpr::Primitive(PrimitiveKind::Int))
//!                 .with_constraint(ConstraintDef::MinInclusive(NumericBound::Int(0))),
//!         );
//!     let adapter = SchemaSet::new().with(person.clone());
//!
//!     engine.register_schema(&person, &adapter).await?;
//!
//!     let record = DataRecord::new(Iri::new("http://example.org/Person"))
//!         .set("name", "John")
//!         .set("age", 30i64);
//!     engine.store_record(&record).await?;
//!
//!     let report = engine.validate_record(&record).await?;
//!     assert!(report.conforms());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`semagraph-core`**: RDF terms, shape descriptors, content
//!   hashes, Turtle transfer format
//! - **`semagraph-schema`**: schema introspection and type/constraint
//!   mapping tables
//! - **`semagraph-shacl`**: shape generation and the validation engine
//! - **`semagraph-store`**: SPARQL protocol client with atomic update
//!   units
//! - **`semagraph-engine`**: shape registry and orchestration
//!
//! ## Feature flags
//!
//! - `full` (default): everything
//! - `core` / `schema` / `shacl` / `store` / `engine`: individual layers

#[cfg(feature = "semagraph-core")]
pub use semagraph_core as core;

#[cfg(feature = "semagraph-schema")]
pub use semagraph_schema as schema;

#[cfg(feature = "semagraph-shacl")]
pub use semagraph_shacl as shacl;

#[cfg(feature = "semagraph-store")]
pub use semagraph_store as store;

#[cfg(feature = "semagraph-engine")]
pub use semagraph_engine as engine;

/// Commonly used types in one import
pub mod prelude {
    #[cfg(feature = "semagraph-core")]
    pub use semagraph_core::{
        ConstraintKind, ContentHash, DataRecord, Datatype, FieldDescriptor, FieldTag, Iri, Literal,
        Namespace, ShapeDescriptor, Term, Triple, Value,
    };

    #[cfg(feature = "semagraph-schema")]
    pub use semagraph_schema::{
        ConstraintDef, FieldDef, NumericBound, PrimitiveKind, SchemaAdapter, SchemaDef, SchemaSet,
        TypeExpr,
    };

    #[cfg(feature = "semagraph-shacl")]
    pub use semagraph_shacl::{
        GeneratorConfig, Severity, ShapeGenerator, ShapeResolver, ValidationEngine,
        ValidationReport, ValidationResult,
    };

    #[cfg(feature = "semagraph-store")]
    pub use semagraph_store::{
        GraphStoreClient, RetryPolicy, SparqlHttpClient, StoreConfig, TransactionUnit,
    };

    #[cfg(feature = "semagraph-engine")]
    pub use semagraph_engine::{
        Registration, RegistrationOutcome, SemanticEngine, ShapeRegistry,
    };
}
