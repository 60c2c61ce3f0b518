//! # semagraph-engine
//!
//! The orchestration layer: a shape registry that gates store writes
//! behind content-hash checks and per-class critical sections, and the
//! `SemanticEngine` front door for registering schemas, persisting
//! records and re-validating them against stored shapes.

pub mod engine;
pub mod registry;

pub use engine::SemanticEngine;
pub use registry::{Registration, RegistrationOutcome, ShapeRegistry};

use semagraph_core::descriptor::ContentHash;
use semagraph_core::model::Iri;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] semagraph_store::StoreError),

    #[error(transparent)]
    Shape(#[from] semagraph_shacl::ShapeError),

    /// A concurrent writer committed a divergent shape for the same
    /// target class; retry with fresh state.
    #[error("Conflicting shape for {target_class}: attempted {ours}, store holds {theirs}")]
    ShapeConflict {
        target_class: Iri,
        ours: ContentHash,
        theirs: ContentHash,
    },

    #[error("No shape registered for target class {0}")]
    UnregisteredShape(Iri),

    #[error("Untyped record: {0}")]
    UntypedRecord(String),
}
