//! # semagraph-core
//!
//! Shared data model for the semagraph stack:
//! - RDF terms, triples and vocabulary
//! - constraint-shape descriptors with deterministic content hashes
//! - data records (instances) and field paths
//! - the canonical Turtle transfer format

pub mod descriptor;
pub mod model;
pub mod record;
pub mod turtle;
pub mod vocab;

pub use descriptor::{
    ConstraintKind, ConstraintParam, ConstraintSpec, ContentHash, Datatype, FieldDescriptor,
    FieldTag, ShapeDescriptor,
};
pub use model::{Iri, Literal, Namespace, Term, Triple};
pub use record::{DataRecord, Value};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Turtle parse error: {0}")]
    TurtleParse(String),

    #[error("Invalid IRI: {0}")]
    InvalidIri(String),
}
