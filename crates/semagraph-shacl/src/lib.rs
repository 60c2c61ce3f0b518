//! # semagraph-shacl
//!
//! Shape generation and constraint validation:
//! - schema definitions compiled into SHACL shape descriptors and
//!   triple renderings (Generator)
//! - independent re-validation of data records against resolved shapes
//!   (ValidationEngine)
//! - validation reports (Report)

pub mod generate;
pub mod report;
pub mod validator;

pub use generate::{GeneratorConfig, ShapeGenerator};
pub use report::{Severity, ValidationReport, ValidationResult};
pub use validator::{ShapeResolver, StaticResolver, ValidationEngine};

use semagraph_core::model::Iri;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("Shape generation error: {0}")]
    Generation(String),

    #[error(transparent)]
    Schema(#[from] semagraph_schema::SchemaError),

    #[error("Unsupported constraint on field '{field}': {constraint}")]
    UnsupportedConstraint { field: String, constraint: String },

    #[error("Shape import error: {0}")]
    Import(String),

    #[error("No shape resolvable for target class {0}")]
    UnresolvedShape(Iri),

    #[error("Shape resolution failed: {0}")]
    Resolver(String),
}
