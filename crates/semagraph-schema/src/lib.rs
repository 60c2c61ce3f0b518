//! # semagraph-schema
//!
//! Decomposes declared schema definitions into portable field
//! descriptors: the adapter representation, the introspector, and the
//! pure type/constraint mapping tables.

pub mod adapter;
pub mod introspect;
pub mod mapper;

pub use adapter::{
    ConstraintDef, FieldDef, NumericBound, PrimitiveKind, SchemaAdapter, SchemaDef, SchemaSet,
    TypeExpr,
};
pub use introspect::ModelIntrospector;
pub use mapper::{ConstraintMapper, TypeMapper};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Introspection error: {0}")]
    Introspection(String),

    #[error("Schema '{referencing}' references unknown schema '{referenced}'")]
    UnknownSchema {
        referenced: String,
        referencing: String,
    },
}
