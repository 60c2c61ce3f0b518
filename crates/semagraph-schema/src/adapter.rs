//! Adapter-facing schema representation
//!
//! The core never reflects over a host type system. Whatever reflection,
//! code generation or manual declaration the host offers, an adapter
//! renders it into `SchemaDef` values and exposes them through the
//! `SchemaAdapter` lookup seam. Nested schemas are referenced by name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Primitive field kinds the taxonomy supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Str,
    Int,
    Float,
    Bool,
    DateTime,
}

/// Declared field type expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Primitive(PrimitiveKind),
    Optional(Box<TypeExpr>),
    List(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    /// Reference to another schema by name
    Nested(String),
    /// A declared type the adapter could not classify; introspection
    /// rejects schemas containing one
    Unclassified(String),
}

impl TypeExpr {
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Optional(Box::new(inner))
    }

    pub fn list(inner: TypeExpr) -> Self {
        TypeExpr::List(Box::new(inner))
    }
}

/// Numeric bound parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumericBound {
    Int(i64),
    Decimal(f64),
}

impl NumericBound {
    pub fn as_f64(&self) -> f64 {
        match self {
            NumericBound::Int(i) => *i as f64,
            NumericBound::Decimal(d) => *d,
        }
    }
}

/// Declared field constraint, mirroring the usual field-level validation
/// vocabulary of typed schema systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintDef {
    MinLength(u64),
    MaxLength(u64),
    Pattern(String),
    /// >=
    MinInclusive(NumericBound),
    /// <=
    MaxInclusive(NumericBound),
    /// >
    MinExclusive(NumericBound),
    /// <
    MaxExclusive(NumericBound),
    /// Value must be one of the listed string forms
    In(Vec<String>),
    /// Arbitrary validation logic, carried in serialized form
    Predicate { name: String, source: String },
}

/// One declared field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub type_expr: TypeExpr,
    pub required: bool,
    pub description: Option<String>,
    pub constraints: Vec<ConstraintDef>,
}

impl FieldDef {
    pub fn new<S: Into<String>>(name: S, type_expr: TypeExpr) -> Self {
        FieldDef {
            name: name.into(),
            type_expr,
            required: true,
            description: None,
            constraints: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_constraint(mut self, constraint: ConstraintDef) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// One declared schema: a named, ordered set of fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDef>,
}

impl SchemaDef {
    pub fn new<S: Into<String>>(name: S) -> Self {
        SchemaDef {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Names of schemas this one references through nested fields,
    /// in first-appearance order
    pub fn nested_schema_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for field in &self.fields {
            collect_nested(&field.type_expr, &mut names);
        }
        names
    }
}

fn collect_nested<'a>(expr: &'a TypeExpr, names: &mut Vec<&'a str>) {
    match expr {
        TypeExpr::Nested(name) => {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        TypeExpr::Optional(inner) | TypeExpr::List(inner) => collect_nested(inner, names),
        TypeExpr::Union(members) => {
            for member in members {
                collect_nested(member, names);
            }
        }
        TypeExpr::Primitive(_) | TypeExpr::Unclassified(_) => {}
    }
}

/// Lookup seam between the host type system and the core
pub trait SchemaAdapter: Sync {
    /// Resolve a schema by the name nested references use
    fn lookup(&self, name: &str) -> Option<&SchemaDef>;
}

/// Plain in-memory adapter; sufficient for hosts that declare their
/// schemas up front
#[derive(Debug, Default)]
pub struct SchemaSet {
    schemas: HashMap<String, SchemaDef>,
}

impl SchemaSet {
    pub fn new() -> Self {
        SchemaSet::default()
    }

    pub fn insert(&mut self, schema: SchemaDef) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn with(mut self, schema: SchemaDef) -> Self {
        self.insert(schema);
        self
    }
}

impl SchemaAdapter for SchemaSet {
    fn lookup(&self, name: &str) -> Option<&SchemaDef> {
        self.schemas.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_schema_names_deduplicate() {
        let schema = SchemaDef::new("Person")
            .field(FieldDef::new(
                "home",
                TypeExpr::Nested("Address".to_string()),
            ))
            .field(FieldDef::new(
                "work",
                TypeExpr::optional(TypeExpr::Nested("Address".to_string())),
            ))
            .field(FieldDef::new(
                "friends",
                TypeExpr::list(TypeExpr::Nested("Person".to_string())),
            ));
        assert_eq!(schema.nested_schema_names(), vec!["Address", "Person"]);
    }

    #[test]
    fn test_schema_set_lookup() {
        let set = SchemaSet::new().with(SchemaDef::new("Person"));
        assert!(set.lookup("Person").is_some());
        assert!(set.lookup("Address").is_none());
    }
}
