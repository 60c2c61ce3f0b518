//! Data instances
//!
//! A `DataRecord` is the store- and validator-facing form of one data
//! instance: a field-to-value map plus an optional target class binding.

use crate::descriptor::Datatype;
use crate::model::{Iri, Literal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A field value: scalar, ordered sequence, or nested record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 lexical form
    DateTime(String),
    Seq(Vec<Value>),
    Record(DataRecord),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "decimal",
            Value::Bool(_) => "boolean",
            Value::DateTime(_) => "dateTime",
            Value::Seq(_) => "sequence",
            Value::Record(_) => "record",
        }
    }

    /// Literal form for scalar values; sequences and records have none
    pub fn as_literal(&self) -> Option<Literal> {
        match self {
            Value::Str(s) => Some(Literal::typed(s.clone(), Datatype::String.iri())),
            Value::Int(i) => Some(Literal::integer(*i)),
            Value::Float(f) => Some(Literal::decimal(*f)),
            Value::Bool(b) => Some(Literal::boolean(*b)),
            Value::DateTime(s) => Some(Literal::typed(s.clone(), Datatype::DateTime.iri())),
            Value::Seq(_) | Value::Record(_) => None,
        }
    }

    /// Whether this scalar value inhabits the given datatype
    pub fn matches_datatype(&self, datatype: Datatype) -> bool {
        matches!(
            (self, datatype),
            (Value::Str(_), Datatype::String)
                | (Value::Int(_), Datatype::Integer)
                | (Value::Int(_), Datatype::Decimal)
                | (Value::Float(_), Datatype::Decimal)
                | (Value::Bool(_), Datatype::Boolean)
                | (Value::DateTime(_), Datatype::DateTime)
        )
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One data instance. Field iteration order is name order, which keeps
/// derived triples and reports deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataRecord {
    pub target_class: Option<Iri>,
    pub fields: BTreeMap<String, Value>,
}

impl DataRecord {
    pub fn new(target_class: Iri) -> Self {
        DataRecord {
            target_class: Some(target_class),
            fields: BTreeMap::new(),
        }
    }

    pub fn untyped() -> Self {
        DataRecord::default()
    }

    pub fn set<S: Into<String>, V: Into<Value>>(mut self, name: S, value: V) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Number of present values for a field: sequences count their
    /// elements, anything else counts as one
    pub fn value_count(&self, name: &str) -> usize {
        match self.fields.get(name) {
            None => 0,
            Some(Value::Seq(items)) => items.len(),
            Some(_) => 1,
        }
    }
}

/// Dotted/indexed field paths for validation results,
/// e.g. `addresses[1].state`
pub fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", parent, field)
    }
}

pub fn index_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}
