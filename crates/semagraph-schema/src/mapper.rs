//! Type and constraint mapping tables
//!
//! Pure, stateless translations from the declared schema vocabulary to
//! the portable constraint representation. No I/O happens here; the
//! only side effect is a diagnostic for constraints the target
//! representation cannot execute.

use crate::adapter::{ConstraintDef, NumericBound, PrimitiveKind, TypeExpr};
use crate::SchemaError;
use semagraph_core::descriptor::{ConstraintKind, ConstraintSpec, Datatype, FieldTag};
use semagraph_core::model::{Literal, Namespace};
use tracing::warn;

/// Maps declared types to datatype tags and field tags
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeMapper;

impl TypeMapper {
    /// Fixed primitive table
    pub fn map_primitive(&self, kind: PrimitiveKind) -> Datatype {
        match kind {
            PrimitiveKind::Str => Datatype::String,
            PrimitiveKind::Int => Datatype::Integer,
            PrimitiveKind::Float => Datatype::Decimal,
            PrimitiveKind::Bool => Datatype::Boolean,
            PrimitiveKind::DateTime => Datatype::DateTime,
        }
    }

    /// Map a full type expression. Nested references become target-class
    /// IRIs under the given namespace.
    pub fn map_type(&self, expr: &TypeExpr, namespace: &Namespace) -> Result<FieldTag, SchemaError> {
        match expr {
            TypeExpr::Primitive(kind) => Ok(FieldTag::Primitive(self.map_primitive(*kind))),
            TypeExpr::Optional(inner) => Ok(FieldTag::Optional(Box::new(
                self.map_type(inner, namespace)?,
            ))),
            TypeExpr::List(inner) => Ok(FieldTag::List(Box::new(self.map_type(inner, namespace)?))),
            TypeExpr::Union(members) => {
                let mapped = members
                    .iter()
                    .map(|member| self.map_type(member, namespace))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FieldTag::Union(mapped))
            }
            TypeExpr::Nested(name) => Ok(FieldTag::Nested(namespace.class_iri(name))),
            TypeExpr::Unclassified(declared) => Err(SchemaError::Introspection(format!(
                "declared type '{}' cannot be classified as primitive, optional, list, union or nested",
                declared
            ))),
        }
    }
}

/// Maps declared constraints to portable constraint specs
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintMapper;

impl ConstraintMapper {
    /// One-to-one for bounds, lengths, patterns and enumerations.
    /// Arbitrary predicates are carried as opaque specs tagged
    /// `unsupported`: reported, never dropped.
    pub fn map_constraint(&self, def: &ConstraintDef) -> ConstraintSpec {
        match def {
            ConstraintDef::MinLength(n) => ConstraintSpec::min_length(*n),
            ConstraintDef::MaxLength(n) => ConstraintSpec::max_length(*n),
            ConstraintDef::Pattern(pattern) => ConstraintSpec::pattern(pattern.clone()),
            ConstraintDef::MinInclusive(bound) => {
                ConstraintSpec::bound(ConstraintKind::MinInclusive, bound_literal(bound))
            }
            ConstraintDef::MaxInclusive(bound) => {
                ConstraintSpec::bound(ConstraintKind::MaxInclusive, bound_literal(bound))
            }
            ConstraintDef::MinExclusive(bound) => {
                ConstraintSpec::bound(ConstraintKind::MinExclusive, bound_literal(bound))
            }
            ConstraintDef::MaxExclusive(bound) => {
                ConstraintSpec::bound(ConstraintKind::MaxExclusive, bound_literal(bound))
            }
            ConstraintDef::In(values) => {
                ConstraintSpec::values(values.iter().map(|v| Literal::string(v.clone())).collect())
            }
            ConstraintDef::Predicate { name, source } => {
                warn!(
                    predicate = %name,
                    "constraint is not expressible in the target representation; carrying it as an opaque spec"
                );
                ConstraintSpec::opaque(name.clone(), source.clone())
            }
        }
    }
}

fn bound_literal(bound: &NumericBound) -> Literal {
    match bound {
        NumericBound::Int(i) => Literal::integer(*i),
        NumericBound::Decimal(d) => Literal::decimal(*d),
    }
}
