//! Constraint-shape descriptors
//!
//! `ShapeDescriptor` is the portable representation of a compiled schema:
//! one target class, an ordered set of field descriptors, and a content
//! hash computed over a canonical serialization. The hash is a pure
//! function of the descriptor's semantic content, so two independent
//! compilations of an unchanged schema always agree.

use crate::model::{Iri, Literal};
use crate::vocab::xsd;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Fixed datatype tags for primitive fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datatype {
    String,
    Integer,
    Decimal,
    Boolean,
    DateTime,
}

impl Datatype {
    pub fn iri(&self) -> Iri {
        let s = match self {
            Datatype::String => xsd::STRING,
            Datatype::Integer => xsd::INTEGER,
            Datatype::Decimal => xsd::DECIMAL,
            Datatype::Boolean => xsd::BOOLEAN,
            Datatype::DateTime => xsd::DATE_TIME,
        };
        Iri::new(s)
    }

    pub fn from_iri(iri: &Iri) -> Option<Self> {
        match iri.as_str() {
            xsd::STRING => Some(Datatype::String),
            xsd::INTEGER => Some(Datatype::Integer),
            xsd::DECIMAL => Some(Datatype::Decimal),
            xsd::BOOLEAN => Some(Datatype::Boolean),
            xsd::DATE_TIME => Some(Datatype::DateTime),
            _ => None,
        }
    }
}

/// Type tag of a field: primitive, container, union, or nested reference.
///
/// Nested schemas are always carried as references by target-class IRI,
/// never inlined, so cyclic schema graphs stay finite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTag {
    Primitive(Datatype),
    Optional(Box<FieldTag>),
    List(Box<FieldTag>),
    Union(Vec<FieldTag>),
    Nested(Iri),
}

impl FieldTag {
    /// Strip `Optional` wrappers down to the effective value tag
    pub fn unwrap_optional(&self) -> &FieldTag {
        match self {
            FieldTag::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, FieldTag::Optional(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.unwrap_optional(), FieldTag::List(_))
    }

    /// Nested target-class reference, if this tag (or its element/option
    /// content) is one
    pub fn nested_class(&self) -> Option<&Iri> {
        match self.unwrap_optional() {
            FieldTag::Nested(iri) => Some(iri),
            FieldTag::List(inner) => inner.nested_class(),
            _ => None,
        }
    }

    fn canonical_write(&self, out: &mut String) {
        match self {
            FieldTag::Primitive(dt) => {
                out.push_str("primitive:");
                out.push_str(dt.iri().as_str());
            }
            FieldTag::Optional(inner) => {
                out.push_str("optional(");
                inner.canonical_write(out);
                out.push(')');
            }
            FieldTag::List(inner) => {
                out.push_str("list(");
                inner.canonical_write(out);
                out.push(')');
            }
            FieldTag::Union(members) => {
                out.push_str("union(");
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    member.canonical_write(out);
                }
                out.push(')');
            }
            FieldTag::Nested(iri) => {
                out.push_str("nested:");
                out.push_str(iri.as_str());
            }
        }
    }
}

/// Enumerated constraint kinds. The first group is carried on
/// `ConstraintSpec`s; the remainder only appear in validation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    MinLength,
    MaxLength,
    Pattern,
    MinInclusive,
    MaxInclusive,
    MinExclusive,
    MaxExclusive,
    Required,
    In,
    OpaquePredicate,
    // result-only kinds
    Datatype,
    MaxCount,
    UnexpectedField,
}

impl ConstraintKind {
    /// Kebab-case name used in reports and canonical serializations
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::MinLength => "min-length",
            ConstraintKind::MaxLength => "max-length",
            ConstraintKind::Pattern => "pattern",
            ConstraintKind::MinInclusive => "min-inclusive",
            ConstraintKind::MaxInclusive => "max-inclusive",
            ConstraintKind::MinExclusive => "min-exclusive",
            ConstraintKind::MaxExclusive => "max-exclusive",
            ConstraintKind::Required => "required",
            ConstraintKind::In => "enumerated-values",
            ConstraintKind::OpaquePredicate => "opaque-predicate",
            ConstraintKind::Datatype => "datatype",
            ConstraintKind::MaxCount => "max-count",
            ConstraintKind::UnexpectedField => "unexpected-field",
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Constraint parameters, keyed by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintParam {
    Length(u64),
    Bound(Literal),
    Pattern(String),
    Values(Vec<Literal>),
    Predicate { name: String, source: String },
    None,
}

/// A single field constraint in the portable representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub kind: ConstraintKind,
    pub param: ConstraintParam,
    /// True when the constraint cannot be expressed in the target
    /// representation and is carried forward for diagnostics only
    pub unsupported: bool,
}

impl ConstraintSpec {
    pub fn min_length(n: u64) -> Self {
        ConstraintSpec {
            kind: ConstraintKind::MinLength,
            param: ConstraintParam::Length(n),
            unsupported: false,
        }
    }

    pub fn max_length(n: u64) -> Self {
        ConstraintSpec {
            kind: ConstraintKind::MaxLength,
            param: ConstraintParam::Length(n),
            unsupported: false,
        }
    }

    pub fn pattern<S: Into<String>>(pattern: S) -> Self {
        ConstraintSpec {
            kind: ConstraintKind::Pattern,
            param: ConstraintParam::Pattern(pattern.into()),
            unsupported: false,
        }
    }

    /// Numeric bound constraint; `kind` must be one of the four bound kinds
    pub fn bound(kind: ConstraintKind, value: Literal) -> Self {
        debug_assert!(matches!(
            kind,
            ConstraintKind::MinInclusive
                | ConstraintKind::MaxInclusive
                | ConstraintKind::MinExclusive
                | ConstraintKind::MaxExclusive
        ));
        ConstraintSpec {
            kind,
            param: ConstraintParam::Bound(value),
            unsupported: false,
        }
    }

    pub fn values(values: Vec<Literal>) -> Self {
        ConstraintSpec {
            kind: ConstraintKind::In,
            param: ConstraintParam::Values(values),
            unsupported: false,
        }
    }

    /// Opaque predicate carried in serialized form. Not executable in the
    /// target representation, so it is tagged unsupported from the start.
    pub fn opaque<S: Into<String>, T: Into<String>>(name: S, source: T) -> Self {
        ConstraintSpec {
            kind: ConstraintKind::OpaquePredicate,
            param: ConstraintParam::Predicate {
                name: name.into(),
                source: source.into(),
            },
            unsupported: true,
        }
    }

    /// Canonical token, also used as a stable sort key when a shape is
    /// rebuilt from triples
    pub fn canonical_token(&self) -> String {
        let mut out = String::new();
        self.canonical_write(&mut out);
        out
    }

    fn canonical_write(&self, out: &mut String) {
        out.push_str(self.kind.name());
        out.push('=');
        match &self.param {
            ConstraintParam::Length(n) => out.push_str(&n.to_string()),
            ConstraintParam::Bound(lit) => {
                out.push_str(&lit.value);
                if let Some(dt) = &lit.datatype {
                    out.push('^');
                    out.push_str(dt.as_str());
                }
            }
            ConstraintParam::Pattern(p) => out.push_str(p),
            ConstraintParam::Values(vals) => {
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&v.value);
                }
            }
            ConstraintParam::Predicate { name, source } => {
                out.push_str(name);
                out.push(':');
                out.push_str(source);
            }
            ConstraintParam::None => {}
        }
        if self.unsupported {
            out.push_str("!unsupported");
        }
    }
}

/// One field of a shape: name, type tag and ordered constraints.
/// Immutable once produced by introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub tag: FieldTag,
    pub constraints: Vec<ConstraintSpec>,
    pub required: bool,
    pub description: Option<String>,
}

impl FieldDescriptor {
    pub fn new<S: Into<String>>(name: S, tag: FieldTag) -> Self {
        FieldDescriptor {
            name: name.into(),
            tag,
            constraints: Vec::new(),
            required: true,
            description: None,
        }
    }

    /// Cardinality bounds implied by the type tag and required flag:
    /// `(min_count, max_count)`, `None` meaning unbounded
    pub fn cardinality(&self) -> (u64, Option<u64>) {
        let min = if self.required && !self.tag.is_optional() {
            1
        } else {
            0
        };
        let max = if self.tag.is_list() { None } else { Some(1) };
        (min, max)
    }

    fn canonical_write(&self, out: &mut String) {
        out.push_str("field ");
        out.push_str(&self.name);
        out.push(' ');
        self.tag.canonical_write(out);
        out.push_str(if self.required { " required" } else { " optional" });
        for constraint in &self.constraints {
            out.push(' ');
            constraint.canonical_write(out);
        }
        out.push('\n');
    }
}

/// Deterministic digest over a canonicalized `ShapeDescriptor`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let s = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(s, 16).ok()?;
        }
        Some(ContentHash(bytes))
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Portable constraint shape for one target class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub target_class: Iri,
    pub fields: Vec<FieldDescriptor>,
    /// Closed shapes reject fields not declared here
    pub closed: bool,
    pub description: Option<String>,
}

impl ShapeDescriptor {
    pub fn new(target_class: Iri) -> Self {
        ShapeDescriptor {
            target_class,
            fields: Vec::new(),
            closed: false,
            description: None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// True when any carried constraint is tagged unsupported
    pub fn has_unsupported_constraints(&self) -> bool {
        self.fields
            .iter()
            .any(|f| f.constraints.iter().any(|c| c.unsupported))
    }

    /// Canonical line serialization. Field order is schema declaration
    /// order and part of the identity; descriptions are documentation and
    /// deliberately excluded.
    pub fn canonical_string(&self) -> String {
        let mut out = String::new();
        out.push_str("shape ");
        out.push_str(self.target_class.as_str());
        out.push_str(if self.closed { " closed" } else { " open" });
        out.push('\n');
        for field in &self.fields {
            field.canonical_write(&mut out);
        }
        out
    }

    /// SHA-256 over the canonical serialization
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_string().as_bytes());
        ContentHash(hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_descriptor() -> ShapeDescriptor {
        let mut shape = ShapeDescriptor::new(Iri::new("http://example.org/Person"));
        let mut name = FieldDescriptor::new("name", FieldTag::Primitive(Datatype::String));
        name.constraints.push(ConstraintSpec::min_length(1));
        let mut age = FieldDescriptor::new("age", FieldTag::Primitive(Datatype::Integer));
        age.constraints.push(ConstraintSpec::bound(
            ConstraintKind::MinInclusive,
            Literal::integer(0),
        ));
        age.constraints.push(ConstraintSpec::bound(
            ConstraintKind::MaxExclusive,
            Literal::integer(150),
        ));
        shape.fields.push(name);
        shape.fields.push(age);
        shape
    }

    #[test]
    fn test_content_hash_is_deterministic() {
        assert_eq!(
            person_descriptor().content_hash(),
            person_descriptor().content_hash()
        );
    }

    #[test]
    fn test_content_hash_sees_constraint_changes() {
        let base = person_descriptor();
        let mut changed = person_descriptor();
        changed.fields[0].constraints[0] = ConstraintSpec::min_length(2);
        assert_ne!(base.content_hash(), changed.content_hash());
    }

    #[test]
    fn test_content_hash_ignores_descriptions() {
        let base = person_descriptor();
        let mut documented = person_descriptor();
        documented.description = Some("A person".to_string());
        documented.fields[0].description = Some("Full name".to_string());
        assert_eq!(base.content_hash(), documented.content_hash());
    }

    #[test]
    fn test_content_hash_sees_field_order() {
        let base = person_descriptor();
        let mut reordered = person_descriptor();
        reordered.fields.reverse();
        assert_ne!(base.content_hash(), reordered.content_hash());
    }

    #[test]
    fn test_hex_round_trip() {
        let hash = person_descriptor().content_hash();
        assert_eq!(ContentHash::from_hex(&hash.to_hex()), Some(hash));
    }

    #[test]
    fn test_cardinality() {
        let required = FieldDescriptor::new("name", FieldTag::Primitive(Datatype::String));
        assert_eq!(required.cardinality(), (1, Some(1)));

        let optional = FieldDescriptor::new(
            "nickname",
            FieldTag::Optional(Box::new(FieldTag::Primitive(Datatype::String))),
        );
        assert_eq!(optional.cardinality(), (0, Some(1)));

        let list = FieldDescriptor::new(
            "tags",
            FieldTag::List(Box::new(FieldTag::Primitive(Datatype::String))),
        );
        assert_eq!(list.cardinality(), (1, None));
    }

    #[test]
    fn test_nested_class_through_containers() {
        let address = Iri::new("http://example.org/Address");
        let tag = FieldTag::Optional(Box::new(FieldTag::List(Box::new(FieldTag::Nested(
            address.clone(),
        )))));
        assert_eq!(tag.nested_class(), Some(&address));
    }
}
