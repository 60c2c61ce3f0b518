//! Shape generation
//!
//! Compiles schema definitions into `ShapeDescriptor`s and renders
//! descriptors to and from SHACL triples. Generation is deterministic:
//! a fixed namespace and an unchanged schema always produce the same
//! content hash. Property shapes are named IRIs (`{shape}/prop/{field}`)
//! rather than blank nodes, so the triple rendering is stable, diffable
//! and round-trippable.

use crate::ShapeError;
use semagraph_core::descriptor::{
    ConstraintKind, ConstraintParam, ConstraintSpec, Datatype, FieldDescriptor, FieldTag,
    ShapeDescriptor,
};
use semagraph_core::model::{Iri, Literal, Namespace, Term, Triple};
use semagraph_core::turtle::{parse_turtle, write_turtle};
use semagraph_core::vocab::{rdf, rdfs, sg, sh, standard_prefixes};
use semagraph_schema::{ModelIntrospector, SchemaAdapter, SchemaDef};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Generator configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub namespace: Namespace,
    /// Generated shapes reject undeclared fields when set
    pub closed: bool,
    /// Escalate unsupported constraints to a generation error instead of
    /// carrying them as warnings
    pub strict_constraints: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            namespace: Namespace::default(),
            closed: false,
            strict_constraints: false,
        }
    }
}

impl GeneratorConfig {
    pub fn new(namespace: Namespace) -> Self {
        GeneratorConfig {
            namespace,
            ..GeneratorConfig::default()
        }
    }

    pub fn closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    pub fn strict_constraints(mut self, strict: bool) -> Self {
        self.strict_constraints = strict;
        self
    }
}

/// Compiles schemas into shape descriptors and SHACL triples
#[derive(Debug, Clone)]
pub struct ShapeGenerator {
    config: GeneratorConfig,
    introspector: ModelIntrospector,
}

impl ShapeGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let introspector = ModelIntrospector::new(config.namespace.clone());
        ShapeGenerator {
            config,
            introspector,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.config.namespace
    }

    /// Compile one schema. Pure for a fixed namespace: calling this twice
    /// on an unchanged schema yields descriptors with identical content
    /// hashes.
    pub fn generate(&self, schema: &SchemaDef) -> Result<ShapeDescriptor, ShapeError> {
        let fields = self.introspector.introspect(schema)?;
        let mut shape = ShapeDescriptor::new(self.config.namespace.class_iri(&schema.name));
        shape.closed = self.config.closed;
        shape.description = schema.description.clone();
        shape.fields = fields.into_iter().map(normalize_field).collect();

        if self.config.strict_constraints {
            for field in &shape.fields {
                if let Some(spec) = field.constraints.iter().find(|c| c.unsupported) {
                    return Err(ShapeError::UnsupportedConstraint {
                        field: field.name.clone(),
                        constraint: spec.canonical_token(),
                    });
                }
            }
        }

        debug!(target_class = %shape.target_class, hash = %shape.content_hash(), "generated shape");
        Ok(shape)
    }

    /// Compile a schema together with everything it references,
    /// children before parents. Cyclic schema graphs are fine: nested
    /// shapes are referenced by target class, never inlined.
    pub fn generate_closure(
        &self,
        root: &SchemaDef,
        adapter: &dyn SchemaAdapter,
    ) -> Result<Vec<ShapeDescriptor>, ShapeError> {
        let ordered = self
            .introspector
            .dependency_closure(root, adapter)
            .map_err(|e| ShapeError::Generation(e.to_string()))?;
        let mut shapes = Vec::with_capacity(ordered.len());
        for schema in ordered {
            let shape = if schema.name == root.name {
                self.generate(schema)?
            } else {
                self.generate(schema)
                    .map_err(|e| ShapeError::Generation(format!(
                        "nested schema '{}' failed to generate: {}",
                        schema.name, e
                    )))?
            };
            shapes.push(shape);
        }
        Ok(shapes)
    }

    /// Render a descriptor to its SHACL triple set
    pub fn descriptor_to_triples(&self, shape: &ShapeDescriptor) -> Vec<Triple> {
        let ns = &self.config.namespace;
        let shape_iri = ns.shape_iri(&shape.target_class);
        let mut triples = Vec::new();

        emit(&mut triples, &shape_iri, rdf::TYPE, Term::iri(sh::NODE_SHAPE));
        emit(
            &mut triples,
            &shape_iri,
            sh::TARGET_CLASS,
            Term::Iri(shape.target_class.clone()),
        );
        if let Some(description) = &shape.description {
            emit(
                &mut triples,
                &shape_iri,
                rdfs::COMMENT,
                Term::Literal(Literal::string(description.clone())),
            );
        }
        if shape.closed {
            emit(
                &mut triples,
                &shape_iri,
                sh::CLOSED,
                Term::Literal(Literal::boolean(true)),
            );
        }

        for (index, field) in shape.fields.iter().enumerate() {
            let prop = Iri::new(format!("{}/prop/{}", shape_iri, field.name));
            emit(&mut triples, &shape_iri, sh::PROPERTY, Term::Iri(prop.clone()));
            emit(&mut triples, &prop, rdf::TYPE, Term::iri(sh::PROPERTY_SHAPE));
            emit(
                &mut triples,
                &prop,
                sh::PATH,
                Term::Iri(ns.property_iri(&field.name)),
            );
            emit(
                &mut triples,
                &prop,
                sh::ORDER,
                Term::Literal(Literal::integer(index as i64)),
            );
            if let Some(description) = &field.description {
                emit(
                    &mut triples,
                    &prop,
                    sh::DESCRIPTION,
                    Term::Literal(Literal::string(description.clone())),
                );
            }

            let (min_count, max_count) = field.cardinality();
            if min_count > 0 {
                emit(
                    &mut triples,
                    &prop,
                    sh::MIN_COUNT,
                    Term::Literal(Literal::integer(min_count as i64)),
                );
            }
            if let Some(max) = max_count {
                emit(
                    &mut triples,
                    &prop,
                    sh::MAX_COUNT,
                    Term::Literal(Literal::integer(max as i64)),
                );
            }

            self.push_value_tag(&mut triples, &prop, value_tag(&field.tag));

            for spec in &field.constraints {
                self.push_constraint(&mut triples, &prop, spec);
            }
        }
        triples
    }

    fn push_value_tag(&self, triples: &mut Vec<Triple>, prop: &Iri, tag: &FieldTag) {
        let ns = &self.config.namespace;
        match tag {
            FieldTag::Primitive(dt) => emit(triples, prop, sh::DATATYPE, Term::Iri(dt.iri())),
            FieldTag::Nested(class) => {
                emit(triples, prop, sh::CLASS, Term::Iri(class.clone()));
                emit(triples, prop, sh::NODE, Term::Iri(ns.shape_iri(class)));
            }
            FieldTag::Union(members) => {
                // sh:or over an RDF list of named member fragments
                for (i, member) in members.iter().enumerate() {
                    let cell = Iri::new(format!("{}/or/cell{}", prop, i));
                    let fragment = Iri::new(format!("{}/or/{}", prop, i));
                    if i == 0 {
                        emit(triples, prop, sh::OR, Term::Iri(cell.clone()));
                    }
                    emit(triples, &cell, rdf::FIRST, Term::Iri(fragment.clone()));
                    let rest = if i + 1 < members.len() {
                        Term::iri(format!("{}/or/cell{}", prop, i + 1))
                    } else {
                        Term::iri(rdf::NIL)
                    };
                    emit(triples, &cell, rdf::REST, rest);
                    self.push_value_tag(triples, &fragment, value_tag(member));
                }
            }
            // containers are encoded through cardinality, so only their
            // element tag reaches this point
            FieldTag::Optional(inner) | FieldTag::List(inner) => {
                self.push_value_tag(triples, prop, value_tag(inner))
            }
        }
    }

    fn push_constraint(&self, triples: &mut Vec<Triple>, prop: &Iri, spec: &ConstraintSpec) {
        match (&spec.kind, &spec.param) {
            (ConstraintKind::MinLength, ConstraintParam::Length(n)) => emit(
                triples,
                prop,
                sh::MIN_LENGTH,
                Term::Literal(Literal::integer(*n as i64)),
            ),
            (ConstraintKind::MaxLength, ConstraintParam::Length(n)) => emit(
                triples,
                prop,
                sh::MAX_LENGTH,
                Term::Literal(Literal::integer(*n as i64)),
            ),
            (ConstraintKind::Pattern, ConstraintParam::Pattern(pattern)) => emit(
                triples,
                prop,
                sh::PATTERN,
                Term::Literal(Literal::string(pattern.clone())),
            ),
            (ConstraintKind::MinInclusive, ConstraintParam::Bound(lit)) => {
                emit(triples, prop, sh::MIN_INCLUSIVE, Term::Literal(lit.clone()))
            }
            (ConstraintKind::MaxInclusive, ConstraintParam::Bound(lit)) => {
                emit(triples, prop, sh::MAX_INCLUSIVE, Term::Literal(lit.clone()))
            }
            (ConstraintKind::MinExclusive, ConstraintParam::Bound(lit)) => {
                emit(triples, prop, sh::MIN_EXCLUSIVE, Term::Literal(lit.clone()))
            }
            (ConstraintKind::MaxExclusive, ConstraintParam::Bound(lit)) => {
                emit(triples, prop, sh::MAX_EXCLUSIVE, Term::Literal(lit.clone()))
            }
            (ConstraintKind::In, ConstraintParam::Values(values)) => {
                for (i, value) in values.iter().enumerate() {
                    let cell = Iri::new(format!("{}/in/cell{}", prop, i));
                    if i == 0 {
                        emit(triples, prop, sh::IN, Term::Iri(cell.clone()));
                    }
                    emit(triples, &cell, rdf::FIRST, Term::Literal(value.clone()));
                    let rest = if i + 1 < values.len() {
                        Term::iri(format!("{}/in/cell{}", prop, i + 1))
                    } else {
                        Term::iri(rdf::NIL)
                    };
                    emit(triples, &cell, rdf::REST, rest);
                }
            }
            (ConstraintKind::OpaquePredicate, ConstraintParam::Predicate { name, source }) => {
                let node = Iri::new(format!("{}/predicate/{}", prop, name));
                emit(triples, prop, sg::PREDICATE, Term::Iri(node.clone()));
                emit(
                    triples,
                    &node,
                    sg::PREDICATE_NAME,
                    Term::Literal(Literal::string(name.clone())),
                );
                emit(
                    triples,
                    &node,
                    sg::PREDICATE_SOURCE,
                    Term::Literal(Literal::string(source.clone())),
                );
            }
            // no triple form; these kinds never appear on generated specs
            _ => {}
        }
    }

    /// Rebuild a descriptor from its SHACL triple set.
    ///
    /// Inverse of `descriptor_to_triples` for graphs this generator
    /// produced; the rebuilt descriptor hashes identically to the
    /// exported one.
    pub fn descriptor_from_triples(&self, triples: &[Triple]) -> Result<ShapeDescriptor, ShapeError> {
        let index = TripleIndex::new(triples);

        let shape_iri = index
            .subject_with(rdf::TYPE, sh::NODE_SHAPE)
            .ok_or_else(|| ShapeError::Import("no node shape in triple set".to_string()))?;
        let target_class = index
            .first_iri(shape_iri, sh::TARGET_CLASS)
            .ok_or_else(|| ShapeError::Import("node shape has no target class".to_string()))?
            .clone();

        let mut shape = ShapeDescriptor::new(target_class);
        shape.description = index
            .first_literal(shape_iri, rdfs::COMMENT)
            .map(|lit| lit.value.clone());
        shape.closed = index
            .first_literal(shape_iri, sh::CLOSED)
            .is_some_and(|lit| lit.value == "true");

        // sh:order recovers declaration order lost to canonical sorting
        let mut ordered_props: BTreeMap<i64, &Iri> = BTreeMap::new();
        for prop in index.iris(shape_iri, sh::PROPERTY) {
            let order = index
                .first_literal(prop, sh::ORDER)
                .and_then(|lit| lit.value.parse::<i64>().ok())
                .unwrap_or(i64::MAX);
            ordered_props.insert(order, prop);
        }

        for prop in ordered_props.values() {
            shape.fields.push(self.field_from_triples(&index, prop)?);
        }
        Ok(shape)
    }

    fn field_from_triples(
        &self,
        index: &TripleIndex<'_>,
        prop: &Iri,
    ) -> Result<FieldDescriptor, ShapeError> {
        let path = index
            .first_iri(prop, sh::PATH)
            .ok_or_else(|| ShapeError::Import(format!("property shape {} has no path", prop)))?;
        let name = path.local_name().to_string();

        let min_count = index
            .first_literal(prop, sh::MIN_COUNT)
            .and_then(|lit| lit.value.parse::<u64>().ok())
            .unwrap_or(0);
        let max_count = index
            .first_literal(prop, sh::MAX_COUNT)
            .and_then(|lit| lit.value.parse::<u64>().ok());

        let element = self.tag_from_triples(index, prop)?;
        let tag = if max_count.is_none() {
            FieldTag::List(Box::new(element))
        } else {
            element
        };

        let mut field = FieldDescriptor::new(name, tag);
        field.required = min_count > 0;
        field.description = index
            .first_literal(prop, sh::DESCRIPTION)
            .map(|lit| lit.value.clone());

        let mut constraints = Vec::new();
        if let Some(lit) = index.first_literal(prop, sh::MIN_LENGTH) {
            if let Ok(n) = lit.value.parse() {
                constraints.push(ConstraintSpec::min_length(n));
            }
        }
        if let Some(lit) = index.first_literal(prop, sh::MAX_LENGTH) {
            if let Ok(n) = lit.value.parse() {
                constraints.push(ConstraintSpec::max_length(n));
            }
        }
        if let Some(lit) = index.first_literal(prop, sh::PATTERN) {
            constraints.push(ConstraintSpec::pattern(lit.value.clone()));
        }
        for (kind, predicate) in [
            (ConstraintKind::MinInclusive, sh::MIN_INCLUSIVE),
            (ConstraintKind::MaxInclusive, sh::MAX_INCLUSIVE),
            (ConstraintKind::MinExclusive, sh::MIN_EXCLUSIVE),
            (ConstraintKind::MaxExclusive, sh::MAX_EXCLUSIVE),
        ] {
            if let Some(lit) = index.first_literal(prop, predicate) {
                constraints.push(ConstraintSpec::bound(kind, lit.clone()));
            }
        }
        if let Some(head) = index.first_iri(prop, sh::IN) {
            let values = index
                .walk_list(head)
                .into_iter()
                .filter_map(|term| term.as_literal().cloned())
                .collect::<Vec<_>>();
            if !values.is_empty() {
                constraints.push(ConstraintSpec::values(values));
            }
        }
        for node in index.iris(prop, sg::PREDICATE) {
            let name = index
                .first_literal(node, sg::PREDICATE_NAME)
                .map(|lit| lit.value.clone())
                .unwrap_or_default();
            let source = index
                .first_literal(node, sg::PREDICATE_SOURCE)
                .map(|lit| lit.value.clone())
                .unwrap_or_default();
            constraints.push(ConstraintSpec::opaque(name, source));
        }
        field.constraints = sort_constraints(constraints);
        Ok(field)
    }

    fn tag_from_triples(&self, index: &TripleIndex<'_>, node: &Iri) -> Result<FieldTag, ShapeError> {
        if let Some(head) = index.first_iri(node, sh::OR) {
            let mut members = Vec::new();
            for term in index.walk_list(head) {
                let fragment = term.as_iri().ok_or_else(|| {
                    ShapeError::Import(format!("sh:or member of {} is not an IRI", node))
                })?;
                members.push(self.tag_from_triples(index, fragment)?);
            }
            return Ok(FieldTag::Union(members));
        }
        if let Some(class) = index.first_iri(node, sh::CLASS) {
            return Ok(FieldTag::Nested(class.clone()));
        }
        if let Some(datatype_iri) = index.first_iri(node, sh::DATATYPE) {
            let datatype = Datatype::from_iri(datatype_iri).ok_or_else(|| {
                ShapeError::Import(format!("unknown datatype {}", datatype_iri))
            })?;
            return Ok(FieldTag::Primitive(datatype));
        }
        Err(ShapeError::Import(format!(
            "property shape {} has no value type",
            node
        )))
    }

    /// Export a descriptor as canonical Turtle
    pub fn export_turtle(&self, shape: &ShapeDescriptor) -> String {
        write_turtle(&self.descriptor_to_triples(shape), &standard_prefixes())
    }

    /// Import a descriptor from Turtle produced by `export_turtle`
    pub fn import_turtle(&self, turtle: &str) -> Result<ShapeDescriptor, ShapeError> {
        let triples = parse_turtle(turtle).map_err(|e| ShapeError::Import(e.to_string()))?;
        self.descriptor_from_triples(&triples)
    }
}

/// Effective value tag: optional wrappers stripped, list elements
/// surfaced
fn value_tag(tag: &FieldTag) -> &FieldTag {
    match tag.unwrap_optional() {
        FieldTag::List(inner) => inner.unwrap_optional(),
        other => other,
    }
}

/// Normalization folds `Optional` wrappers into the required flag and a
/// canonical constraint order, so independently generated and rebuilt
/// descriptors agree on the canonical form.
fn normalize_field(mut field: FieldDescriptor) -> FieldDescriptor {
    if field.tag.is_optional() {
        field.required = false;
    }
    field.tag = normalize_tag(&field.tag);
    field.constraints = sort_constraints(field.constraints);
    field
}

fn normalize_tag(tag: &FieldTag) -> FieldTag {
    match tag.unwrap_optional() {
        FieldTag::List(inner) => FieldTag::List(Box::new(normalize_tag(inner))),
        // union members carry no cardinality of their own in the target
        // representation, so they normalize to their value tag
        FieldTag::Union(members) => FieldTag::Union(
            members
                .iter()
                .map(|member| normalize_tag(value_tag(member)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn emit(triples: &mut Vec<Triple>, subject: &Iri, predicate: &str, object: Term) {
    triples.push(Triple::new(subject.clone(), Iri::new(predicate), object));
}

fn sort_constraints(mut constraints: Vec<ConstraintSpec>) -> Vec<ConstraintSpec> {
    constraints.sort_by_key(|c| c.canonical_token());
    constraints
}

/// Subject/predicate lookup over a borrowed triple set
struct TripleIndex<'a> {
    by_subject: HashMap<&'a Iri, Vec<&'a Triple>>,
}

impl<'a> TripleIndex<'a> {
    fn new(triples: &'a [Triple]) -> Self {
        let mut by_subject: HashMap<&'a Iri, Vec<&'a Triple>> = HashMap::new();
        for triple in triples {
            by_subject.entry(&triple.subject).or_default().push(triple);
        }
        TripleIndex { by_subject }
    }

    fn objects(&self, subject: &Iri, predicate: &str) -> impl Iterator<Item = &'a Term> + '_ {
        let predicate = predicate.to_string();
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .filter(move |t| t.predicate.as_str() == predicate)
            .map(|t| &t.object)
    }

    fn iris(&self, subject: &Iri, predicate: &str) -> Vec<&'a Iri> {
        let mut iris: Vec<&'a Iri> = self
            .objects(subject, predicate)
            .filter_map(|term| term.as_iri())
            .collect();
        iris.sort();
        iris
    }

    fn first_iri(&self, subject: &Iri, predicate: &str) -> Option<&'a Iri> {
        self.objects(subject, predicate)
            .find_map(|term| term.as_iri())
    }

    fn first_literal(&self, subject: &Iri, predicate: &str) -> Option<&'a semagraph_core::model::Literal> {
        self.objects(subject, predicate)
            .find_map(|term| term.as_literal())
    }

    fn subject_with(&self, predicate: &str, object_iri: &str) -> Option<&'a Iri> {
        let mut matches: Vec<&'a Iri> = self
            .by_subject
            .iter()
            .filter(|(_, triples)| {
                triples.iter().any(|t| {
                    t.predicate.as_str() == predicate
                        && t.object.as_iri().is_some_and(|iri| iri.as_str() == object_iri)
                })
            })
            .map(|(subject, _)| *subject)
            .collect();
        matches.sort();
        matches.into_iter().next()
    }

    /// Follow rdf:first/rdf:rest cells to the end of a list
    fn walk_list(&self, head: &Iri) -> Vec<&'a Term> {
        let mut items = Vec::new();
        let mut cell = head.clone();
        loop {
            if let Some(first) = self.objects(&cell, rdf::FIRST).next() {
                items.push(first);
            } else {
                break;
            }
            match self.first_iri(&cell, rdf::REST) {
                Some(rest) if rest.as_str() != rdf::NIL => cell = rest.clone(),
                _ => break,
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semagraph_schema::{ConstraintDef, FieldDef, NumericBound, PrimitiveKind, SchemaSet, TypeExpr};

    fn generator() -> ShapeGenerator {
        ShapeGenerator::new(GeneratorConfig::new(Namespace::new("http://example.org/")))
    }

    fn person() -> SchemaDef {
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

    #[test]
    fn test_generate_is_idempotent() {
        let gen = generator();
        let first = gen.generate(&person()).unwrap();
        let second = gen.generate(&person()).unwrap();
        assert_eq!(first.content_hash(), second.content_hash());
    }

    #[test]
    fn test_triples_round_trip_preserves_hash() {
        let gen = generator();
        let shape = gen.generate(&person()).unwrap();
        let triples = gen.descriptor_to_triples(&shape);
        let rebuilt = gen.descriptor_from_triples(&triples).unwrap();
        assert_eq!(shape.content_hash(), rebuilt.content_hash());
    }

    #[test]
    fn test_turtle_round_trip_preserves_hash() {
        let gen = generator();
        let shape = gen.generate(&person()).unwrap();
        let turtle = gen.export_turtle(&shape);
        let rebuilt = gen.import_turtle(&turtle).unwrap();
        assert_eq!(shape.content_hash(), rebuilt.content_hash());
    }

    #[test]
    fn test_field_order_survives_round_trip() {
        let gen = generator();
        let shape = gen.generate(&person()).unwrap();
        let rebuilt = gen
            .descriptor_from_triples(&gen.descriptor_to_triples(&shape))
            .unwrap();
        let names: Vec<&str> = rebuilt.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age"]);
    }

    #[test]
    fn test_self_referential_schema_generates() {
        let node = SchemaDef::new("Node")
            .field(FieldDef::new("label", TypeExpr::Primitive(PrimitiveKind::Str)))
            .field(
                FieldDef::new(
                    "next",
                    TypeExpr::optional(TypeExpr::Nested("Node".to_string())),
                )
                .optional(),
            );
        let set = SchemaSet::new().with(node.clone());
        let gen = generator();
        let shapes = gen.generate_closure(&node, &set).unwrap();
        assert_eq!(shapes.len(), 1);
        let next = shapes[0].field("next").unwrap();
        assert_eq!(
            next.tag.nested_class(),
            Some(&Iri::new("http://example.org/Node"))
        );
        assert!(!next.required);
    }

    #[test]
    fn test_closure_generates_children_first() {
        let address = SchemaDef::new("Address").field(FieldDef::new(
            "state",
            TypeExpr::Primitive(PrimitiveKind::Str),
        ));
        let person = SchemaDef::new("Person").field(FieldDef::new(
            "addresses",
            TypeExpr::list(TypeExpr::Nested("Address".to_string())),
        ));
        let set = SchemaSet::new().with(address).with(person.clone());
        let shapes = generator().generate_closure(&person, &set).unwrap();
        assert_eq!(shapes[0].target_class.local_name(), "Address");
        assert_eq!(shapes[1].target_class.local_name(), "Person");
    }

    #[test]
    fn test_missing_nested_schema_is_generation_error() {
        let person = SchemaDef::new("Person").field(FieldDef::new(
            "home",
            TypeExpr::Nested("Address".to_string()),
        ));
        let set = SchemaSet::new().with(person.clone());
        let err = generator().generate_closure(&person, &set).unwrap_err();
        assert!(matches!(err, ShapeError::Generation(_)));
    }

    #[test]
    fn test_opaque_predicate_is_carried_not_dropped() {
        let schema = SchemaDef::new("Account").field(
            FieldDef::new("code", TypeExpr::Primitive(PrimitiveKind::Str)).with_constraint(
                ConstraintDef::Predicate {
                    name: "code_checksum".to_string(),
                    source: "lambda v: checksum(v)".to_string(),
                },
            ),
        );
        let gen = generator();
        let shape = gen.generate(&schema).unwrap();
        assert!(shape.has_unsupported_constraints());

        let rebuilt = gen
            .descriptor_from_triples(&gen.descriptor_to_triples(&shape))
            .unwrap();
        assert!(rebuilt.has_unsupported_constraints());
        assert_eq!(shape.content_hash(), rebuilt.content_hash());
    }

    #[test]
    fn test_strict_mode_rejects_opaque_predicates() {
        let schema = SchemaDef::new("Account").field(
            FieldDef::new("code", TypeExpr::Primitive(PrimitiveKind::Str)).with_constraint(
                ConstraintDef::Predicate {
                    name: "code_checksum".to_string(),
                    source: "lambda v: checksum(v)".to_string(),
                },
            ),
        );
        let gen = ShapeGenerator::new(
            GeneratorConfig::new(Namespace::new("http://example.org/")).strict_constraints(true),
        );
        assert!(matches!(
            gen.generate(&schema),
            Err(ShapeError::UnsupportedConstraint { .. })
        ));
    }

    #[test]
    fn test_union_round_trip() {
        let schema = SchemaDef::new("Event").field(FieldDef::new(
            "payload",
            TypeExpr::Union(vec![
                TypeExpr::Primitive(PrimitiveKind::Str),
                TypeExpr::Primitive(PrimitiveKind::Int),
            ]),
        ));
        let gen = generator();
        let shape = gen.generate(&schema).unwrap();
        let rebuilt = gen
            .descriptor_from_triples(&gen.descriptor_to_triples(&shape))
            .unwrap();
        assert_eq!(shape.content_hash(), rebuilt.content_hash());
        match &rebuilt.field("payload").unwrap().tag {
            FieldTag::Union(members) => assert_eq!(members.len(), 2),
            other => panic!("expected union tag, got {:?}", other),
        }
    }

    #[test]
    fn test_enumerated_values_round_trip() {
        let schema = SchemaDef::new("Ticket").field(
            FieldDef::new("status", TypeExpr::Primitive(PrimitiveKind::Str)).with_constraint(
                ConstraintDef::In(vec!["open".to_string(), "closed".to_string()]),
            ),
        );
        let gen = generator();
        let shape = gen.generate(&schema).unwrap();
        let rebuilt = gen
            .descriptor_from_triples(&gen.descriptor_to_triples(&shape))
            .unwrap();
        assert_eq!(shape.content_hash(), rebuilt.content_hash());
    }
}
