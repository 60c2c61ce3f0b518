//! Constraint validation engine
//!
//! Re-checks every constraint of a resolved shape against a data
//! record, independent of whatever enforcement the record's origin
//! schema performed. All applicable constraints are evaluated, with no
//! early exit, so the report is complete. Nested and union fields
//! recurse through the `ShapeResolver` seam; a per-path visited set
//! short-circuits re-entered target classes so cyclic shape graphs
//! terminate.

use crate::report::{ValidationReport, ValidationResult};
use crate::ShapeError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use regex::Regex;
use semagraph_core::descriptor::{
    ConstraintKind, ConstraintParam, ConstraintSpec, FieldDescriptor, FieldTag, ShapeDescriptor,
};
use semagraph_core::model::Iri;
use semagraph_core::record::{index_path, join_path, DataRecord, Value};
use std::collections::HashSet;
use tracing::debug;

/// Seam through which nested shape references are resolved, typically
/// backed by the shape registry and the graph store
#[async_trait]
pub trait ShapeResolver: Send + Sync {
    async fn resolve(&self, target_class: &Iri) -> Result<Option<ShapeDescriptor>, ShapeError>;
}

/// Resolver over a fixed set of descriptors; enough for validation
/// paths that never leave local state
#[derive(Debug, Default)]
pub struct StaticResolver {
    shapes: Vec<ShapeDescriptor>,
}

impl StaticResolver {
    pub fn new(shapes: Vec<ShapeDescriptor>) -> Self {
        StaticResolver { shapes }
    }
}

#[async_trait]
impl ShapeResolver for StaticResolver {
    async fn resolve(&self, target_class: &Iri) -> Result<Option<ShapeDescriptor>, ShapeError> {
        Ok(self
            .shapes
            .iter()
            .find(|s| &s.target_class == target_class)
            .cloned())
    }
}

/// Stateless validation engine; instances may run concurrently without
/// coordination
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        ValidationEngine
    }

    /// Validate one record against a resolved shape.
    ///
    /// Data-level problems land in the report; only infrastructure
    /// failures (an unresolvable nested shape) surface as errors.
    pub async fn validate(
        &self,
        record: &DataRecord,
        shape: &ShapeDescriptor,
        resolver: &dyn ShapeResolver,
    ) -> Result<ValidationReport, ShapeError> {
        let mut report = ValidationReport::new();
        let mut visited = HashSet::new();
        visited.insert(shape.target_class.clone());
        self.validate_record(record, shape, resolver, "", &mut visited, &mut report)
            .await?;
        debug!(
            target_class = %shape.target_class,
            violations = report.violation_count(),
            warnings = report.warning_count(),
            "validation finished"
        );
        Ok(report)
    }

    fn validate_record<'a>(
        &'a self,
        record: &'a DataRecord,
        shape: &'a ShapeDescriptor,
        resolver: &'a dyn ShapeResolver,
        path: &'a str,
        visited: &'a mut HashSet<Iri>,
        report: &'a mut ValidationReport,
    ) -> BoxFuture<'a, Result<(), ShapeError>> {
        Box::pin(async move {
            for field in &shape.fields {
                self.validate_field(record, field, resolver, path, visited, report)
                    .await?;
            }

            if shape.closed {
                for name in record.fields.keys() {
                    if shape.field(name).is_none() {
                        report.results.push(ValidationResult::violation(
                            join_path(path, name),
                            ConstraintKind::UnexpectedField,
                            format!("field '{}' is not declared by the shape", name),
                        ));
                    }
                }
            }
            Ok(())
        })
    }

    async fn validate_field(
        &self,
        record: &DataRecord,
        field: &FieldDescriptor,
        resolver: &dyn ShapeResolver,
        parent_path: &str,
        visited: &mut HashSet<Iri>,
        report: &mut ValidationReport,
    ) -> Result<(), ShapeError> {
        let field_path = join_path(parent_path, &field.name);
        let (min_count, max_count) = field.cardinality();
        let count = record.value_count(&field.name) as u64;

        if count < min_count {
            report.results.push(ValidationResult::violation(
                &field_path,
                ConstraintKind::Required,
                format!("required field '{}' has no value", field.name),
            ));
        }
        if let Some(max) = max_count {
            if count > max {
                report.results.push(ValidationResult::violation(
                    &field_path,
                    ConstraintKind::MaxCount,
                    format!("expected at most {} values, found {}", max, count),
                ));
            }
        }

        let Some(value) = record.get(&field.name) else {
            return Ok(());
        };

        let element_tag = element_tag(&field.tag);
        match value {
            Value::Seq(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.validate_value(
                        item,
                        element_tag,
                        &field.constraints,
                        resolver,
                        &index_path(&field_path, i),
                        visited,
                        report,
                    )
                    .await?;
                }
            }
            single => {
                self.validate_value(
                    single,
                    element_tag,
                    &field.constraints,
                    resolver,
                    &field_path,
                    visited,
                    report,
                )
                .await?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn validate_value<'a>(
        &'a self,
        value: &'a Value,
        tag: &'a FieldTag,
        constraints: &'a [ConstraintSpec],
        resolver: &'a dyn ShapeResolver,
        path: &'a str,
        visited: &'a mut HashSet<Iri>,
        report: &'a mut ValidationReport,
    ) -> BoxFuture<'a, Result<(), ShapeError>> {
        Box::pin(async move {
            match tag {
                FieldTag::Primitive(datatype) => {
                    if !value.matches_datatype(*datatype) {
                        report.results.push(ValidationResult::violation(
                            path,
                            ConstraintKind::Datatype,
                            format!(
                                "value of type {} does not match datatype {}",
                                value.type_name(),
                                datatype.iri().local_name()
                            ),
                        ));
                    }
                    for spec in constraints {
                        check_constraint(value, spec, path, report);
                    }
                }
                FieldTag::Nested(class) => {
                    let Value::Record(nested) = value else {
                        report.results.push(ValidationResult::violation(
                            path,
                            ConstraintKind::Datatype,
                            format!(
                                "value of type {} where a nested {} record was expected",
                                value.type_name(),
                                class.local_name()
                            ),
                        ));
                        return Ok(());
                    };
                    // re-entry on the current path short-circuits as pass:
                    // a violation in the re-entered shape was already
                    // recorded on first descent
                    if visited.contains(class) {
                        return Ok(());
                    }
                    let nested_shape = resolver
                        .resolve(class)
                        .await?
                        .ok_or_else(|| ShapeError::UnresolvedShape(class.clone()))?;
                    visited.insert(class.clone());
                    self.validate_record(nested, &nested_shape, resolver, path, visited, report)
                        .await?;
                    visited.remove(class);
                    // opaque predicates still surface on nested fields
                    for spec in constraints {
                        if spec.kind == ConstraintKind::OpaquePredicate {
                            check_constraint(value, spec, path, report);
                        }
                    }
                }
                FieldTag::Union(members) => {
                    let mut accepted = false;
                    for member in members {
                        let mut trial = ValidationReport::new();
                        self.validate_value(
                            value, member, &[], resolver, path, visited, &mut trial,
                        )
                        .await?;
                        if trial.conforms() {
                            accepted = true;
                            break;
                        }
                    }
                    if !accepted {
                        report.results.push(ValidationResult::violation(
                            path,
                            ConstraintKind::Datatype,
                            format!(
                                "value of type {} matches no member of the union",
                                value.type_name()
                            ),
                        ));
                    }
                    for spec in constraints {
                        check_constraint(value, spec, path, report);
                    }
                }
                FieldTag::Optional(inner) | FieldTag::List(inner) => {
                    // container wrappers are handled at the field level
                    self.validate_value(value, inner, constraints, resolver, path, visited, report)
                        .await?;
                }
            }
            Ok(())
        })
    }
}

/// Effective per-value tag of a field
fn element_tag(tag: &FieldTag) -> &FieldTag {
    match tag.unwrap_optional() {
        FieldTag::List(inner) => inner.unwrap_optional(),
        other => other,
    }
}

/// Evaluate one constraint spec against one present value, appending a
/// result per violation. Unsupported specs surface as warnings and
/// never block conformance.
fn check_constraint(value: &Value, spec: &ConstraintSpec, path: &str, report: &mut ValidationReport) {
    if spec.unsupported {
        if let ConstraintParam::Predicate { name, .. } = &spec.param {
            report.results.push(ValidationResult::warning(
                path,
                spec.kind,
                format!(
                    "predicate constraint '{}' is carried from the source schema but cannot be executed here",
                    name
                ),
            ));
        } else {
            report.results.push(ValidationResult::warning(
                path,
                spec.kind,
                "constraint is not expressible in this representation".to_string(),
            ));
        }
        return;
    }

    match (&spec.kind, &spec.param) {
        (ConstraintKind::MinLength, ConstraintParam::Length(min)) => {
            if let Value::Str(s) = value {
                let len = s.chars().count() as u64;
                if len < *min {
                    report.results.push(ValidationResult::violation(
                        path,
                        spec.kind,
                        format!("length {} is below the minimum of {}", len, min),
                    ));
                }
            }
        }
        (ConstraintKind::MaxLength, ConstraintParam::Length(max)) => {
            if let Value::Str(s) = value {
                let len = s.chars().count() as u64;
                if len > *max {
                    report.results.push(ValidationResult::violation(
                        path,
                        spec.kind,
                        format!("length {} exceeds the maximum of {}", len, max),
                    ));
                }
            }
        }
        (ConstraintKind::Pattern, ConstraintParam::Pattern(pattern)) => {
            if let Value::Str(s) = value {
                match Regex::new(pattern) {
                    Ok(regex) => {
                        if !regex.is_match(s) {
                            report.results.push(ValidationResult::violation(
                                path,
                                spec.kind,
                                format!("value '{}' does not match pattern '{}'", s, pattern),
                            ));
                        }
                    }
                    Err(_) => {
                        report.results.push(ValidationResult::warning(
                            path,
                            spec.kind,
                            format!("pattern '{}' is not a valid regular expression", pattern),
                        ));
                    }
                }
            }
        }
        (ConstraintKind::MinInclusive, ConstraintParam::Bound(bound)) => {
            if let (Some(v), Some(b)) = (value.as_f64(), bound.as_f64()) {
                if v < b {
                    report.results.push(ValidationResult::violation(
                        path,
                        spec.kind,
                        format!("{} is below the minimum of {}", v, bound.value),
                    ));
                }
            }
        }
        (ConstraintKind::MaxInclusive, ConstraintParam::Bound(bound)) => {
            if let (Some(v), Some(b)) = (value.as_f64(), bound.as_f64()) {
                if v > b {
                    report.results.push(ValidationResult::violation(
                        path,
                        spec.kind,
                        format!("{} exceeds the maximum of {}", v, bound.value),
                    ));
                }
            }
        }
        (ConstraintKind::MinExclusive, ConstraintParam::Bound(bound)) => {
            if let (Some(v), Some(b)) = (value.as_f64(), bound.as_f64()) {
                if v <= b {
                    report.results.push(ValidationResult::violation(
                        path,
                        spec.kind,
                        format!("{} is not above the exclusive minimum of {}", v, bound.value),
                    ));
                }
            }
        }
        (ConstraintKind::MaxExclusive, ConstraintParam::Bound(bound)) => {
            if let (Some(v), Some(b)) = (value.as_f64(), bound.as_f64()) {
                if v >= b {
                    report.results.push(ValidationResult::violation(
                        path,
                        spec.kind,
                        format!("{} is not below the exclusive maximum of {}", v, bound.value),
                    ));
                }
            }
        }
        (ConstraintKind::In, ConstraintParam::Values(allowed)) => {
            if let Some(literal) = value.as_literal() {
                if !allowed.iter().any(|candidate| candidate.value == literal.value) {
                    report.results.push(ValidationResult::violation(
                        path,
                        spec.kind,
                        format!("value '{}' is not one of the allowed values", literal.value),
                    ));
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semagraph_core::descriptor::ConstraintSpec;
    use semagraph_core::model::Literal;

    fn run(value: &Value, spec: &ConstraintSpec) -> ValidationReport {
        let mut report = ValidationReport::new();
        check_constraint(value, spec, "field", &mut report);
        report
    }

    #[test]
    fn test_min_length_counts_chars() {
        let spec = ConstraintSpec::min_length(3);
        assert!(!run(&Value::from("ab"), &spec).conforms());
        assert!(run(&Value::from("abc"), &spec).conforms());
    }

    #[test]
    fn test_inclusive_bounds_are_inclusive() {
        let spec = ConstraintSpec::bound(ConstraintKind::MinInclusive, Literal::integer(0));
        assert!(run(&Value::Int(0), &spec).conforms());
        assert!(!run(&Value::Int(-1), &spec).conforms());
    }

    #[test]
    fn test_exclusive_bounds_are_exclusive() {
        let spec = ConstraintSpec::bound(ConstraintKind::MaxExclusive, Literal::integer(150));
        assert!(run(&Value::Int(149), &spec).conforms());
        assert!(!run(&Value::Int(150), &spec).conforms());
    }

    #[test]
    fn test_pattern_mismatch() {
        let spec = ConstraintSpec::pattern("^[A-Z]{2}$");
        assert!(run(&Value::from("NY"), &spec).conforms());
        let report = run(&Value::from("ny"), &spec);
        assert_eq!(report.violation_count(), 1);
        assert_eq!(report.results[0].kind, ConstraintKind::Pattern);
    }

    #[test]
    fn test_enumerated_values() {
        let spec = ConstraintSpec::values(vec![
            Literal::string("open"),
            Literal::string("closed"),
        ]);
        assert!(run(&Value::from("open"), &spec).conforms());
        assert!(!run(&Value::from("pending"), &spec).conforms());
    }

    #[test]
    fn test_unsupported_spec_warns_instead_of_violating() {
        let spec = ConstraintSpec::opaque("checksum", "lambda v: checksum(v)");
        let report = run(&Value::from("anything"), &spec);
        assert!(report.conforms());
        assert_eq!(report.warning_count(), 1);
    }
}
