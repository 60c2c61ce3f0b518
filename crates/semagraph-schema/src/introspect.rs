//! Schema introspection
//!
//! Walks a `SchemaDef` and produces the ordered `FieldDescriptor` list a
//! shape is assembled from. Field order is declaration order. Nested
//! schemas are emitted as references by target-class IRI, so
//! self-referential and mutually recursive schema graphs introspect
//! without expansion; the visited-set walk over the reference graph
//! lives in `dependency_closure`.

use crate::adapter::{SchemaAdapter, SchemaDef};
use crate::mapper::{ConstraintMapper, TypeMapper};
use crate::SchemaError;
use semagraph_core::descriptor::FieldDescriptor;
use semagraph_core::model::Namespace;
use std::collections::HashSet;

/// Produces field descriptors from schema definitions
#[derive(Debug, Clone)]
pub struct ModelIntrospector {
    namespace: Namespace,
    type_mapper: TypeMapper,
    constraint_mapper: ConstraintMapper,
}

impl ModelIntrospector {
    pub fn new(namespace: Namespace) -> Self {
        ModelIntrospector {
            namespace,
            type_mapper: TypeMapper,
            constraint_mapper: ConstraintMapper,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Extract the ordered field descriptors of one schema.
    ///
    /// Fails when any declared field type cannot be classified into the
    /// supported taxonomy; the error names the schema and field.
    pub fn introspect(&self, schema: &SchemaDef) -> Result<Vec<FieldDescriptor>, SchemaError> {
        let mut descriptors = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let tag = self
                .type_mapper
                .map_type(&field.type_expr, &self.namespace)
                .map_err(|e| {
                    SchemaError::Introspection(format!(
                        "schema '{}', field '{}': {}",
                        schema.name, field.name, e
                    ))
                })?;
            let mut descriptor = FieldDescriptor::new(field.name.clone(), tag);
            descriptor.required = field.required;
            descriptor.description = field.description.clone();
            descriptor.constraints = field
                .constraints
                .iter()
                .map(|c| self.constraint_mapper.map_constraint(c))
                .collect();
            descriptors.push(descriptor);
        }
        Ok(descriptors)
    }

    /// All schemas reachable from `root` through nested references,
    /// children before parents, each name exactly once. A visited set
    /// keyed by schema name breaks self- and mutual recursion.
    ///
    /// Fails when a referenced schema is unknown to the adapter.
    pub fn dependency_closure<'a>(
        &self,
        root: &'a SchemaDef,
        adapter: &'a dyn SchemaAdapter,
    ) -> Result<Vec<&'a SchemaDef>, SchemaError> {
        let mut visited = HashSet::new();
        let mut ordered = Vec::new();
        self.visit(root, adapter, &mut visited, &mut ordered)?;
        Ok(ordered)
    }

    fn visit<'a>(
        &self,
        schema: &'a SchemaDef,
        adapter: &'a dyn SchemaAdapter,
        visited: &mut HashSet<String>,
        ordered: &mut Vec<&'a SchemaDef>,
    ) -> Result<(), SchemaError> {
        if !visited.insert(schema.name.clone()) {
            return Ok(());
        }
        for name in schema.nested_schema_names() {
            if visited.contains(name) {
                continue;
            }
            let nested = adapter.lookup(name).ok_or_else(|| {
                SchemaError::UnknownSchema {
                    referenced: name.to_string(),
                    referencing: schema.name.clone(),
                }
            })?;
            self.visit(nested, adapter, visited, ordered)?;
        }
        ordered.push(schema);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ConstraintDef, FieldDef, PrimitiveKind, SchemaSet, TypeExpr};
    use semagraph_core::descriptor::ConstraintKind;
    use semagraph_core::model::Iri;

    fn introspector() -> ModelIntrospector {
        ModelIntrospector::new(Namespace::new("http://example.org/"))
    }

    fn person() -> SchemaDef {
        SchemaDef::new("Person")
            .field(
                FieldDef::new("name", TypeExpr::Primitive(PrimitiveKind::Str))
                    .with_constraint(ConstraintDef::MinLength(1)),
            )
            .field(FieldDef::new("age", TypeExpr::Primitive(PrimitiveKind::Int)))
            .field(FieldDef::new(
                "addresses",
                TypeExpr::list(TypeExpr::Nested("Address".to_string())),
            ))
    }

    #[test]
    fn test_field_order_is_declaration_order() {
        let fields = introspector().introspect(&person()).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "age", "addresses"]);
    }

    #[test]
    fn test_constraints_are_carried() {
        let fields = introspector().introspect(&person()).unwrap();
        assert_eq!(fields[0].constraints.len(), 1);
        assert_eq!(fields[0].constraints[0].kind, ConstraintKind::MinLength);
    }

    #[test]
    fn test_unclassifiable_field_fails_with_context() {
        let schema = SchemaDef::new("Broken").field(FieldDef::new(
            "callback",
            TypeExpr::Unclassified("Callable[[int], int]".to_string()),
        ));
        let err = introspector().introspect(&schema).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Broken"));
        assert!(message.contains("callback"));
    }

    #[test]
    fn test_self_reference_becomes_nested_tag() {
        let node = SchemaDef::new("Node").field(
            FieldDef::new(
                "next",
                TypeExpr::optional(TypeExpr::Nested("Node".to_string())),
            )
            .optional(),
        );
        let fields = introspector().introspect(&node).unwrap();
        assert_eq!(
            fields[0].tag.nested_class(),
            Some(&Iri::new("http://example.org/Node"))
        );
    }

    #[test]
    fn test_closure_is_children_first() {
        let address = SchemaDef::new("Address").field(FieldDef::new(
            "state",
            TypeExpr::Primitive(PrimitiveKind::Str),
        ));
        let set = SchemaSet::new().with(address).with(person());
        let root = person();
        let closure = introspector().dependency_closure(&root, &set).unwrap();
        let names: Vec<&str> = closure.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Address", "Person"]);
    }

    #[test]
    fn test_closure_handles_mutual_recursion() {
        let employee = SchemaDef::new("Employee").field(
            FieldDef::new(
                "manager",
                TypeExpr::optional(TypeExpr::Nested("Department".to_string())),
            )
            .optional(),
        );
        let department = SchemaDef::new("Department").field(FieldDef::new(
            "head",
            TypeExpr::Nested("Employee".to_string()),
        ));
        let set = SchemaSet::new().with(employee.clone()).with(department);
        let closure = introspector().dependency_closure(&employee, &set).unwrap();
        assert_eq!(closure.len(), 2);
    }

    #[test]
    fn test_unknown_nested_schema_is_an_error() {
        let schema = SchemaDef::new("Person").field(FieldDef::new(
            "home",
            TypeExpr::Nested("Address".to_string()),
        ));
        let set = SchemaSet::new().with(schema.clone());
        let err = introspector().dependency_closure(&schema, &set).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownSchema { .. }));
    }
}
