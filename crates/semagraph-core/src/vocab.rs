//! Shared RDF vocabulary constants
//!
//! Centralized so the schema, shape and store crates agree on every IRI.

/// XML Schema datatypes
pub mod xsd {
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";

    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

/// SHACL core vocabulary
pub mod sh {
    pub const NS: &str = "http://www.w3.org/ns/shacl#";

    pub const NODE_SHAPE: &str = "http://www.w3.org/ns/shacl#NodeShape";
    pub const PROPERTY_SHAPE: &str = "http://www.w3.org/ns/shacl#PropertyShape";
    pub const TARGET_CLASS: &str = "http://www.w3.org/ns/shacl#targetClass";
    pub const PROPERTY: &str = "http://www.w3.org/ns/shacl#property";
    pub const PATH: &str = "http://www.w3.org/ns/shacl#path";
    pub const DATATYPE: &str = "http://www.w3.org/ns/shacl#datatype";
    pub const NODE: &str = "http://www.w3.org/ns/shacl#node";
    pub const CLASS: &str = "http://www.w3.org/ns/shacl#class";
    pub const MIN_COUNT: &str = "http://www.w3.org/ns/shacl#minCount";
    pub const MAX_COUNT: &str = "http://www.w3.org/ns/shacl#maxCount";
    pub const MIN_LENGTH: &str = "http://www.w3.org/ns/shacl#minLength";
    pub const MAX_LENGTH: &str = "http://www.w3.org/ns/shacl#maxLength";
    pub const PATTERN: &str = "http://www.w3.org/ns/shacl#pattern";
    pub const MIN_INCLUSIVE: &str = "http://www.w3.org/ns/shacl#minInclusive";
    pub const MAX_INCLUSIVE: &str = "http://www.w3.org/ns/shacl#maxInclusive";
    pub const MIN_EXCLUSIVE: &str = "http://www.w3.org/ns/shacl#minExclusive";
    pub const MAX_EXCLUSIVE: &str = "http://www.w3.org/ns/shacl#maxExclusive";
    pub const IN: &str = "http://www.w3.org/ns/shacl#in";
    pub const OR: &str = "http://www.w3.org/ns/shacl#or";
    pub const CLOSED: &str = "http://www.w3.org/ns/shacl#closed";
    pub const DESCRIPTION: &str = "http://www.w3.org/ns/shacl#description";
    pub const ORDER: &str = "http://www.w3.org/ns/shacl#order";
}

/// RDF core vocabulary
pub mod rdf {
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
}

/// RDF Schema vocabulary
pub mod rdfs {
    pub const NS: &str = "http://www.w3.org/2000/01/rdf-schema#";

    pub const COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
}

/// semagraph extension vocabulary, for constraints SHACL cannot express
pub mod sg {
    pub const NS: &str = "http://semagraph.dev/ns#";

    pub const PREDICATE: &str = "http://semagraph.dev/ns#predicate";
    pub const PREDICATE_NAME: &str = "http://semagraph.dev/ns#predicateName";
    pub const PREDICATE_SOURCE: &str = "http://semagraph.dev/ns#predicateSource";
}

/// Well-known prefix bindings used by the Turtle writer
pub fn standard_prefixes() -> Vec<(&'static str, &'static str)> {
    vec![
        ("rdf", rdf::NS),
        ("rdfs", rdfs::NS),
        ("xsd", xsd::NS),
        ("sh", sh::NS),
        ("sg", sg::NS),
    ]
}
