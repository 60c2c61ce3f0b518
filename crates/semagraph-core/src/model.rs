//! RDF term and triple model

use serde::{Deserialize, Serialize};

/// IRI newtype
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Iri(pub String);

impl Iri {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Iri(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local name: the fragment after the last `#` or `/`
    pub fn local_name(&self) -> &str {
        self.0
            .rsplit_once(['#', '/'])
            .map(|(_, local)| local)
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Iri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Iri::new(s)
    }
}

/// RDF Literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<Iri>,
    pub language: Option<String>,
}

impl Literal {
    /// Plain string literal
    pub fn string<S: Into<String>>(value: S) -> Self {
        Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Literal with an explicit datatype
    pub fn typed<S: Into<String>>(value: S, datatype: Iri) -> Self {
        Literal {
            value: value.into(),
            datatype: Some(datatype),
            language: None,
        }
    }

    pub fn integer(value: i64) -> Self {
        Literal::typed(value.to_string(), Iri::new(crate::vocab::xsd::INTEGER))
    }

    pub fn decimal(value: f64) -> Self {
        Literal::typed(value.to_string(), Iri::new(crate::vocab::xsd::DECIMAL))
    }

    pub fn boolean(value: bool) -> Self {
        Literal::typed(value.to_string(), Iri::new(crate::vocab::xsd::BOOLEAN))
    }

    /// Numeric interpretation of the lexical value, when it has one
    pub fn as_f64(&self) -> Option<f64> {
        self.value.parse::<f64>().ok()
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// RDF term: IRI, literal, or blank node label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(Iri),
    Literal(Literal),
    Blank(String),
}

impl Term {
    pub fn iri<S: Into<String>>(s: S) -> Self {
        Term::Iri(Iri::new(s))
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// N-Triples rendering, also used as the canonical hash form
    pub fn to_ntriples(&self) -> String {
        match self {
            Term::Iri(iri) => format!("<{}>", iri),
            Term::Literal(lit) => {
                let escaped = escape_literal(&lit.value);
                match (&lit.datatype, &lit.language) {
                    (Some(dt), _) => format!("\"{}\"^^<{}>", escaped, dt),
                    (None, Some(lang)) => format!("\"{}\"@{}", escaped, lang),
                    (None, None) => format!("\"{}\"", escaped),
                }
            }
            Term::Blank(label) => format!("_:{}", label),
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "{}", iri),
            Term::Literal(lit) => write!(f, "{}", lit),
            Term::Blank(label) => write!(f, "_:{}", label),
        }
    }
}

/// RDF Triple. Subjects are IRIs: the shape and instance graphs this crate
/// produces never contain blank-node subjects, which keeps serializations
/// stable and diffable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Iri,
    pub predicate: Iri,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Iri, predicate: Iri, object: Term) -> Self {
        Triple {
            subject,
            predicate,
            object,
        }
    }

    /// N-Triples line without the trailing newline
    pub fn to_ntriples(&self) -> String {
        format!(
            "<{}> <{}> {} .",
            self.subject,
            self.predicate,
            self.object.to_ntriples()
        )
    }
}

/// Escape a literal value for N-Triples / Turtle output
pub(crate) fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Base namespace for minted class, property and instance IRIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace(String);

impl Namespace {
    /// The namespace string must end with `/` or `#`
    pub fn new<S: Into<String>>(base: S) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') && !base.ends_with('#') {
            base.push('/');
        }
        Namespace(base)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Target class IRI for a schema name
    pub fn class_iri(&self, name: &str) -> Iri {
        Iri::new(format!("{}{}", self.0, name))
    }

    /// Property IRI for a field name
    pub fn property_iri(&self, field: &str) -> Iri {
        Iri::new(format!("{}{}", self.0, field))
    }

    /// Node shape IRI for a target class
    pub fn shape_iri(&self, class: &Iri) -> Iri {
        Iri::new(format!("{}Shape", class))
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Namespace::new("http://example.org/")
    }
}
