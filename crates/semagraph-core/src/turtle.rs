//! Turtle transfer format
//!
//! Shape graphs are exported and imported as Turtle so they can be
//! diffed, versioned and content-hashed independent of triple ordering.
//! The writer is canonical: triples are sorted before grouping, so two
//! exports of the same graph are byte-identical. The reader accepts the
//! grammar subset the writer emits (prefix directives, IRI and prefixed
//! subjects/predicates, literal objects with datatypes or language tags,
//! `;`/`,` groups).

use crate::model::{escape_literal, Iri, Literal, Term, Triple};
use crate::CoreError;
use logos::Logos;
use std::collections::BTreeMap;

/// Turtle tokens
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'a> {
    #[token("@prefix")]
    PrefixDirective,

    #[token(".")]
    Dot,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token("^^")]
    DatatypeMarker,

    #[token("a")]
    A,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[regex(r"<[^<>\s]*>")]
    IriRef(&'a str),

    // Prefixed name, or a bare prefix declaration like `ex:`
    #[regex(r"[A-Za-z][A-Za-z0-9_\-]*:[A-Za-z0-9_\-]*")]
    PrefixedName(&'a str),

    #[regex(r":[A-Za-z0-9_\-]*")]
    DefaultPrefixedName(&'a str),

    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral(&'a str),

    #[regex(r"@[a-zA-Z]+(-[a-zA-Z0-9]+)*")]
    LangTag(&'a str),

    #[regex(r"[+-]?[0-9]+")]
    Integer(&'a str),

    #[regex(r"[+-]?[0-9]*\.[0-9]+")]
    Decimal(&'a str),

    #[regex(r"_:[A-Za-z0-9_\-]+")]
    BlankNode(&'a str),
}

/// Serialize triples to canonical Turtle
pub fn write_turtle(triples: &[Triple], prefixes: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (prefix, ns) in prefixes {
        out.push_str(&format!("@prefix {}: <{}> .\n", prefix, ns));
    }
    if !prefixes.is_empty() && !triples.is_empty() {
        out.push('\n');
    }

    // Canonical order: sort by rendered form, then group
    let mut sorted: Vec<&Triple> = triples.iter().collect();
    sorted.sort_by_key(|t| t.to_ntriples());
    sorted.dedup_by_key(|t| t.to_ntriples());

    let mut grouped: BTreeMap<&Iri, BTreeMap<&Iri, Vec<&Term>>> = BTreeMap::new();
    for triple in &sorted {
        grouped
            .entry(&triple.subject)
            .or_default()
            .entry(&triple.predicate)
            .or_default()
            .push(&triple.object);
    }

    for (subject, predicates) in &grouped {
        out.push_str(&compact_iri(subject, prefixes));
        let mut first_predicate = true;
        for (predicate, objects) in predicates {
            if first_predicate {
                out.push(' ');
                first_predicate = false;
            } else {
                out.push_str(" ;\n    ");
            }
            out.push_str(&compact_predicate(predicate, prefixes));
            out.push(' ');
            for (i, object) in objects.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&compact_term(object, prefixes));
            }
        }
        out.push_str(" .\n");
    }
    out
}

fn compact_predicate(iri: &Iri, prefixes: &[(&str, &str)]) -> String {
    if iri.as_str() == crate::vocab::rdf::TYPE {
        "a".to_string()
    } else {
        compact_iri(iri, prefixes)
    }
}

fn compact_iri(iri: &Iri, prefixes: &[(&str, &str)]) -> String {
    for (prefix, ns) in prefixes {
        if let Some(local) = iri.as_str().strip_prefix(ns) {
            if is_simple_local(local) {
                return format!("{}:{}", prefix, local);
            }
        }
    }
    format!("<{}>", iri)
}

fn compact_term(term: &Term, prefixes: &[(&str, &str)]) -> String {
    match term {
        Term::Iri(iri) => compact_iri(iri, prefixes),
        Term::Literal(lit) => {
            let quoted = format!("\"{}\"", escape_literal(&lit.value));
            match (&lit.datatype, &lit.language) {
                (Some(dt), _) => format!("{}^^{}", quoted, compact_iri(dt, prefixes)),
                (None, Some(lang)) => format!("{}@{}", quoted, lang),
                (None, None) => quoted,
            }
        }
        Term::Blank(label) => format!("_:{}", label),
    }
}

// Conservative PN_LOCAL check: slashes and dots force the full IRI form
fn is_simple_local(local: &str) -> bool {
    !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && local.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// Parse Turtle text into triples
pub fn parse_turtle(input: &str) -> Result<Vec<Triple>, CoreError> {
    Parser::new(input)?.parse()
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    prefixes: BTreeMap<String, String>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, CoreError> {
        let mut tokens = Vec::new();
        for (result, span) in Token::lexer(input).spanned() {
            match result {
                Ok(token) => tokens.push(token),
                Err(_) => {
                    return Err(CoreError::TurtleParse(format!(
                        "unrecognized input at byte {}",
                        span.start
                    )))
                }
            }
        }
        Ok(Parser {
            tokens,
            pos: 0,
            prefixes: BTreeMap::new(),
        })
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_dot(&mut self) -> Result<(), CoreError> {
        match self.next() {
            Some(Token::Dot) => Ok(()),
            other => Err(CoreError::TurtleParse(format!(
                "expected '.', found {:?}",
                other
            ))),
        }
    }

    fn parse(&mut self) -> Result<Vec<Triple>, CoreError> {
        let mut triples = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                Token::PrefixDirective => self.parse_prefix()?,
                _ => self.parse_statement(&mut triples)?,
            }
        }
        Ok(triples)
    }

    fn parse_prefix(&mut self) -> Result<(), CoreError> {
        self.next(); // @prefix
        let prefix = match self.next() {
            Some(Token::PrefixedName(name)) => name.trim_end_matches(':').to_string(),
            Some(Token::DefaultPrefixedName(_)) => String::new(),
            other => {
                return Err(CoreError::TurtleParse(format!(
                    "expected prefix name, found {:?}",
                    other
                )))
            }
        };
        let ns = match self.next() {
            Some(Token::IriRef(raw)) => strip_angles(raw),
            other => {
                return Err(CoreError::TurtleParse(format!(
                    "expected namespace IRI, found {:?}",
                    other
                )))
            }
        };
        self.expect_dot()?;
        self.prefixes.insert(prefix, ns);
        Ok(())
    }

    fn parse_statement(&mut self, triples: &mut Vec<Triple>) -> Result<(), CoreError> {
        let subject = self.parse_iri("subject")?;
        loop {
            let predicate = match self.next() {
                Some(Token::A) => Iri::new(crate::vocab::rdf::TYPE),
                Some(Token::IriRef(raw)) => Iri::new(strip_angles(raw)),
                Some(Token::PrefixedName(name)) => self.expand(name)?,
                Some(Token::DefaultPrefixedName(name)) => self.expand(name)?,
                other => {
                    return Err(CoreError::TurtleParse(format!(
                        "expected predicate, found {:?}",
                        other
                    )))
                }
            };
            loop {
                let object = self.parse_object()?;
                triples.push(Triple::new(subject.clone(), predicate.clone(), object));
                match self.peek() {
                    Some(Token::Comma) => {
                        self.next();
                    }
                    _ => break,
                }
            }
            match self.next() {
                Some(Token::Semicolon) => {
                    // allow a trailing semicolon before the dot
                    if matches!(self.peek(), Some(Token::Dot)) {
                        self.next();
                        return Ok(());
                    }
                }
                Some(Token::Dot) => return Ok(()),
                other => {
                    return Err(CoreError::TurtleParse(format!(
                        "expected ';' or '.', found {:?}",
                        other
                    )))
                }
            }
        }
    }

    fn parse_iri(&mut self, role: &str) -> Result<Iri, CoreError> {
        match self.next() {
            Some(Token::IriRef(raw)) => Ok(Iri::new(strip_angles(raw))),
            Some(Token::PrefixedName(name)) => self.expand(name),
            Some(Token::DefaultPrefixedName(name)) => self.expand(name),
            other => Err(CoreError::TurtleParse(format!(
                "expected {} IRI, found {:?}",
                role, other
            ))),
        }
    }

    fn parse_object(&mut self) -> Result<Term, CoreError> {
        match self.next() {
            Some(Token::IriRef(raw)) => Ok(Term::Iri(Iri::new(strip_angles(raw)))),
            Some(Token::PrefixedName(name)) => Ok(Term::Iri(self.expand(name)?)),
            Some(Token::DefaultPrefixedName(name)) => Ok(Term::Iri(self.expand(name)?)),
            Some(Token::StringLiteral(raw)) => {
                let value = unescape_literal(strip_quotes(raw));
                match self.peek() {
                    Some(Token::DatatypeMarker) => {
                        self.next();
                        let datatype = self.parse_iri("datatype")?;
                        Ok(Term::Literal(Literal::typed(value, datatype)))
                    }
                    Some(Token::LangTag(tag)) => {
                        let lang = tag.trim_start_matches('@').to_string();
                        self.next();
                        Ok(Term::Literal(Literal {
                            value,
                            datatype: None,
                            language: Some(lang),
                        }))
                    }
                    _ => Ok(Term::Literal(Literal::string(value))),
                }
            }
            Some(Token::Integer(raw)) => Ok(Term::Literal(Literal::typed(
                raw.to_string(),
                Iri::new(crate::vocab::xsd::INTEGER),
            ))),
            Some(Token::Decimal(raw)) => Ok(Term::Literal(Literal::typed(
                raw.to_string(),
                Iri::new(crate::vocab::xsd::DECIMAL),
            ))),
            Some(Token::True) => Ok(Term::Literal(Literal::boolean(true))),
            Some(Token::False) => Ok(Term::Literal(Literal::boolean(false))),
            Some(Token::BlankNode(label)) => {
                Ok(Term::Blank(label.trim_start_matches("_:").to_string()))
            }
            other => Err(CoreError::TurtleParse(format!(
                "expected object term, found {:?}",
                other
            ))),
        }
    }

    fn expand(&self, name: &str) -> Result<Iri, CoreError> {
        let (prefix, local) = name
            .split_once(':')
            .ok_or_else(|| CoreError::TurtleParse(format!("malformed prefixed name {}", name)))?;
        let ns = self
            .prefixes
            .get(prefix)
            .ok_or_else(|| CoreError::TurtleParse(format!("undeclared prefix '{}'", prefix)))?;
        Ok(Iri::new(format!("{}{}", ns, local)))
    }
}

fn strip_angles(raw: &str) -> String {
    raw.trim_start_matches('<').trim_end_matches('>').to_string()
}

fn strip_quotes(raw: &str) -> &str {
    &raw[1..raw.len() - 1]
}

fn unescape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
