//! Update units
//!
//! A unit is the smallest set of triples that must become visible
//! atomically: one shape graph, or one instance's full triple set
//! including nested sub-instances. A unit compiles into a single
//! SPARQL update request, which is the atomicity boundary of the
//! protocol. Commit and rollback consume the unit, so a handle cannot
//! leak across operations; dropping an uncommitted unit sends nothing.

use semagraph_core::model::{Iri, Triple};
use std::collections::BTreeMap;

/// Staged triple changes, grouped per named graph
#[derive(Debug, Clone, Default)]
pub struct TransactionUnit {
    drops: Vec<Iri>,
    deletes: BTreeMap<Iri, Vec<Triple>>,
    inserts: BTreeMap<Iri, Vec<Triple>>,
}

impl TransactionUnit {
    pub fn new() -> Self {
        TransactionUnit::default()
    }

    /// Stage dropping an entire named graph (silently, so replacing an
    /// absent graph is not an error)
    pub fn drop_graph(&mut self, graph: Iri) {
        self.drops.push(graph);
    }

    pub fn insert(&mut self, graph: &Iri, triple: Triple) {
        self.inserts.entry(graph.clone()).or_default().push(triple);
    }

    pub fn insert_all<I: IntoIterator<Item = Triple>>(&mut self, graph: &Iri, triples: I) {
        self.inserts
            .entry(graph.clone())
            .or_default()
            .extend(triples);
    }

    pub fn delete(&mut self, graph: &Iri, triple: Triple) {
        self.deletes.entry(graph.clone()).or_default().push(triple);
    }

    pub fn is_empty(&self) -> bool {
        self.drops.is_empty() && self.deletes.is_empty() && self.inserts.is_empty()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.values().map(|v| v.len()).sum()
    }

    /// Compile the unit into one SPARQL update request: drops first,
    /// then deletes, then inserts, separated by `;`
    pub fn to_update_string(&self) -> String {
        let mut operations = Vec::new();
        for graph in &self.drops {
            operations.push(format!("DROP SILENT GRAPH <{}>", graph));
        }
        if !self.deletes.is_empty() {
            operations.push(render_data_blocks("DELETE DATA", &self.deletes));
        }
        if !self.inserts.is_empty() {
            operations.push(render_data_blocks("INSERT DATA", &self.inserts));
        }
        operations.join(" ;\n")
    }
}

fn render_data_blocks(keyword: &str, graphs: &BTreeMap<Iri, Vec<Triple>>) -> String {
    let mut out = String::new();
    out.push_str(keyword);
    out.push_str(" {\n");
    for (graph, triples) in graphs {
        out.push_str(&format!("  GRAPH <{}> {{\n", graph));
        for triple in triples {
            out.push_str("    ");
            out.push_str(&triple.to_ntriples());
            out.push('\n');
        }
        out.push_str("  }\n");
    }
    out.push('}');
    out
}
