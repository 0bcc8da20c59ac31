//! Public entry points: prepared queries and the `Engine` wrapper.

use crate::ast::{Expression, Query};
use crate::error::{Error, Result};
use crate::motif::Motif;
use crate::parser::Parser;
use crate::pipeline::{self, ColumnarTable};
use log::debug;
use minicypher_api::{HostGraph, NodeId};
use std::collections::{BTreeMap, BTreeSet};

/// One hint alternative: pattern variable name to host node id.
pub type Hint = BTreeMap<String, NodeId>;

/// A parsed and validated query, reusable across hosts and hint sets.
///
/// Created by [`prepare()`]. Parsing, motif compilation, and
/// unknown-variable validation happen once, before any matching work.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    query: Query,
    motifs: Vec<Motif>,
    variables: BTreeSet<String>,
}

/// Parses and validates a query.
pub fn prepare(text: &str) -> Result<PreparedQuery> {
    let query = Parser::parse(text)?;

    let mut anon = 0u32;
    let motifs: Vec<Motif> = query
        .matches
        .iter()
        .map(|clause| Motif::compile(clause, &mut anon))
        .collect();

    let mut variables: BTreeSet<String> = BTreeSet::new();
    for motif in &motifs {
        variables.extend(motif.node_variables().map(str::to_string));
        variables.extend(motif.edge_variables().map(str::to_string));
    }

    let check = |expr: &Expression, scope: &BTreeSet<String>| -> Result<()> {
        let mut unknown: Option<String> = None;
        expr.visit_variables(&mut |name| {
            if unknown.is_none() && !scope.contains(name) {
                unknown = Some(name.to_string());
            }
        });
        match unknown {
            Some(name) => Err(Error::UnknownVariable(name)),
            None => Ok(()),
        }
    };

    if let Some(predicate) = &query.where_clause {
        check(predicate, &variables)?;
    }
    for item in &query.return_clause.items {
        check(&item.expression, &variables)?;
    }
    // ORDER BY may also reference RETURN aliases.
    let mut order_scope = variables.clone();
    order_scope.extend(
        query
            .return_clause
            .items
            .iter()
            .filter_map(|item| item.alias.clone()),
    );
    for item in &query.return_clause.order_by {
        check(&item.expression, &order_scope)?;
    }

    debug!(
        "prepared query: {} motif(s), {} return item(s)",
        motifs.len(),
        query.return_clause.items.len()
    );

    Ok(PreparedQuery {
        query,
        motifs,
        variables,
    })
}

impl PreparedQuery {
    /// Executes against a host with no hints.
    pub fn run<G: HostGraph>(&self, graph: &G) -> Result<ColumnarTable> {
        self.run_with_hints(graph, &[])
    }

    /// Executes with hint alternatives: a row must be consistent with at
    /// least one hint map (OR across the list, AND across one map's keys).
    pub fn run_with_hints<G: HostGraph>(
        &self,
        graph: &G,
        hints: &[Hint],
    ) -> Result<ColumnarTable> {
        for hint in hints {
            for var in hint.keys() {
                if !self.variables.contains(var) {
                    return Err(Error::InvalidHint(var.clone()));
                }
            }
        }
        pipeline::execute(graph, &self.motifs, &self.query, hints)
    }

    /// Variables bound by the MATCH clauses (nodes and edges).
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(String::as_str)
    }
}

/// Engine façade owning (or borrowing) a host graph.
///
/// # Example
///
/// ```ignore
/// let engine = Engine::new(&graph);
/// let table = engine.run("MATCH (a)-[]->(b) RETURN a, b LIMIT 10")?;
/// ```
pub struct Engine<G> {
    graph: G,
}

impl<G: HostGraph> Engine<G> {
    pub fn new(graph: G) -> Self {
        Self { graph }
    }

    pub fn run(&self, query: &str) -> Result<ColumnarTable> {
        prepare(query)?.run(&self.graph)
    }

    pub fn run_with_hints(&self, query: &str, hints: &[Hint]) -> Result<ColumnarTable> {
        prepare(query)?.run_with_hints(&self.graph, hints)
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }
}
