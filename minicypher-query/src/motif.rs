//! Compiled form of a MATCH clause: pattern nodes and edges in indexed
//! arrays, with label/property predicates ready to test against hosts.

use crate::ast::{EdgeDirection, HopRange, Literal, MatchClause, PathElement};
use crate::value::{Value, eq_strict};
use minicypher_api::Attrs;
use std::collections::{BTreeMap, BTreeSet};

/// Label DNF: matches iff any alternative is a subset of the host labels.
pub type LabelDnf = Vec<BTreeSet<String>>;

#[derive(Debug, Clone)]
pub struct Motif {
    pub nodes: Vec<MotifNode>,
    pub edges: Vec<MotifEdge>,
}

#[derive(Debug, Clone)]
pub struct MotifNode {
    pub name: String,
    pub anonymous: bool,
    pub labels: Option<LabelDnf>,
    pub properties: Vec<(String, Value)>,
}

#[derive(Debug, Clone)]
pub struct MotifEdge {
    pub src: usize,
    pub dst: usize,
    pub variable: Option<String>,
    pub labels: Option<LabelDnf>,
    pub properties: Vec<(String, Value)>,
    pub direction: EdgeDirection,
    pub hops: HopRange,
}

impl Motif {
    /// Compiles one path pattern. `anon` numbers anonymous nodes across
    /// the whole query so synthesized names never collide.
    pub fn compile(clause: &MatchClause, anon: &mut u32) -> Motif {
        let mut nodes: Vec<MotifNode> = Vec::new();
        let mut edges: Vec<MotifEdge> = Vec::new();
        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        let mut previous = usize::MAX;

        for element in &clause.elements {
            match element {
                PathElement::Node(pattern) => {
                    let labels = pattern.labels.as_ref().map(|l| compile_dnf(&l.alternatives));
                    let properties = compile_properties(&pattern.properties);
                    let idx = match &pattern.variable {
                        Some(name) => {
                            if let Some(&existing) = index.get(name) {
                                // A re-mention of a bound variable conjoins
                                // any extra constraints onto the first one.
                                merge_constraints(&mut nodes[existing], labels, properties);
                                existing
                            } else {
                                index.insert(name.clone(), nodes.len());
                                nodes.push(MotifNode {
                                    name: name.clone(),
                                    anonymous: false,
                                    labels,
                                    properties,
                                });
                                nodes.len() - 1
                            }
                        }
                        None => {
                            let name = format!("__anon{anon}");
                            *anon += 1;
                            nodes.push(MotifNode {
                                name,
                                anonymous: true,
                                labels,
                                properties,
                            });
                            nodes.len() - 1
                        }
                    };
                    if let Some(edge) = edges.last_mut()
                        && edge.dst == usize::MAX
                    {
                        edge.dst = idx;
                    }
                    previous = idx;
                }
                PathElement::Edge(pattern) => {
                    edges.push(MotifEdge {
                        src: previous,
                        dst: usize::MAX, // patched by the following node
                        variable: pattern.variable.clone(),
                        labels: pattern.labels.as_ref().map(|l| compile_dnf(&l.alternatives)),
                        properties: compile_properties(&pattern.properties),
                        direction: pattern.direction,
                        hops: pattern.hops,
                    });
                }
            }
        }

        Motif { nodes, edges }
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Declared (non-anonymous) node variables.
    pub fn node_variables(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|n| !n.anonymous)
            .map(|n| n.name.as_str())
    }

    pub fn edge_variables(&self) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .filter_map(|e| e.variable.as_deref())
    }
}

fn merge_constraints(
    node: &mut MotifNode,
    labels: Option<LabelDnf>,
    properties: Vec<(String, Value)>,
) {
    if let Some(extra) = labels {
        node.labels = Some(match node.labels.take() {
            None => extra,
            Some(existing) => {
                let mut conjoined = Vec::new();
                for alt in &existing {
                    for other in &extra {
                        let mut set = alt.clone();
                        set.extend(other.iter().cloned());
                        conjoined.push(set);
                    }
                }
                conjoined
            }
        });
    }
    node.properties.extend(properties);
}

fn compile_dnf(alternatives: &[Vec<String>]) -> LabelDnf {
    alternatives
        .iter()
        .map(|alt| alt.iter().cloned().collect())
        .collect()
}

fn compile_properties(properties: &[(String, Literal)]) -> Vec<(String, Value)> {
    properties
        .iter()
        .map(|(key, literal)| (key.clone(), literal_value(literal)))
        .collect()
}

pub fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Integer(n) => Value::Int(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::String(s) => Value::Str(s.clone()),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

/// True iff the host label set satisfies the DNF (or there is no DNF).
pub fn labels_match(dnf: Option<&LabelDnf>, host_labels: &BTreeSet<String>) -> bool {
    match dnf {
        None => true,
        Some(alternatives) => alternatives
            .iter()
            .any(|required| required.iter().all(|atom| host_labels.contains(atom))),
    }
}

/// True iff every property constraint equals the host attribute value.
pub fn properties_match(constraints: &[(String, Value)], attrs: &Attrs) -> bool {
    constraints.iter().all(|(key, want)| {
        attrs
            .get(key)
            .is_some_and(|have| eq_strict(&Value::from(have), want))
    })
}
