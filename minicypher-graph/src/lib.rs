//! In-memory reference implementation of the [`HostGraph`] contract.
//!
//! `MemGraph` is an adjacency-list attributed graph in the four usual
//! flavors (directed/undirected × simple/multi). It exists so the engine,
//! the CLI, and the test suite have a host to run against; any other type
//! implementing [`HostGraph`] works just as well.

use minicypher_api::{AttrValue, Attrs, EdgeKey, HostGraph, NodeId};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid graph document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Builds a `__labels__` attribute value from label names.
pub fn labels<I, S>(names: I) -> AttrValue
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    AttrValue::List(
        names
            .into_iter()
            .map(|s| AttrValue::Str(s.into()))
            .collect(),
    )
}

/// An in-memory attributed graph.
///
/// Node and edge enumeration order is the numeric order of the ids
/// involved, which keeps query results deterministic across runs.
#[derive(Debug, Clone, Default)]
pub struct MemGraph {
    directed: bool,
    multigraph: bool,
    nodes: BTreeMap<NodeId, Attrs>,
    // Keyed by the stored endpoint pair; canonicalized (min, max) when
    // undirected so both orientations resolve to the same slot.
    edges: BTreeMap<(NodeId, NodeId, EdgeKey), Attrs>,
    out_adj: BTreeMap<NodeId, BTreeSet<(NodeId, EdgeKey)>>,
    in_adj: BTreeMap<NodeId, BTreeSet<(NodeId, EdgeKey)>>,
}

impl MemGraph {
    pub fn directed() -> Self {
        Self {
            directed: true,
            ..Self::default()
        }
    }

    pub fn undirected() -> Self {
        Self::default()
    }

    pub fn multi_directed() -> Self {
        Self {
            directed: true,
            multigraph: true,
            ..Self::default()
        }
    }

    pub fn multi_undirected() -> Self {
        Self {
            multigraph: true,
            ..Self::default()
        }
    }

    /// Inserts a node, merging `attrs` into any existing attribute map.
    pub fn add_node(&mut self, id: NodeId, attrs: impl IntoIterator<Item = (String, AttrValue)>) {
        let entry = self.nodes.entry(id).or_default();
        entry.extend(attrs);
    }

    pub fn set_node_attr(&mut self, id: NodeId, key: impl Into<String>, value: AttrValue) {
        self.nodes.entry(id).or_default().insert(key.into(), value);
    }

    /// Adds an edge and returns its key. Missing endpoints are created.
    ///
    /// On a simple graph the key is always 0 and re-adding merges the
    /// attribute map; on a multigraph each call allocates the next free
    /// key for the endpoint pair.
    pub fn add_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        attrs: impl IntoIterator<Item = (String, AttrValue)>,
    ) -> EdgeKey {
        self.nodes.entry(src).or_default();
        self.nodes.entry(dst).or_default();

        let (a, b) = self.store_pair(src, dst);
        let key = if self.multigraph {
            self.edges
                .range((a, b, 0)..=(a, b, EdgeKey::MAX))
                .next_back()
                .map(|((_, _, k), _)| k + 1)
                .unwrap_or(0)
        } else {
            0
        };
        self.edges.entry((a, b, key)).or_default().extend(attrs);

        self.out_adj.entry(src).or_default().insert((dst, key));
        self.in_adj.entry(dst).or_default().insert((src, key));
        if !self.directed {
            self.out_adj.entry(dst).or_default().insert((src, key));
            self.in_adj.entry(src).or_default().insert((dst, key));
        }
        key
    }

    pub fn set_edge_attr(
        &mut self,
        src: NodeId,
        dst: NodeId,
        key: EdgeKey,
        name: impl Into<String>,
        value: AttrValue,
    ) {
        let (a, b) = self.store_pair(src, dst);
        if let Some(attrs) = self.edges.get_mut(&(a, b, key)) {
            attrs.insert(name.into(), value);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Loads a graph from a JSON document:
    ///
    /// ```json
    /// {
    ///   "directed": true,
    ///   "multigraph": false,
    ///   "nodes": [{"id": 1, "name": "Alice"}],
    ///   "edges": [{"src": 1, "dst": 2, "__labels__": ["knows"]}]
    /// }
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self> {
        let doc: GraphDoc = serde_json::from_str(text)?;
        let mut graph = MemGraph {
            directed: doc.directed,
            multigraph: doc.multigraph,
            ..Self::default()
        };
        for node in doc.nodes {
            graph.add_node(node.id, node.attrs);
        }
        for edge in doc.edges {
            graph.add_edge(edge.src, edge.dst, edge.attrs);
        }
        Ok(graph)
    }

    fn store_pair(&self, src: NodeId, dst: NodeId) -> (NodeId, NodeId) {
        if self.directed || src <= dst {
            (src, dst)
        } else {
            (dst, src)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphDoc {
    #[serde(default)]
    directed: bool,
    #[serde(default)]
    multigraph: bool,
    #[serde(default)]
    nodes: Vec<NodeDoc>,
    #[serde(default)]
    edges: Vec<EdgeDoc>,
}

#[derive(Debug, Deserialize)]
struct NodeDoc {
    id: NodeId,
    #[serde(flatten)]
    attrs: Attrs,
}

#[derive(Debug, Deserialize)]
struct EdgeDoc {
    src: NodeId,
    dst: NodeId,
    #[serde(flatten)]
    attrs: Attrs,
}

impl HostGraph for MemGraph {
    fn nodes(&self) -> Box<dyn Iterator<Item = NodeId> + '_> {
        Box::new(self.nodes.keys().copied())
    }

    fn node_attrs(&self, node: NodeId) -> Option<&Attrs> {
        self.nodes.get(&node)
    }

    fn out_edges(&self, node: NodeId) -> Box<dyn Iterator<Item = (NodeId, EdgeKey)> + '_> {
        match self.out_adj.get(&node) {
            Some(set) => Box::new(set.iter().copied()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn in_edges(&self, node: NodeId) -> Box<dyn Iterator<Item = (NodeId, EdgeKey)> + '_> {
        match self.in_adj.get(&node) {
            Some(set) => Box::new(set.iter().copied()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn edges_between(&self, src: NodeId, dst: NodeId) -> Box<dyn Iterator<Item = EdgeKey> + '_> {
        let (a, b) = self.store_pair(src, dst);
        Box::new(
            self.edges
                .range((a, b, 0)..=(a, b, EdgeKey::MAX))
                .map(|((_, _, k), _)| *k),
        )
    }

    fn edge_attrs(&self, src: NodeId, dst: NodeId, key: EdgeKey) -> Option<&Attrs> {
        let (a, b) = self.store_pair(src, dst);
        self.edges.get(&(a, b, key))
    }

    fn is_directed(&self) -> bool {
        self.directed
    }

    fn is_multigraph(&self) -> bool {
        self.multigraph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minicypher_api::LABELS_ATTR;

    #[test]
    fn simple_graph_reuses_key_zero() {
        let mut g = MemGraph::directed();
        let k1 = g.add_edge(1, 2, [("w".to_string(), AttrValue::Int(1))]);
        let k2 = g.add_edge(1, 2, [("v".to_string(), AttrValue::Int(2))]);
        assert_eq!((k1, k2), (0, 0));
        assert_eq!(g.edge_count(), 1);
        // Second add merged into the same attribute map.
        let attrs = g.edge_attrs(1, 2, 0).unwrap();
        assert_eq!(attrs.get("w"), Some(&AttrValue::Int(1)));
        assert_eq!(attrs.get("v"), Some(&AttrValue::Int(2)));
    }

    #[test]
    fn multigraph_allocates_parallel_keys() {
        let mut g = MemGraph::multi_directed();
        assert_eq!(g.add_edge(1, 2, []), 0);
        assert_eq!(g.add_edge(1, 2, []), 1);
        assert_eq!(g.add_edge(2, 1, []), 0);
        assert_eq!(g.edges_between(1, 2).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn undirected_edges_visible_from_both_ends() {
        let mut g = MemGraph::undirected();
        g.add_edge(3, 7, []);
        assert_eq!(g.out_edges(7).collect::<Vec<_>>(), vec![(3, 0)]);
        assert_eq!(g.in_edges(3).collect::<Vec<_>>(), vec![(7, 0)]);
        assert_eq!(g.edges_between(7, 3).count(), 1);
        assert!(g.edge_attrs(7, 3, 0).is_some());
    }

    #[test]
    fn json_document_roundtrip() {
        let g = MemGraph::from_json_str(
            r#"{
                "directed": true,
                "nodes": [{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}],
                "edges": [{"src": 1, "dst": 2, "__labels__": ["paid"], "amount": 12}]
            }"#,
        )
        .unwrap();
        assert_eq!(g.node_count(), 2);
        assert!(g.is_directed());
        let attrs = g.edge_attrs(1, 2, 0).unwrap();
        assert_eq!(attrs.get("amount"), Some(&AttrValue::Int(12)));
        assert_eq!(
            minicypher_api::labels_of(attrs).into_iter().collect::<Vec<_>>(),
            vec!["paid".to_string()]
        );
        assert!(attrs.contains_key(LABELS_ATTR));
    }
}
