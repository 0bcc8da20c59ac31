//! Host-graph contract: the capability trait the query engine consumes,
//! plus the attribute value type shared across the workspace.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type NodeId = u64;
pub type EdgeKey = u64;

/// Reserved attribute name under which a node or edge exposes its label set.
pub const LABELS_ATTR: &str = "__labels__";

/// A scalar attribute value carried by host nodes and edges.
///
/// Integers and floats are distinct variants; the engine coerces between
/// them during comparison and arithmetic, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
}

pub type Attrs = BTreeMap<String, AttrValue>;

/// Reads the label set out of an attribute map.
///
/// Labels live under [`LABELS_ATTR`] as a list of strings (or a single
/// string). A missing or malformed entry means the empty label set.
pub fn labels_of(attrs: &Attrs) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    match attrs.get(LABELS_ATTR) {
        Some(AttrValue::List(items)) => {
            for item in items {
                if let AttrValue::Str(s) = item {
                    labels.insert(s.clone());
                }
            }
        }
        Some(AttrValue::Str(s)) => {
            labels.insert(s.clone());
        }
        _ => {}
    }
    labels
}

/// A fully-qualified host edge instance: ordered endpoint pair plus the
/// parallel-edge key (always 0 on a simple graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeRef {
    pub src: NodeId,
    pub dst: NodeId,
    pub key: EdgeKey,
}

/// Read-only capability set the engine requires from any host graph.
///
/// All iterators are snapshots for the duration of a query; the engine
/// never mutates the host and assumes nobody else does mid-query.
pub trait HostGraph {
    fn nodes(&self) -> Box<dyn Iterator<Item = NodeId> + '_>;

    fn node_attrs(&self, node: NodeId) -> Option<&Attrs>;

    /// Outgoing `(neighbor, key)` pairs. On an undirected host this is the
    /// full incidence set, identical to [`HostGraph::in_edges`].
    fn out_edges(&self, node: NodeId) -> Box<dyn Iterator<Item = (NodeId, EdgeKey)> + '_>;

    fn in_edges(&self, node: NodeId) -> Box<dyn Iterator<Item = (NodeId, EdgeKey)> + '_>;

    /// Edge keys for the ordered pair `src → dst` (orientation ignored on
    /// an undirected host). Yields at most one key on a simple graph.
    fn edges_between(&self, src: NodeId, dst: NodeId) -> Box<dyn Iterator<Item = EdgeKey> + '_>;

    fn edge_attrs(&self, src: NodeId, dst: NodeId, key: EdgeKey) -> Option<&Attrs>;

    fn is_directed(&self) -> bool;

    fn is_multigraph(&self) -> bool;
}

impl<G: HostGraph + ?Sized> HostGraph for &G {
    fn nodes(&self) -> Box<dyn Iterator<Item = NodeId> + '_> {
        (**self).nodes()
    }
    fn node_attrs(&self, node: NodeId) -> Option<&Attrs> {
        (**self).node_attrs(node)
    }
    fn out_edges(&self, node: NodeId) -> Box<dyn Iterator<Item = (NodeId, EdgeKey)> + '_> {
        (**self).out_edges(node)
    }
    fn in_edges(&self, node: NodeId) -> Box<dyn Iterator<Item = (NodeId, EdgeKey)> + '_> {
        (**self).in_edges(node)
    }
    fn edges_between(&self, src: NodeId, dst: NodeId) -> Box<dyn Iterator<Item = EdgeKey> + '_> {
        (**self).edges_between(src, dst)
    }
    fn edge_attrs(&self, src: NodeId, dst: NodeId, key: EdgeKey) -> Option<&Attrs> {
        (**self).edge_attrs(src, dst, key)
    }
    fn is_directed(&self) -> bool {
        (**self).is_directed()
    }
    fn is_multigraph(&self) -> bool {
        (**self).is_multigraph()
    }
}
