//! Shared fixtures: Zachary's karate club as a directed host graph.
#![allow(dead_code)] // each test binary uses a different subset

use minicypher::{AttrValue, MemGraph, Value};

/// The 78 friendship ties of Zachary's karate club study.
pub const KARATE_EDGES: &[(u64, u64)] = &[
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (0, 5),
    (0, 6),
    (0, 7),
    (0, 8),
    (0, 10),
    (0, 11),
    (0, 12),
    (0, 13),
    (0, 17),
    (0, 19),
    (0, 21),
    (0, 31),
    (1, 2),
    (1, 3),
    (1, 7),
    (1, 13),
    (1, 17),
    (1, 19),
    (1, 21),
    (1, 30),
    (2, 3),
    (2, 7),
    (2, 8),
    (2, 9),
    (2, 13),
    (2, 27),
    (2, 28),
    (2, 32),
    (3, 7),
    (3, 12),
    (3, 13),
    (4, 6),
    (4, 10),
    (5, 6),
    (5, 10),
    (5, 16),
    (6, 16),
    (8, 30),
    (8, 32),
    (8, 33),
    (9, 33),
    (13, 33),
    (14, 32),
    (14, 33),
    (15, 32),
    (15, 33),
    (18, 32),
    (18, 33),
    (19, 33),
    (20, 32),
    (20, 33),
    (22, 32),
    (22, 33),
    (23, 25),
    (23, 27),
    (23, 29),
    (23, 32),
    (23, 33),
    (24, 25),
    (24, 27),
    (24, 31),
    (25, 31),
    (26, 29),
    (26, 33),
    (27, 33),
    (28, 31),
    (28, 33),
    (29, 32),
    (29, 33),
    (30, 32),
    (30, 33),
    (31, 32),
    (31, 33),
    (32, 33),
];

/// Faction membership after the split.
pub fn club(node: u64) -> &'static str {
    const MR_HI: &[u64] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 16, 17, 19, 21];
    if MR_HI.contains(&node) {
        "Mr. Hi"
    } else {
        "Officer"
    }
}

/// The club graph treated as directed: each tie becomes two arcs, as
/// converting an undirected graph to a directed one does.
pub fn karate_club() -> MemGraph {
    let mut graph = MemGraph::directed();
    for node in 0..34u64 {
        graph.add_node(
            node,
            [("club".to_string(), AttrValue::Str(club(node).to_string()))],
        );
    }
    for &(a, b) in KARATE_EDGES {
        graph.add_edge(a, b, []);
        graph.add_edge(b, a, []);
    }
    graph
}

/// Directed adjacency test against the fixture.
pub fn has_arc(a: u64, b: u64) -> bool {
    KARATE_EDGES.contains(&(a, b)) || KARATE_EDGES.contains(&(b, a))
}

/// Pulls the host id out of a reified node dictionary.
pub fn node_id(value: &Value) -> u64 {
    let Value::Map(map) = value else {
        panic!("expected a node dictionary, got {value:?}");
    };
    let Some(Value::Int(id)) = map.get("__id") else {
        panic!("node dictionary missing __id");
    };
    *id as u64
}
