//! Subgraph-isomorphism search: enumerates embeddings of one motif in the
//! host graph as a lazy, backtracking iterator.

use crate::ast::EdgeDirection;
use crate::motif::{Motif, MotifEdge, labels_match, properties_match};
use log::{debug, trace};
use minicypher_api::{EdgeKey, EdgeRef, HostGraph, NodeId, labels_of};
use std::collections::{BTreeMap, HashSet};

/// The host realization of one pattern edge: a sequence of hops. A
/// single-hop edge has one hop holding every qualifying parallel edge; a
/// variable-length edge has one chosen instance per hop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct EdgeBinding {
    pub hops: Vec<Vec<EdgeRef>>,
}

impl EdgeBinding {
    pub fn is_single_hop(&self) -> bool {
        self.hops.len() == 1
    }

    pub fn path_len(&self) -> usize {
        self.hops.len()
    }
}

/// A complete match: host node per pattern node (by motif index), host
/// realization per pattern edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Embedding {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeBinding>,
}

/// A variable's bound value in a joined row.
#[derive(Debug, Clone, PartialEq)]
pub enum VarBinding {
    Node(NodeId),
    Edge(EdgeBinding),
}

pub type VarBindings = BTreeMap<String, VarBinding>;

/// Extracts the named bindings of an embedding.
pub fn embedding_bindings(motif: &Motif, embedding: &Embedding) -> VarBindings {
    let mut vars = VarBindings::new();
    for (idx, node) in motif.nodes.iter().enumerate() {
        if !node.anonymous {
            vars.insert(node.name.clone(), VarBinding::Node(embedding.nodes[idx]));
        }
    }
    for (idx, edge) in motif.edges.iter().enumerate() {
        if let Some(name) = &edge.variable {
            vars.insert(
                name.clone(),
                VarBinding::Edge(embedding.edges[idx].clone()),
            );
        }
    }
    vars
}

enum Step {
    /// Bind a pattern node, then satisfy every single-hop edge between it
    /// and already-bound nodes (deterministic: fail or bind-all).
    BindNode {
        node: usize,
        single_edges: Vec<usize>,
    },
    /// Choose one qualifying simple path for a variable-length edge whose
    /// endpoints are both bound.
    PathEdge { edge: usize },
}

enum Frame {
    Node {
        next: usize,
        consumed: Vec<EdgeRef>,
    },
    Path {
        paths: Vec<Vec<EdgeRef>>,
        next: usize,
        consumed: Vec<EdgeRef>,
    },
}

pub struct MotifMatcher<'a, G: HostGraph> {
    graph: &'a G,
    motif: &'a Motif,
    steps: Vec<Step>,
    candidates: Vec<Vec<NodeId>>,
    assignment: Vec<Option<NodeId>>,
    bound: HashSet<NodeId>,
    used: HashSet<EdgeRef>,
    edge_bindings: Vec<Option<EdgeBinding>>,
    frames: Vec<Frame>,
    resume: bool,
    done: bool,
}

impl<'a, G: HostGraph> MotifMatcher<'a, G> {
    /// `pins` restricts pattern nodes (by motif index) to a single host
    /// id; a pin failing the node's own predicates empties the stream.
    pub fn new(graph: &'a G, motif: &'a Motif, pins: &BTreeMap<usize, NodeId>) -> Self {
        let candidates: Vec<Vec<NodeId>> = motif
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, mnode)| {
                let accepts = |id: NodeId| {
                    graph.node_attrs(id).is_some_and(|attrs| {
                        labels_match(mnode.labels.as_ref(), &labels_of(attrs))
                            && properties_match(&mnode.properties, attrs)
                    })
                };
                match pins.get(&idx) {
                    Some(&pin) => {
                        if accepts(pin) {
                            vec![pin]
                        } else {
                            Vec::new()
                        }
                    }
                    None => graph.nodes().filter(|&id| accepts(id)).collect(),
                }
            })
            .collect();

        let order = search_order(motif, &candidates);
        debug!(
            "motif search order: {:?}",
            order
                .iter()
                .map(|&i| motif.nodes[i].name.as_str())
                .collect::<Vec<_>>()
        );

        // Each edge is resolved at the step that binds its later endpoint.
        let mut steps = Vec::new();
        let mut placed = vec![false; motif.nodes.len()];
        let mut edge_done = vec![false; motif.edges.len()];
        for &node in &order {
            placed[node] = true;
            let mut single_edges = Vec::new();
            let mut path_edges = Vec::new();
            for (e, medge) in motif.edges.iter().enumerate() {
                if edge_done[e] || !placed[medge.src] || !placed[medge.dst] {
                    continue;
                }
                edge_done[e] = true;
                if medge.hops.is_single() {
                    single_edges.push(e);
                } else {
                    path_edges.push(e);
                }
            }
            steps.push(Step::BindNode { node, single_edges });
            for edge in path_edges {
                steps.push(Step::PathEdge { edge });
            }
        }

        let node_count = motif.nodes.len();
        let edge_count = motif.edges.len();
        Self {
            graph,
            motif,
            steps,
            candidates,
            assignment: vec![None; node_count],
            bound: HashSet::new(),
            used: HashSet::new(),
            edge_bindings: vec![None; edge_count],
            frames: Vec::new(),
            resume: false,
            done: false,
        }
    }

    fn snapshot(&self) -> Embedding {
        Embedding {
            nodes: self
                .assignment
                .iter()
                .map(|a| a.expect("all pattern nodes bound"))
                .collect(),
            edges: self
                .edge_bindings
                .iter()
                .map(|b| b.clone().expect("all pattern edges resolved"))
                .collect(),
        }
    }

    /// Canonical form for the disjointness set; undirected hosts collapse
    /// both orientations of an edge onto one coordinate.
    fn canon(&self, instance: EdgeRef) -> EdgeRef {
        if self.graph.is_directed() || instance.src <= instance.dst {
            instance
        } else {
            EdgeRef {
                src: instance.dst,
                dst: instance.src,
                key: instance.key,
            }
        }
    }

    fn edge_qualifies(&self, medge: &MotifEdge, src: NodeId, dst: NodeId, key: EdgeKey) -> bool {
        self.graph.edge_attrs(src, dst, key).is_some_and(|attrs| {
            labels_match(medge.labels.as_ref(), &labels_of(attrs))
                && properties_match(&medge.properties, attrs)
        })
    }

    /// All unused host edges satisfying a single-hop pattern edge between
    /// two bound hosts. `extra` holds instances consumed earlier in the
    /// same tentative step.
    fn qualifying_instances(
        &self,
        medge: &MotifEdge,
        src_id: NodeId,
        dst_id: NodeId,
        extra: &[EdgeRef],
    ) -> Vec<EdgeRef> {
        let pairs: Vec<(NodeId, NodeId)> = if !self.graph.is_directed() {
            vec![(src_id, dst_id)]
        } else {
            match medge.direction {
                EdgeDirection::Forward => vec![(src_id, dst_id)],
                EdgeDirection::Reverse => vec![(dst_id, src_id)],
                EdgeDirection::Either => {
                    if src_id == dst_id {
                        vec![(src_id, dst_id)]
                    } else {
                        vec![(src_id, dst_id), (dst_id, src_id)]
                    }
                }
            }
        };

        let mut instances = Vec::new();
        for (a, b) in pairs {
            for key in self.graph.edges_between(a, b) {
                if !self.edge_qualifies(medge, a, b, key) {
                    continue;
                }
                let instance = EdgeRef {
                    src: a,
                    dst: b,
                    key,
                };
                let canon = self.canon(instance);
                if self.used.contains(&canon) || extra.contains(&canon) {
                    continue;
                }
                instances.push(instance);
            }
        }
        instances
    }

    /// Qualifying simple paths realizing a variable-length edge between
    /// its two bound endpoints.
    fn find_paths(&self, medge: &MotifEdge) -> Vec<Vec<EdgeRef>> {
        let src_id = self.assignment[medge.src].expect("endpoint bound");
        let dst_id = self.assignment[medge.dst].expect("endpoint bound");
        // A reversed edge is a forward walk from the far endpoint.
        let (start, goal) = match medge.direction {
            EdgeDirection::Reverse if self.graph.is_directed() => (dst_id, src_id),
            _ => (src_id, dst_id),
        };
        let lo = medge.hops.min as usize;
        let hi = medge.hops.max.map(|m| m as usize).unwrap_or(usize::MAX);

        let mut paths = Vec::new();
        if lo == 0 && start == goal {
            paths.push(Vec::new());
        }
        if hi == 0 {
            return paths;
        }
        let mut visited = HashSet::from([start]);
        let mut path = Vec::new();
        self.dfs_paths(medge, start, goal, lo, hi, &mut visited, &mut path, &mut paths);
        paths
    }

    #[allow(clippy::too_many_arguments)]
    fn dfs_paths(
        &self,
        medge: &MotifEdge,
        current: NodeId,
        goal: NodeId,
        lo: usize,
        hi: usize,
        visited: &mut HashSet<NodeId>,
        path: &mut Vec<EdgeRef>,
        out: &mut Vec<Vec<EdgeRef>>,
    ) {
        if path.len() == hi {
            return;
        }
        for (instance, neighbor) in self.hop_instances(medge, current) {
            if self.used.contains(&self.canon(instance)) {
                continue;
            }
            // The goal check comes first so cycle patterns (same variable
            // at both ends) can close back onto the start node.
            if neighbor == goal {
                path.push(instance);
                if path.len() >= lo {
                    out.push(path.clone());
                }
                // A simple path cannot leave the goal and come back.
                path.pop();
                continue;
            }
            if visited.contains(&neighbor) {
                continue;
            }
            path.push(instance);
            visited.insert(neighbor);
            self.dfs_paths(medge, neighbor, goal, lo, hi, visited, path, out);
            visited.remove(&neighbor);
            path.pop();
        }
    }

    /// Qualifying one-hop continuations from `current`, in host
    /// orientation.
    fn hop_instances(
        &self,
        medge: &MotifEdge,
        current: NodeId,
    ) -> Vec<(EdgeRef, NodeId)> {
        let mut hops = Vec::new();
        let mut push_out = |hops: &mut Vec<(EdgeRef, NodeId)>| {
            for (neighbor, key) in self.graph.out_edges(current) {
                if self.edge_qualifies(medge, current, neighbor, key) {
                    hops.push((
                        EdgeRef {
                            src: current,
                            dst: neighbor,
                            key,
                        },
                        neighbor,
                    ));
                }
            }
        };
        if !self.graph.is_directed() {
            push_out(&mut hops);
            return hops;
        }
        match medge.direction {
            EdgeDirection::Forward | EdgeDirection::Reverse => push_out(&mut hops),
            EdgeDirection::Either => {
                push_out(&mut hops);
                for (neighbor, key) in self.graph.in_edges(current) {
                    if self.edge_qualifies(medge, neighbor, current, key) {
                        hops.push((
                            EdgeRef {
                                src: neighbor,
                                dst: current,
                                key,
                            },
                            neighbor,
                        ));
                    }
                }
            }
        }
        hops
    }

    fn new_frame(&self, step: usize) -> Frame {
        match &self.steps[step] {
            Step::BindNode { .. } => Frame::Node {
                next: 0,
                consumed: Vec::new(),
            },
            Step::PathEdge { edge } => Frame::Path {
                paths: self.find_paths(&self.motif.edges[*edge]),
                next: 0,
                consumed: Vec::new(),
            },
        }
    }

    /// Tries the next alternative of frame `idx`; commits bindings on
    /// success. The frame must hold no committed state on entry.
    fn advance_frame(&mut self, idx: usize) -> bool {
        match &self.steps[idx] {
            Step::BindNode { node, single_edges } => {
                let node = *node;
                let single_edges = single_edges.clone();
                loop {
                    let Frame::Node { next, .. } = &mut self.frames[idx] else {
                        unreachable!("step/frame kind mismatch");
                    };
                    let i = *next;
                    *next += 1;
                    if i >= self.candidates[node].len() {
                        return false;
                    }
                    let candidate = self.candidates[node][i];
                    if self.bound.contains(&candidate) {
                        continue;
                    }

                    // Resolve every single-hop edge this binding completes.
                    let mut tentative: Vec<EdgeRef> = Vec::new();
                    let mut bindings: Vec<(usize, Vec<EdgeRef>)> = Vec::new();
                    let mut ok = true;
                    for &e in &single_edges {
                        let medge = &self.motif.edges[e];
                        let src_id = self.endpoint_id(medge.src, node, candidate);
                        let dst_id = self.endpoint_id(medge.dst, node, candidate);
                        let instances =
                            self.qualifying_instances(medge, src_id, dst_id, &tentative);
                        if instances.is_empty() {
                            ok = false;
                            break;
                        }
                        tentative.extend(instances.iter().map(|&inst| self.canon(inst)));
                        bindings.push((e, instances));
                    }
                    if !ok {
                        continue;
                    }

                    self.assignment[node] = Some(candidate);
                    self.bound.insert(candidate);
                    for &inst in &tentative {
                        self.used.insert(inst);
                    }
                    for (e, instances) in bindings {
                        self.edge_bindings[e] = Some(EdgeBinding {
                            hops: vec![instances],
                        });
                    }
                    let Frame::Node { consumed, .. } = &mut self.frames[idx] else {
                        unreachable!("step/frame kind mismatch");
                    };
                    *consumed = tentative;
                    return true;
                }
            }
            Step::PathEdge { edge } => {
                let edge = *edge;
                loop {
                    let Frame::Path { paths, next, .. } = &mut self.frames[idx] else {
                        unreachable!("step/frame kind mismatch");
                    };
                    let i = *next;
                    *next += 1;
                    if i >= paths.len() {
                        return false;
                    }
                    let path = paths[i].clone();
                    let consumed: Vec<EdgeRef> =
                        path.iter().map(|&inst| self.canon(inst)).collect();
                    // Frames below were fully restored, so the paths found
                    // at frame creation are still valid; keep the check as
                    // an invariant guard.
                    if consumed.iter().any(|inst| self.used.contains(inst)) {
                        continue;
                    }
                    for &inst in &consumed {
                        self.used.insert(inst);
                    }
                    self.edge_bindings[edge] = Some(EdgeBinding {
                        hops: path.into_iter().map(|inst| vec![inst]).collect(),
                    });
                    let Frame::Path { consumed: slot, .. } = &mut self.frames[idx] else {
                        unreachable!("step/frame kind mismatch");
                    };
                    *slot = consumed;
                    return true;
                }
            }
        }
    }

    fn endpoint_id(&self, endpoint: usize, binding_node: usize, candidate: NodeId) -> NodeId {
        if endpoint == binding_node {
            candidate
        } else {
            self.assignment[endpoint].expect("endpoint bound before edge resolution")
        }
    }

    /// Reverts the committed state of frame `idx`.
    fn undo_frame(&mut self, idx: usize) {
        match &self.steps[idx] {
            Step::BindNode { node, single_edges } => {
                let node = *node;
                let single_edges = single_edges.clone();
                if let Some(id) = self.assignment[node].take() {
                    self.bound.remove(&id);
                }
                for e in single_edges {
                    self.edge_bindings[e] = None;
                }
                let Frame::Node { consumed, .. } = &mut self.frames[idx] else {
                    unreachable!("step/frame kind mismatch");
                };
                let consumed = std::mem::take(consumed);
                for inst in consumed {
                    self.used.remove(&inst);
                }
            }
            Step::PathEdge { edge } => {
                let edge = *edge;
                self.edge_bindings[edge] = None;
                let Frame::Path { consumed, .. } = &mut self.frames[idx] else {
                    unreachable!("step/frame kind mismatch");
                };
                let consumed = std::mem::take(consumed);
                for inst in consumed {
                    self.used.remove(&inst);
                }
            }
        }
    }
}

impl<'a, G: HostGraph> Iterator for MotifMatcher<'a, G> {
    type Item = Embedding;

    fn next(&mut self) -> Option<Embedding> {
        if self.done {
            return None;
        }
        loop {
            if self.resume {
                if self.frames.is_empty() {
                    self.done = true;
                    return None;
                }
                let top = self.frames.len() - 1;
                self.undo_frame(top);
                if self.advance_frame(top) {
                    self.resume = false;
                } else {
                    self.frames.pop();
                }
            } else if self.frames.len() == self.steps.len() {
                self.resume = true;
                let embedding = self.snapshot();
                trace!("embedding: {:?}", embedding.nodes);
                return Some(embedding);
            } else {
                let idx = self.frames.len();
                let frame = self.new_frame(idx);
                self.frames.push(frame);
                if !self.advance_frame(idx) {
                    self.frames.pop();
                    self.resume = true;
                }
            }
        }
    }
}

/// Search order: smallest candidate set first, ties broken by the number
/// of motif edges into already-ordered nodes.
fn search_order(motif: &Motif, candidates: &[Vec<NodeId>]) -> Vec<usize> {
    let n = motif.nodes.len();
    let mut order = Vec::with_capacity(n);
    let mut placed = vec![false; n];
    for _ in 0..n {
        let mut best: Option<(usize, usize, usize)> = None; // (candidates, -connectivity proxy, idx)
        for idx in 0..n {
            if placed[idx] {
                continue;
            }
            let connectivity = motif
                .edges
                .iter()
                .filter(|e| {
                    (e.src == idx && placed[e.dst]) || (e.dst == idx && placed[e.src])
                })
                .count();
            let rank = (candidates[idx].len(), usize::MAX - connectivity, idx);
            if best.is_none_or(|b| rank < b) {
                best = Some(rank);
            }
        }
        let (_, _, idx) = best.expect("unplaced node exists");
        order.push(idx);
        placed[idx] = true;
    }
    order
}
