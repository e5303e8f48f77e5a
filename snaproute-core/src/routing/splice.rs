//! Request-scoped overlay cutting matched edges at snap points.
//!
//! Every edge becomes a chain of arcs between its real endpoints and the
//! virtual nodes lying on it, ordered by fraction. An arc remembers the
//! fractions it spans, so crops in either direction and several cuts on the
//! same edge are handled the same way. The provider's edges are never
//! modified.

use std::sync::Arc;

use hashbrown::HashMap;
use log::{debug, warn};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::model::{Edge, SnapCandidate};
use crate::{EdgeId, NodeId};

/// Which query endpoint a virtual node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Start,
    End,
}

/// Search-time node created at a snap candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualNode {
    /// Negative: starts count down from -1, then ends
    pub id: NodeId,
    pub side: Side,
    /// Position of the candidate in its side's candidate list
    pub candidate: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplicedNode {
    Real(NodeId),
    Virtual(VirtualNode),
}

impl SplicedNode {
    pub fn id(&self) -> NodeId {
        match self {
            SplicedNode::Real(id) => *id,
            SplicedNode::Virtual(node) => node.id,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, SplicedNode::Virtual(_))
    }
}

/// Directed traversal of part of an edge.
///
/// `from_fraction < to_fraction` follows the stored orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfEdge {
    /// Index into [`SplicedGraph::edges`]
    pub edge: usize,
    pub from_fraction: f64,
    pub to_fraction: f64,
    /// Prorated cost under the searched type
    pub weight: f64,
}

impl HalfEdge {
    pub fn is_forward(&self) -> bool {
        self.from_fraction <= self.to_fraction
    }
}

/// Network graph with snap candidates spliced in as virtual nodes
#[derive(Debug)]
pub struct SplicedGraph<'a> {
    edges: &'a [Arc<Edge>],
    pub(crate) graph: DiGraph<SplicedNode, HalfEdge>,
    starts: Vec<Option<NodeIndex>>,
    ends: Vec<Option<NodeIndex>>,
}

impl<'a> SplicedGraph<'a> {
    /// Splices `starts` and `ends` into `edges`, weighting arcs by `cost_type`.
    ///
    /// Directions with a negative or missing cost get no arc. Candidates on an
    /// edge missing from `edges` are dropped.
    pub fn build(
        edges: &'a [Arc<Edge>],
        starts: &[SnapCandidate],
        ends: &[SnapCandidate],
        cost_type: &str,
    ) -> Self {
        let index_of: HashMap<EdgeId, usize> = edges
            .iter()
            .enumerate()
            .map(|(index, edge)| (edge.id, index))
            .collect();

        let mut graph: DiGraph<SplicedNode, HalfEdge> =
            DiGraph::with_capacity(edges.len() + starts.len() + ends.len(), edges.len() * 2);
        let mut cuts: HashMap<usize, Vec<(f64, NodeIndex)>> = HashMap::new();

        let mut next_virtual_id: NodeId = -1;
        let mut splice_side = |side: Side, candidates: &[SnapCandidate]| -> Vec<Option<NodeIndex>> {
            candidates
                .iter()
                .enumerate()
                .map(|(position, candidate)| {
                    let id = next_virtual_id;
                    next_virtual_id -= 1;
                    let Some(&edge) = index_of.get(&candidate.edge_id) else {
                        warn!("Snap candidate on unknown edge {}", candidate.edge_id);
                        return None;
                    };
                    let node = graph.add_node(SplicedNode::Virtual(VirtualNode {
                        id,
                        side,
                        candidate: position,
                    }));
                    cuts.entry(edge).or_default().push((candidate.fraction, node));
                    Some(node)
                })
                .collect()
        };
        let start_nodes = splice_side(Side::Start, starts);
        let end_nodes = splice_side(Side::End, ends);

        let mut real: HashMap<NodeId, NodeIndex> = HashMap::new();
        for (index, edge) in edges.iter().enumerate() {
            let source = *real
                .entry(edge.source)
                .or_insert_with(|| graph.add_node(SplicedNode::Real(edge.source)));
            let target = *real
                .entry(edge.target)
                .or_insert_with(|| graph.add_node(SplicedNode::Real(edge.target)));

            let mut stops = vec![(0.0, source)];
            if let Some(edge_cuts) = cuts.get_mut(&index) {
                edge_cuts.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
                stops.extend(edge_cuts.iter().copied());
            }
            stops.push((1.0, target));

            let forward = edge.cost(cost_type);
            let backward = edge.reverse_cost(cost_type);
            for pair in stops.windows(2) {
                let ((from, from_node), (to, to_node)) = (pair[0], pair[1]);
                let span = to - from;
                if let Some(cost) = forward {
                    graph.add_edge(
                        from_node,
                        to_node,
                        HalfEdge {
                            edge: index,
                            from_fraction: from,
                            to_fraction: to,
                            weight: span * cost,
                        },
                    );
                }
                if let Some(cost) = backward {
                    graph.add_edge(
                        to_node,
                        from_node,
                        HalfEdge {
                            edge: index,
                            from_fraction: to,
                            to_fraction: from,
                            weight: span * cost,
                        },
                    );
                }
            }
        }

        debug!(
            "Spliced graph: {} nodes, {} arcs, {} cut edges",
            graph.node_count(),
            graph.edge_count(),
            cuts.len()
        );

        Self {
            edges,
            graph,
            starts: start_nodes,
            ends: end_nodes,
        }
    }

    pub fn edges(&self) -> &'a [Arc<Edge>] {
        self.edges
    }

    pub fn edge(&self, half: &HalfEdge) -> &'a Edge {
        &self.edges[half.edge]
    }

    pub fn node(&self, index: NodeIndex) -> SplicedNode {
        self.graph[index]
    }

    /// Virtual node per start candidate, `None` for dropped candidates
    pub fn starts(&self) -> &[Option<NodeIndex>] {
        &self.starts
    }

    pub fn ends(&self) -> &[Option<NodeIndex>] {
        &self.ends
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}
