use petgraph::Direction;
use petgraph::graph::NodeIndex;

use super::dijkstra::dijkstra;
use super::splice::{HalfEdge, SplicedGraph};
use crate::{EdgeId, NodeId};

/// One traversed arc of a path
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    pub seq: usize,
    /// Spliced graph endpoints of the arc
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub source_node: NodeId,
    pub target_node: NodeId,
    pub edge_id: EdgeId,
    pub half_edge: HalfEdge,
}

/// Least-cost path between one start and one end candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Index of the winning start candidate
    pub start: usize,
    /// Index of the winning end candidate
    pub end: usize,
    pub cost: f64,
    pub steps: Vec<PathStep>,
}

/// Single least-cost path over all start × end candidate pairs.
///
/// Ties are broken by lowest start candidate, then lowest end candidate.
/// `None` when no pair is connected.
pub fn shortest_path(spliced: &SplicedGraph<'_>) -> Option<Path> {
    let sources = labelled(spliced.starts());
    let targets = labelled(spliced.ends());
    if sources.is_empty() || targets.is_empty() {
        return None;
    }

    let target_nodes: Vec<NodeIndex> = targets.iter().map(|&(_, node)| node).collect();
    let tree = dijkstra(
        &spliced.graph,
        &sources,
        Direction::Outgoing,
        None,
        &target_nodes,
    );

    let (end, node, cost, start) = targets
        .iter()
        .filter_map(|&(end, node)| Some((end, node, tree.cost(node)?, tree.origin(node)?)))
        .min_by(|a, b| {
            a.2.total_cmp(&b.2)
                .then_with(|| a.3.cmp(&b.3))
                .then_with(|| a.0.cmp(&b.0))
        })?;

    let steps = tree
        .path_to(&spliced.graph, node)
        .into_iter()
        .enumerate()
        .filter_map(|(seq, arc)| {
            let (from, to) = spliced.graph.edge_endpoints(arc)?;
            let half_edge = *spliced.graph.edge_weight(arc)?;
            Some(PathStep {
                seq: seq + 1,
                source: from,
                target: to,
                source_node: spliced.node(from).id(),
                target_node: spliced.node(to).id(),
                edge_id: spliced.edge(&half_edge).id,
                half_edge,
            })
        })
        .collect();

    Some(Path {
        start,
        end,
        cost,
        steps,
    })
}

fn labelled(nodes: &[Option<NodeIndex>]) -> Vec<(usize, NodeIndex)> {
    nodes
        .iter()
        .enumerate()
        .filter_map(|(label, node)| node.map(|node| (label, node)))
        .collect()
}
