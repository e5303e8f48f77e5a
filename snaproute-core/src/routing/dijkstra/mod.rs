//! Multi-source Dijkstra over the spliced graph

mod state;

use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use super::splice::{HalfEdge, SplicedNode};
use state::State;

/// Least-cost labels of every node reached by a search
#[derive(Debug, Clone)]
pub(crate) struct SearchTree {
    direction: Direction,
    costs: Vec<f64>,
    origins: Vec<usize>,
    predecessors: Vec<Option<EdgeIndex>>,
}

impl SearchTree {
    pub(crate) fn cost(&self, node: NodeIndex) -> Option<f64> {
        let cost = self.costs[node.index()];
        cost.is_finite().then_some(cost)
    }

    /// Source label `node` was reached from
    pub(crate) fn origin(&self, node: NodeIndex) -> Option<usize> {
        self.cost(node).map(|_| self.origins[node.index()])
    }

    /// Arcs from the winning source to `node`, in travel order
    pub(crate) fn path_to(
        &self,
        graph: &DiGraph<SplicedNode, HalfEdge>,
        node: NodeIndex,
    ) -> Vec<EdgeIndex> {
        let mut arcs = Vec::new();
        let mut current = node;
        while let Some(arc) = self.predecessors[current.index()] {
            arcs.push(arc);
            let Some((source, target)) = graph.edge_endpoints(arc) else {
                break;
            };
            current = match self.direction {
                Direction::Outgoing => source,
                Direction::Incoming => target,
            };
            if arcs.len() > graph.edge_count() {
                break;
            }
        }
        if self.direction == Direction::Outgoing {
            arcs.reverse();
        }
        arcs
    }
}

/// Runs Dijkstra from every `(label, node)` source at cost zero.
///
/// `Incoming` walks arcs backwards, giving costs *to* the sources. Equal costs
/// are resolved towards the lowest source label. With `max_cost`, labels above
/// it are never set. With `targets`, the search stops once all of them are
/// settled.
pub(crate) fn dijkstra(
    graph: &DiGraph<SplicedNode, HalfEdge>,
    sources: &[(usize, NodeIndex)],
    direction: Direction,
    max_cost: Option<f64>,
    targets: &[NodeIndex],
) -> SearchTree {
    let node_count = graph.node_count();
    let mut costs = vec![f64::INFINITY; node_count];
    let mut origins = vec![usize::MAX; node_count];
    let mut predecessors: Vec<Option<EdgeIndex>> = vec![None; node_count];
    let mut settled = FixedBitSet::with_capacity(node_count);
    let mut heap = BinaryHeap::with_capacity(sources.len().max(16));

    let mut pending = FixedBitSet::with_capacity(node_count);
    for target in targets {
        pending.insert(target.index());
    }
    let mut remaining = pending.count_ones(..);

    for &(origin, node) in sources {
        let index = node.index();
        if improves(0.0, origin, costs[index], origins[index]) {
            costs[index] = 0.0;
            origins[index] = origin;
            heap.push(State {
                cost: 0.0,
                origin,
                node,
            });
        }
    }

    while let Some(State { cost, origin, node }) = heap.pop() {
        let index = node.index();
        if settled.contains(index) {
            continue;
        }
        // Stale entry, a better label was pushed since
        if cost != costs[index] || origin != origins[index] {
            continue;
        }
        settled.insert(index);

        if pending.contains(index) {
            pending.set(index, false);
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }

        for arc in graph.edges_directed(node, direction) {
            let next = match direction {
                Direction::Outgoing => arc.target(),
                Direction::Incoming => arc.source(),
            };
            let next_index = next.index();
            if settled.contains(next_index) {
                continue;
            }

            let next_cost = cost + arc.weight().weight;
            if let Some(max) = max_cost
                && next_cost > max
            {
                continue;
            }

            if improves(next_cost, origin, costs[next_index], origins[next_index]) {
                costs[next_index] = next_cost;
                origins[next_index] = origin;
                predecessors[next_index] = Some(arc.id());
                heap.push(State {
                    cost: next_cost,
                    origin,
                    node: next,
                });
            }
        }
    }

    SearchTree {
        direction,
        costs,
        origins,
        predecessors,
    }
}

fn improves(cost: f64, origin: usize, best_cost: f64, best_origin: usize) -> bool {
    cost < best_cost || (cost == best_cost && origin < best_origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(weight: f64) -> HalfEdge {
        HalfEdge {
            edge: 0,
            from_fraction: 0.0,
            to_fraction: 1.0,
            weight,
        }
    }

    /// a → b → d, a → c → d with the lower branch cheaper
    fn diamond() -> (DiGraph<SplicedNode, HalfEdge>, [NodeIndex; 4]) {
        let mut graph = DiGraph::new();
        let nodes = [1, 2, 3, 4].map(|id| graph.add_node(SplicedNode::Real(id)));
        let [a, b, c, d] = nodes;
        graph.add_edge(a, b, arc(1.0));
        graph.add_edge(b, d, arc(5.0));
        graph.add_edge(a, c, arc(2.0));
        graph.add_edge(c, d, arc(2.0));
        (graph, nodes)
    }

    #[test]
    fn finds_cheapest_branch() {
        let (graph, [a, _, c, d]) = diamond();
        let tree = dijkstra(&graph, &[(0, a)], Direction::Outgoing, None, &[d]);
        assert_eq!(tree.cost(d), Some(4.0));

        let path = tree.path_to(&graph, d);
        let first = graph.edge_endpoints(path[0]).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(first, (a, c));
    }

    #[test]
    fn incoming_costs_lead_to_source() {
        let (graph, [a, b, _, d]) = diamond();
        let tree = dijkstra(&graph, &[(0, d)], Direction::Incoming, None, &[]);
        assert_eq!(tree.cost(a), Some(4.0));
        assert_eq!(tree.cost(b), Some(5.0));

        let path = tree.path_to(&graph, a);
        let last = graph.edge_endpoints(*path.last().unwrap()).unwrap();
        assert_eq!(last.1, d);
    }

    #[test]
    fn max_cost_bounds_labels() {
        let (graph, [a, b, c, d]) = diamond();
        let tree = dijkstra(&graph, &[(0, a)], Direction::Outgoing, Some(2.0), &[]);
        assert_eq!(tree.cost(b), Some(1.0));
        assert_eq!(tree.cost(c), Some(2.0));
        assert_eq!(tree.cost(d), None);
    }

    #[test]
    fn ties_go_to_lowest_source_label() {
        let mut graph = DiGraph::new();
        let left = graph.add_node(SplicedNode::Real(1));
        let right = graph.add_node(SplicedNode::Real(2));
        let middle = graph.add_node(SplicedNode::Real(3));
        graph.add_edge(left, middle, arc(3.0));
        graph.add_edge(right, middle, arc(3.0));

        let tree = dijkstra(
            &graph,
            &[(1, right), (0, left)],
            Direction::Outgoing,
            None,
            &[middle],
        );
        assert_eq!(tree.origin(middle), Some(0));
    }

    #[test]
    fn unreachable_nodes_have_no_cost() {
        let (mut graph, [a, ..]) = diamond();
        let island = graph.add_node(SplicedNode::Real(9));
        let tree = dijkstra(&graph, &[(0, a)], Direction::Outgoing, None, &[island]);
        assert_eq!(tree.cost(island), None);
        assert!(tree.path_to(&graph, island).is_empty());
    }
}
