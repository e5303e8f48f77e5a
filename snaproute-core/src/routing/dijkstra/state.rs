use std::cmp::Ordering;

use petgraph::graph::NodeIndex;

#[derive(Copy, Clone, Debug)]
pub(super) struct State {
    pub(super) cost: f64,
    /// Label of the source the cost is measured from
    pub(super) origin: usize,
    pub(super) node: NodeIndex,
}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost, then by origin label (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.origin.cmp(&self.origin))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn heap_pops_cheapest_then_lowest_origin() {
        let mut heap = BinaryHeap::new();
        for (cost, origin) in [(5.0, 0), (1.0, 2), (1.0, 1), (3.0, 0)] {
            heap.push(State {
                cost,
                origin,
                node: NodeIndex::new(0),
            });
        }
        let order: Vec<(f64, usize)> = std::iter::from_fn(|| heap.pop())
            .map(|s| (s.cost, s.origin))
            .collect();
        assert_eq!(order, vec![(1.0, 1), (1.0, 2), (3.0, 0), (5.0, 0)]);
    }
}
