//! Network edges and snap results

use geo::{LineString, Point};
use hashbrown::HashMap;
use serde_json::Value as JsonValue;

use crate::{EdgeId, FRACTION_EPSILON, NodeId};

/// Directed network edge, owned by the network provider
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// Polyline from `source` to `target`, in lon/lat
    pub geometry: LineString<f64>,
    /// Cost per type when traversed source → target
    pub costs: HashMap<String, f64>,
    /// Cost per type when traversed target → source
    pub reverse_costs: HashMap<String, f64>,
    pub filters: HashMap<String, bool>,
    /// Passthrough attributes
    pub properties: HashMap<String, JsonValue>,
}

impl Edge {
    /// Forward cost, `None` when the edge can not be traversed forward
    pub fn cost(&self, cost_type: &str) -> Option<f64> {
        traversable(self.costs.get(cost_type))
    }

    /// Backward cost, `None` when the edge can not be traversed backward
    pub fn reverse_cost(&self, cost_type: &str) -> Option<f64> {
        traversable(self.reverse_costs.get(cost_type))
    }

    /// Cost of travelling along the edge between two fractions.
    ///
    /// `from < to` is a forward traversal prorated on the forward cost,
    /// otherwise the reverse cost is used.
    pub fn directed_cost(&self, cost_type: &str, from: f64, to: f64) -> Option<f64> {
        let full = if from <= to {
            self.cost(cost_type)?
        } else {
            self.reverse_cost(cost_type)?
        };
        Some((to - from).abs() * full)
    }

    /// True when any of the requested filters is set on this edge
    pub fn is_excluded(&self, avoid: &[String]) -> bool {
        avoid
            .iter()
            .any(|name| self.filters.get(name).copied().unwrap_or(false))
    }

    /// Property values in the given order, `null` for absent ones
    pub fn property_tuple(&self, names: &[String]) -> Vec<JsonValue> {
        names
            .iter()
            .map(|name| self.properties.get(name).cloned().unwrap_or(JsonValue::Null))
            .collect()
    }
}

fn traversable(cost: Option<&f64>) -> Option<f64> {
    cost.copied().filter(|c| c.is_finite() && *c >= 0.0)
}

/// Raw nearest-edge match reported by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMatch {
    pub edge_id: EdgeId,
    pub fraction: f64,
    /// Great-circle distance in meters from the query point
    pub distance: f64,
    /// Location of `fraction` on the edge geometry
    pub point: Point<f64>,
}

/// Position on the network proposed for a free coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct SnapCandidate {
    pub edge_id: EdgeId,
    /// Always strictly inside the edge, see [`FRACTION_EPSILON`]
    pub fraction: f64,
    pub distance: f64,
    pub point: Point<f64>,
}

impl From<EdgeMatch> for SnapCandidate {
    fn from(m: EdgeMatch) -> Self {
        Self {
            edge_id: m.edge_id,
            fraction: clamp_fraction(m.fraction),
            distance: m.distance,
            point: m.point,
        }
    }
}

/// Keeps a fraction off the real endpoints so a virtual node never
/// coincides with the edge's source or target.
pub fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        return FRACTION_EPSILON;
    }
    fraction.clamp(FRACTION_EPSILON, 1.0 - FRACTION_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::straight_edge;

    #[test]
    fn clamps_exact_endpoints() {
        assert_eq!(clamp_fraction(0.0), FRACTION_EPSILON);
        assert_eq!(clamp_fraction(1.0), 1.0 - FRACTION_EPSILON);
        assert_eq!(clamp_fraction(0.25), 0.25);
        assert!(clamp_fraction(f64::NAN) > 0.0);
    }

    #[test]
    fn directed_cost_prorates_by_direction() {
        let mut edge = straight_edge(1, 1, 2, (0.0, 0.0), (1.0, 0.0), 10.0);
        edge.reverse_costs.insert("duration".to_string(), 30.0);

        let forward = edge.directed_cost("duration", 0.25, 1.0).unwrap();
        let backward = edge.directed_cost("duration", 0.5, 0.0).unwrap();
        assert!((forward - 7.5).abs() < 1e-12);
        assert!((backward - 15.0).abs() < 1e-12);
    }

    #[test]
    fn negative_cost_closes_direction() {
        let mut edge = straight_edge(1, 1, 2, (0.0, 0.0), (1.0, 0.0), 10.0);
        edge.reverse_costs.insert("duration".to_string(), -1.0);
        assert_eq!(edge.reverse_cost("duration"), None);
        assert_eq!(edge.directed_cost("duration", 0.8, 0.2), None);
        assert!(edge.directed_cost("duration", 0.2, 0.8).is_some());
    }

    #[test]
    fn exclusion_follows_filters() {
        let mut edge = straight_edge(1, 1, 2, (0.0, 0.0), (1.0, 0.0), 10.0);
        edge.filters.insert("toll".to_string(), true);
        edge.filters.insert("highway".to_string(), false);
        assert!(edge.is_excluded(&["toll".to_string()]));
        assert!(!edge.is_excluded(&["highway".to_string()]));
        assert!(!edge.is_excluded(&[]));
    }
}
