//! Shared fixtures for unit tests.
//!
//! The fixture network (lon/lat):
//!
//! ```text
//!            4 (0.5,0.5)
//!            |  \
//!     e3 North Rd  e4 Cross Rd (highway)
//!            |      \
//! 1 --e1-- 2 --e2 (toll)-- 3        5 --e5-- 6  (isolated, around (2,2))
//! (0,0)  (0.5,0)         (1,0)
//! ```

use std::sync::Arc;

use geo::{LineString, Point};
use hashbrown::HashMap;

use crate::config::{EngineConfig, TableRef};
use crate::engine::RoutingEngine;
use crate::model::{Edge, SnapCandidate};
use crate::provider::MemoryNetwork;
use crate::{EdgeId, NodeId};

pub(crate) const FIXTURE_GEOJSON: &str = include_str!("../tests/fixtures/network.geojson");

pub(crate) fn fixture_table() -> TableRef {
    TableRef::new("public", "edge")
}

pub(crate) fn fixture_network() -> MemoryNetwork {
    MemoryNetwork::from_geojson_str(fixture_table(), FIXTURE_GEOJSON).unwrap()
}

pub(crate) fn fixture_engine(config: EngineConfig) -> RoutingEngine {
    RoutingEngine::new(config, Arc::new(fixture_network()))
}

/// Two-point edge with a symmetric `duration` cost
pub(crate) fn straight_edge(
    id: EdgeId,
    source: NodeId,
    target: NodeId,
    from: (f64, f64),
    to: (f64, f64),
    duration: f64,
) -> Edge {
    let mut costs = HashMap::new();
    costs.insert("duration".to_string(), duration);
    Edge {
        id,
        source,
        target,
        geometry: LineString::from(vec![from, to]),
        reverse_costs: costs.clone(),
        costs,
        filters: HashMap::new(),
        properties: HashMap::new(),
    }
}

pub(crate) fn candidate(edge_id: EdgeId, fraction: f64) -> SnapCandidate {
    SnapCandidate {
        edge_id,
        fraction,
        distance: 0.0,
        point: Point::new(0.0, 0.0),
    }
}
