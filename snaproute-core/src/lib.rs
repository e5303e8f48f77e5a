//! Least-cost routing and isocurve computation over a cost-weighted road network.
//!
//! Arbitrary coordinates are snapped onto the network, spliced into the graph as
//! virtual nodes, and searched with Dijkstra while every declared cost type is
//! accounted along the winning path.

pub mod algo;
pub mod config;
pub mod engine;
mod error;
pub mod geometry;
pub mod model;
pub mod params;
pub mod prelude;
pub mod provider;
pub mod routing;
pub mod snapping;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{EngineConfig, IsocurveConfig, TableRef};
pub use engine::RoutingEngine;
pub use error::{Error, ErrorKind};
pub use model::{Edge, SchemaInfo, SnapCandidate};
pub use provider::{MemoryNetwork, NetworkProvider, ProviderError};

/// Identifier of a network edge, as stored by the provider
pub type EdgeId = i64;
/// Identifier of a network node; virtual nodes use negative values
pub type NodeId = i64;

/// Fractions are kept this far away from the real endpoints of an edge
pub const FRACTION_EPSILON: f64 = 1e-5;
