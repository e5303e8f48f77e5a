// Re-export key components
pub use crate::algo::{Isocurve, IsocurveResponse};
pub use crate::config::{EngineConfig, IsocurveConfig, TableRef};
pub use crate::engine::RoutingEngine;
pub use crate::params::{Direction, IsocurveParams, ListParam, RouteParams, ValuesParam};
pub use crate::provider::{MemoryNetwork, NetworkProvider};
pub use crate::routing::RouteResponse;

// Core types for the network
pub use crate::EdgeId;
pub use crate::NodeId;
pub use crate::{Error, ErrorKind, SchemaInfo};
