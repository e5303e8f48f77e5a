//! Least-cost search over the network spliced with snapped endpoints

pub mod assembler;
pub(crate) mod dijkstra;
pub mod path;
pub mod splice;

pub use assembler::{
    Connector, PathFeature, RouteResponse, Segment, SegmentKind, SnappingDistance, assemble,
};
pub use path::{Path, PathStep, shortest_path};
pub use splice::{HalfEdge, Side, SplicedGraph, SplicedNode, VirtualNode};
