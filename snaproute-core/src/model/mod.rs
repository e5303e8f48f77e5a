//! Data model of the road network and of request-scoped snapping results

pub mod edge;
pub mod schema;

pub use edge::{Edge, EdgeMatch, SnapCandidate};
pub use schema::SchemaInfo;
