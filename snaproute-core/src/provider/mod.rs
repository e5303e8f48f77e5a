//! Read-only access to the network data the engine routes over

mod memory;

use std::sync::Arc;

use geo::Point;
use thiserror::Error;

use crate::config::TableRef;
use crate::model::{Edge, EdgeMatch};
use crate::EdgeId;

pub use memory::MemoryNetwork;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("relation \"{0}\" does not exist")]
    UnknownTable(String),
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Network data provider queried by the routing engine.
///
/// Every call is a read; implementations own their retry and timeout policy.
pub trait NetworkProvider: Send + Sync {
    /// Column names of the edge table, in declaration order
    fn attribute_catalog(&self, table: &TableRef) -> Result<Vec<String>, ProviderError>;

    /// Edges within `max_distance` meters of `point`, nearest first,
    /// skipping edges flagged by any filter in `avoid`
    fn nearest_edges(
        &self,
        table: &TableRef,
        point: Point<f64>,
        max_distance: f64,
        avoid: &[String],
    ) -> Result<Vec<EdgeMatch>, ProviderError>;

    fn edge_by_id(&self, table: &TableRef, id: EdgeId) -> Result<Option<Arc<Edge>>, ProviderError>;

    /// All edges not flagged by any filter in `avoid`
    fn edges(&self, table: &TableRef, avoid: &[String]) -> Result<Vec<Arc<Edge>>, ProviderError>;

    /// Version of the backing store
    fn version(&self) -> Result<String, ProviderError>;
}

impl<P: NetworkProvider + ?Sized> NetworkProvider for Arc<P> {
    fn attribute_catalog(&self, table: &TableRef) -> Result<Vec<String>, ProviderError> {
        (**self).attribute_catalog(table)
    }

    fn nearest_edges(
        &self,
        table: &TableRef,
        point: Point<f64>,
        max_distance: f64,
        avoid: &[String],
    ) -> Result<Vec<EdgeMatch>, ProviderError> {
        (**self).nearest_edges(table, point, max_distance, avoid)
    }

    fn edge_by_id(&self, table: &TableRef, id: EdgeId) -> Result<Option<Arc<Edge>>, ProviderError> {
        (**self).edge_by_id(table, id)
    }

    fn edges(&self, table: &TableRef, avoid: &[String]) -> Result<Vec<Arc<Edge>>, ProviderError> {
        (**self).edges(table, avoid)
    }

    fn version(&self) -> Result<String, ProviderError> {
        (**self).version()
    }
}
