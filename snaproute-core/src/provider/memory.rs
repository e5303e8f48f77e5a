//! In-memory network provider backed by an R-tree over edge envelopes

use std::path::Path;
use std::sync::Arc;

use geo::{BoundingRect, LineString, Point};
use geojson::{Feature, FeatureCollection, GeoJson};
use hashbrown::HashMap;
use log::info;
use rstar::{AABB, RTree, RTreeObject};
use serde_json::Value as JsonValue;

use super::{NetworkProvider, ProviderError};
use crate::config::TableRef;
use crate::geometry::{haversine, locate_point, meters_to_degrees};
use crate::model::{Edge, EdgeMatch};
use crate::{EdgeId, NodeId};

/// Name the geometry column is reported under in the catalog
pub const GEOMETRY_COLUMN: &str = "the_geom";

#[derive(Debug, Clone)]
struct IndexedEdge {
    envelope: AABB<[f64; 2]>,
    index: usize,
}

impl RTreeObject for IndexedEdge {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Network kept entirely in memory, registered under a single table name
#[derive(Debug)]
pub struct MemoryNetwork {
    table: TableRef,
    catalog: Vec<String>,
    edges: Vec<Arc<Edge>>,
    by_id: HashMap<EdgeId, usize>,
    rtree: RTree<IndexedEdge>,
}

impl MemoryNetwork {
    /// Builds a network from edges and the attribute catalog describing them
    pub fn new(table: TableRef, catalog: Vec<String>, edges: Vec<Edge>) -> Result<Self, ProviderError> {
        let mut by_id = HashMap::with_capacity(edges.len());
        let mut entries = Vec::with_capacity(edges.len());

        for (index, edge) in edges.iter().enumerate() {
            if by_id.insert(edge.id, index).is_some() {
                return Err(ProviderError::InvalidData(format!(
                    "duplicate edge id {}",
                    edge.id
                )));
            }
            let rect = edge.geometry.bounding_rect().ok_or_else(|| {
                ProviderError::InvalidData(format!("edge {} has an empty geometry", edge.id))
            })?;
            entries.push(IndexedEdge {
                envelope: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
                index,
            });
        }

        info!("Indexed {} edges for table {table}", edges.len());

        Ok(Self {
            table,
            catalog,
            edges: edges.into_iter().map(Arc::new).collect(),
            by_id,
            rtree: RTree::bulk_load(entries),
        })
    }

    /// Reads a GeoJSON `FeatureCollection` of `LineString` edges
    pub fn from_geojson_path(table: TableRef, path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        info!("Loading network from {}", path.display());
        let data = std::fs::read_to_string(path)?;
        Self::from_geojson_str(table, &data)
    }

    pub fn from_geojson_str(table: TableRef, data: &str) -> Result<Self, ProviderError> {
        let geojson: GeoJson = data
            .parse()
            .map_err(|e: geojson::Error| ProviderError::GeoJson(e.to_string()))?;
        let collection = FeatureCollection::try_from(geojson)
            .map_err(|e| ProviderError::GeoJson(e.to_string()))?;
        Self::from_feature_collection(table, &collection)
    }

    /// Each feature needs integer `id`, `source` and `target` properties.
    ///
    /// `cost_*`, `reverse_cost_*` and `filter_*` properties become costs and
    /// filters, every other property is passed through.
    pub fn from_feature_collection(
        table: TableRef,
        collection: &FeatureCollection,
    ) -> Result<Self, ProviderError> {
        let mut catalog: Vec<String> = Vec::new();
        let mut edges = Vec::with_capacity(collection.features.len());

        for (position, feature) in collection.features.iter().enumerate() {
            if let Some(properties) = &feature.properties {
                for key in properties.keys() {
                    if key != GEOMETRY_COLUMN && !catalog.contains(key) {
                        catalog.push(key.clone());
                    }
                }
            }
            edges.push(edge_from_feature(position, feature)?);
        }
        catalog.push(GEOMETRY_COLUMN.to_string());

        Self::new(table, catalog, edges)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    fn check_table(&self, table: &TableRef) -> Result<(), ProviderError> {
        if *table == self.table {
            Ok(())
        } else {
            Err(ProviderError::UnknownTable(table.to_string()))
        }
    }
}

impl NetworkProvider for MemoryNetwork {
    fn attribute_catalog(&self, table: &TableRef) -> Result<Vec<String>, ProviderError> {
        self.check_table(table)?;
        Ok(self.catalog.clone())
    }

    fn nearest_edges(
        &self,
        table: &TableRef,
        point: Point<f64>,
        max_distance: f64,
        avoid: &[String],
    ) -> Result<Vec<EdgeMatch>, ProviderError> {
        self.check_table(table)?;

        // Generous box, exact distances are checked below
        let lat_delta = meters_to_degrees(max_distance) * 1.1;
        let lon_delta = lat_delta / point.y().to_radians().cos().abs().max(1e-6);
        let search = AABB::from_corners(
            [point.x() - lon_delta, point.y() - lat_delta],
            [point.x() + lon_delta, point.y() + lat_delta],
        );

        let mut matches: Vec<EdgeMatch> = self
            .rtree
            .locate_in_envelope_intersecting(&search)
            .map(|entry| &self.edges[entry.index])
            .filter(|edge| !edge.is_excluded(avoid))
            .filter_map(|edge| {
                let (fraction, located) = locate_point(&edge.geometry, &point)?;
                Some(EdgeMatch {
                    edge_id: edge.id,
                    fraction,
                    distance: haversine(point, located),
                    point: located,
                })
            })
            .filter(|m| m.distance <= max_distance)
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.edge_id.cmp(&b.edge_id))
        });
        Ok(matches)
    }

    fn edge_by_id(&self, table: &TableRef, id: EdgeId) -> Result<Option<Arc<Edge>>, ProviderError> {
        self.check_table(table)?;
        Ok(self.by_id.get(&id).map(|&index| Arc::clone(&self.edges[index])))
    }

    fn edges(&self, table: &TableRef, avoid: &[String]) -> Result<Vec<Arc<Edge>>, ProviderError> {
        self.check_table(table)?;
        Ok(self
            .edges
            .iter()
            .filter(|edge| !edge.is_excluded(avoid))
            .cloned()
            .collect())
    }

    fn version(&self) -> Result<String, ProviderError> {
        Ok(format!("snaproute-memory {}", env!("CARGO_PKG_VERSION")))
    }
}

fn edge_from_feature(position: usize, feature: &Feature) -> Result<Edge, ProviderError> {
    let invalid = |what: &str| ProviderError::InvalidData(format!("feature #{position}: {what}"));

    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| invalid("missing geometry"))?;
    let geometry = geo::Geometry::<f64>::try_from(geometry.clone())
        .map_err(|e| invalid(&e.to_string()))?;
    let geometry =
        LineString::<f64>::try_from(geometry).map_err(|_| invalid("geometry is not a LineString"))?;

    let empty = serde_json::Map::new();
    let properties = feature.properties.as_ref().unwrap_or(&empty);
    let node = |name: &str| -> Result<NodeId, ProviderError> {
        properties
            .get(name)
            .and_then(JsonValue::as_i64)
            .ok_or_else(|| invalid(&format!("missing integer `{name}`")))
    };

    let mut edge = Edge {
        id: node("id")?,
        source: node("source")?,
        target: node("target")?,
        geometry,
        costs: HashMap::new(),
        reverse_costs: HashMap::new(),
        filters: HashMap::new(),
        properties: HashMap::new(),
    };

    for (key, value) in properties {
        if matches!(key.as_str(), "id" | "source" | "target" | "seq" | GEOMETRY_COLUMN) {
            continue;
        }
        if let Some(cost_type) = key.strip_prefix("reverse_cost_") {
            edge.reverse_costs
                .insert(cost_type.to_string(), value.as_f64().unwrap_or(-1.0));
        } else if let Some(cost_type) = key.strip_prefix("cost_") {
            edge.costs
                .insert(cost_type.to_string(), value.as_f64().unwrap_or(-1.0));
        } else if let Some(filter) = key.strip_prefix("filter_") {
            edge.filters.insert(filter.to_string(), flag(value));
        } else {
            edge.properties.insert(key.clone(), value.clone());
        }
    }

    Ok(edge)
}

fn flag(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        JsonValue::String(s) => matches!(s.as_str(), "true" | "t" | "1"),
        _ => false,
    }
}
