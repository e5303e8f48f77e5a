//! Turns a winning path into reportable, merged route features

use std::ops::Range;

use geo::{Geometry, LineString, Point};
use geojson::{Feature, FeatureCollection, Geometry as GeoJsonGeometry, Value as GeoJsonValue};
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use super::path::Path;
use super::splice::SplicedGraph;
use crate::geometry::{directed_substring, haversine, merge_lines};
use crate::model::{SchemaInfo, SnapCandidate};
use crate::{EdgeId, Error};

/// How much of an edge a path step covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SegmentKind {
    Full,
    CroppedAtStart,
    CroppedAtEnd,
    CroppedAtBoth,
}

/// One traversed unit before merging
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub seq: usize,
    pub edge_id: EdgeId,
    pub kind: SegmentKind,
    /// Oriented in travel direction
    pub geometry: LineString<f64>,
    /// Aligned with [`SchemaInfo::types`]
    pub costs: Vec<f64>,
    /// Aligned with [`SchemaInfo::properties`]
    pub properties: Vec<JsonValue>,
}

/// Consecutive segments sharing one property tuple
#[derive(Debug, Clone, PartialEq)]
pub struct PathFeature {
    pub seq: usize,
    pub geometry: Geometry<f64>,
    pub costs: Vec<f64>,
    pub properties: Vec<JsonValue>,
    /// Covered range of [`RouteResponse::segments`]
    pub segments: Range<usize>,
}

/// Straight link between a query coordinate and its snap point
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub line: LineString<f64>,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnappingDistance {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub types: Vec<String>,
    pub property_names: Vec<String>,
    pub snapping_distance: SnappingDistance,
    /// Total per type, in type order
    pub cost: Vec<(String, f64)>,
    pub start_connector: Connector,
    pub features: Vec<PathFeature>,
    pub end_connector: Connector,
    /// Unmerged rows the features were built from
    pub segments: Vec<Segment>,
}

/// Builds the response for `path` found on `spliced`.
///
/// `from` and `to` are the raw query coordinates.
pub fn assemble(
    spliced: &SplicedGraph<'_>,
    path: &Path,
    schema: &SchemaInfo,
    from: Point<f64>,
    to: Point<f64>,
    start: &SnapCandidate,
    end: &SnapCandidate,
) -> RouteResponse {
    let start_node = spliced.starts().get(path.start).copied().flatten();
    let end_node = spliced.ends().get(path.end).copied().flatten();
    let segments: Vec<Segment> = path
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let half = &step.half_edge;
            let edge = spliced.edge(half);
            let kind = match (Some(step.source) == start_node, Some(step.target) == end_node) {
                (false, false) => SegmentKind::Full,
                (true, false) => SegmentKind::CroppedAtStart,
                (false, true) => SegmentKind::CroppedAtEnd,
                (true, true) => SegmentKind::CroppedAtBoth,
            };
            let costs = schema
                .types
                .iter()
                .map(|t| {
                    edge.directed_cost(t, half.from_fraction, half.to_fraction)
                        .unwrap_or(0.0)
                })
                .collect();
            Segment {
                seq: index + 1,
                edge_id: edge.id,
                kind,
                geometry: directed_substring(&edge.geometry, half.from_fraction, half.to_fraction),
                costs,
                properties: edge.property_tuple(&schema.properties),
            }
        })
        .collect();

    let mut features = Vec::new();
    let mut offset = 0;
    let groups = segments.iter().chunk_by(|segment| segment.properties.clone());
    for (properties, group) in &groups {
        let group: Vec<&Segment> = group.collect();
        let costs = (0..schema.types.len())
            .map(|t| group.iter().map(|segment| segment.costs[t]).sum())
            .collect();
        features.push(PathFeature {
            seq: features.len() + 1,
            geometry: merge_lines(group.iter().map(|segment| segment.geometry.clone())),
            costs,
            properties,
            segments: offset..offset + group.len(),
        });
        offset += group.len();
    }

    let cost = schema
        .types
        .iter()
        .enumerate()
        .map(|(t, name)| {
            let total = features.iter().map(|feature| feature.costs[t]).sum();
            (name.clone(), total)
        })
        .collect();

    debug!(
        "Assembled {} steps into {} features",
        segments.len(),
        features.len()
    );

    RouteResponse {
        types: schema.types.clone(),
        property_names: schema.properties.clone(),
        snapping_distance: SnappingDistance {
            start: start.distance,
            end: end.distance,
        },
        cost,
        start_connector: connector(from, start.point),
        features,
        end_connector: connector(end.point, to),
        segments,
    }
}

fn connector(a: Point<f64>, b: Point<f64>) -> Connector {
    Connector {
        line: LineString::from(vec![a.0, b.0]),
        distance: haversine(a, b),
    }
}

impl RouteResponse {
    pub fn total_cost(&self, cost_type: &str) -> Option<f64> {
        self.cost
            .iter()
            .find(|(name, _)| name == cost_type)
            .map(|(_, total)| *total)
    }

    /// Converts the route to a `GeoJSON` `FeatureCollection`.
    ///
    /// `snappingDistance` and `cost` are carried as foreign members.
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let mut features = Vec::with_capacity(self.features.len() + 2);
        features.push(connector_feature(&self.start_connector, 0)?);

        for feature in &self.features {
            let mut properties = Map::new();
            properties.insert("seq".to_string(), json!(feature.seq));
            for (name, cost) in self.types.iter().zip(&feature.costs) {
                properties.insert(name.clone(), json!(cost));
            }
            for (name, value) in self.property_names.iter().zip(&feature.properties) {
                properties.insert(name.clone(), value.clone());
            }
            let geometry = GeoJsonGeometry::new(GeoJsonValue::from(&feature.geometry));
            features.push(to_feature(json!({
                "type": "Feature",
                "geometry": geometry,
                "properties": properties,
            }))?);
        }

        features.push(connector_feature(&self.end_connector, self.features.len() + 1)?);

        let mut cost = Map::new();
        for (name, total) in &self.cost {
            cost.insert(name.clone(), json!(total));
        }
        let mut foreign_members = Map::new();
        foreign_members.insert(
            "snappingDistance".to_string(),
            json!(self.snapping_distance),
        );
        foreign_members.insert("cost".to_string(), JsonValue::Object(cost));

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: Some(foreign_members),
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::CanNotCompute(e.to_string()))
    }
}

fn connector_feature(connector: &Connector, seq: usize) -> Result<Feature, Error> {
    let geometry = GeoJsonGeometry::new(GeoJsonValue::from(&connector.line));
    to_feature(json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "seq": seq,
            "distance": connector.distance,
        }
    }))
}

fn to_feature(value: JsonValue) -> Result<Feature, Error> {
    Feature::from_json_value(value).map_err(|e| Error::CanNotCompute(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::Edge;
    use crate::routing::shortest_path;
    use crate::test_helpers::straight_edge;

    fn named(mut edge: Edge, name: &str) -> Edge {
        edge.properties.insert("name".to_string(), json!(name));
        edge
    }

    fn schema() -> SchemaInfo {
        SchemaInfo {
            types: vec!["duration".to_string()],
            filters: vec![],
            properties: vec!["name".to_string()],
        }
    }

    fn snapped(edge_id: EdgeId, fraction: f64, point: (f64, f64), distance: f64) -> SnapCandidate {
        SnapCandidate {
            edge_id,
            fraction,
            distance,
            point: Point::new(point.0, point.1),
        }
    }

    fn street() -> Vec<Arc<Edge>> {
        vec![
            Arc::new(named(straight_edge(1, 1, 2, (0.0, 0.0), (1.0, 0.0), 10.0), "Main St")),
            Arc::new(named(straight_edge(2, 2, 3, (1.0, 0.0), (2.0, 0.0), 10.0), "Main St")),
            // stored against travel direction
            Arc::new(named(straight_edge(3, 4, 3, (3.0, 0.0), (2.0, 0.0), 10.0), "Side St")),
        ]
    }

    fn route(start: SnapCandidate, end: SnapCandidate) -> RouteResponse {
        let edges = street();
        let spliced = SplicedGraph::build(
            &edges,
            std::slice::from_ref(&start),
            std::slice::from_ref(&end),
            "duration",
        );
        let path = shortest_path(&spliced).unwrap();
        assemble(
            &spliced,
            &path,
            &schema(),
            Point::new(start.point.x(), 0.001),
            Point::new(end.point.x(), 0.001),
            &start,
            &end,
        )
    }

    #[test]
    fn merges_identical_properties() {
        let response = route(
            snapped(1, 0.5, (0.5, 0.0), 111.0),
            snapped(3, 0.5, (2.5, 0.0), 111.0),
        );

        let kinds: Vec<SegmentKind> = response.segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::CroppedAtStart,
                SegmentKind::Full,
                SegmentKind::CroppedAtEnd
            ]
        );
        assert_eq!(response.features.len(), 2);
        assert_eq!(response.features[0].properties, vec![json!("Main St")]);
        assert_eq!(response.features[0].segments, 0..2);
        assert!((response.features[0].costs[0] - 15.0).abs() < 1e-9);
        assert_eq!(
            response.features[0].geometry,
            Geometry::LineString(LineString::from(vec![(0.5, 0.0), (1.0, 0.0), (2.0, 0.0)]))
        );
        assert_eq!(response.features[1].seq, 2);
    }

    #[test]
    fn negative_real_node_ids_stay_full() {
        let edges: Vec<Arc<Edge>> = [(1, -10, -20, 0.0), (2, -20, -30, 1.0), (3, -30, -40, 2.0)]
            .into_iter()
            .map(|(id, source, target, x)| {
                Arc::new(named(
                    straight_edge(id, source, target, (x, 0.0), (x + 1.0, 0.0), 10.0),
                    "Main St",
                ))
            })
            .collect();
        let start = snapped(1, 0.5, (0.5, 0.0), 0.0);
        let end = snapped(3, 0.5, (2.5, 0.0), 0.0);
        let spliced = SplicedGraph::build(
            &edges,
            std::slice::from_ref(&start),
            std::slice::from_ref(&end),
            "duration",
        );
        let path = shortest_path(&spliced).unwrap();
        let response = assemble(
            &spliced,
            &path,
            &schema(),
            Point::new(0.5, 0.001),
            Point::new(2.5, 0.001),
            &start,
            &end,
        );

        let kinds: Vec<SegmentKind> = response.segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::CroppedAtStart,
                SegmentKind::Full,
                SegmentKind::CroppedAtEnd
            ]
        );
        assert!((response.total_cost("duration").unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn reversed_traversal_reverses_geometry() {
        let response = route(
            snapped(1, 0.5, (0.5, 0.0), 0.0),
            snapped(3, 0.5, (2.5, 0.0), 0.0),
        );
        let last = response.segments.last().unwrap();
        assert_eq!(last.edge_id, 3);
        assert_eq!(
            last.geometry,
            LineString::from(vec![(2.0, 0.0), (2.5, 0.0)])
        );
    }

    #[test]
    fn single_edge_cropped_at_both() {
        let response = route(
            snapped(2, 0.8, (1.8, 0.0), 0.0),
            snapped(2, 0.2, (1.2, 0.0), 0.0),
        );
        assert_eq!(response.segments.len(), 1);
        assert_eq!(response.segments[0].kind, SegmentKind::CroppedAtBoth);
        assert_eq!(
            response.segments[0].geometry,
            LineString::from(vec![(1.8, 0.0), (1.2, 0.0)])
        );
        assert!((response.total_cost("duration").unwrap() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn total_equals_sum_of_features() {
        let response = route(
            snapped(1, 0.1, (0.1, 0.0), 0.0),
            snapped(3, 0.9, (2.1, 0.0), 0.0),
        );
        let summed: f64 = response.features.iter().map(|f| f.costs[0]).sum();
        assert!((response.total_cost("duration").unwrap() - summed).abs() < 1e-9);
    }

    #[test]
    fn geojson_has_connectors_and_foreign_members() {
        let response = route(
            snapped(1, 0.5, (0.5, 0.0), 111.0),
            snapped(3, 0.5, (2.5, 0.0), 111.0),
        );
        let collection = response.to_geojson().unwrap();
        assert_eq!(collection.features.len(), 4);

        let seqs: Vec<JsonValue> = collection
            .features
            .iter()
            .map(|f| f.property("seq").cloned().unwrap())
            .collect();
        assert_eq!(seqs, vec![json!(0), json!(1), json!(2), json!(3)]);

        let first = &collection.features[0];
        let distance = first.property("distance").and_then(JsonValue::as_f64).unwrap();
        assert!((distance - response.start_connector.distance).abs() < 1e-9);
        assert!(collection.features[1].property("distance").is_none());
        assert_eq!(collection.features[1].property("name"), Some(&json!("Main St")));

        let members = collection.foreign_members.unwrap();
        assert_eq!(members["snappingDistance"]["start"], json!(111.0));
        assert!(members["cost"]["duration"].is_number());
    }
}
