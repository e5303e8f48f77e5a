//! Reachable areas under a cost budget.
//!
//! The reached part of the network is sampled along its geometry, the samples
//! are binned into H3 cells and the cell set is dissolved into the boundary.

use geo::{LineString, MultiPolygon, Point};
use geojson::{Feature, FeatureCollection, Geometry as GeoJsonGeometry, Value as GeoJsonValue};
use h3o::{CellIndex, LatLng, Resolution, geom::SolventBuilder};
use hashbrown::HashSet;
use log::debug;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use serde_json::json;

use crate::config::IsocurveConfig;
use crate::geometry::{directed_substring, sample_along};
use crate::model::SnapCandidate;
use crate::params::Direction;
use crate::routing::SplicedGraph;
use crate::routing::dijkstra::dijkstra;
use crate::Error;

/// Boundary of the area reachable within `value`
#[derive(Debug, Clone, PartialEq)]
pub struct Isocurve {
    pub value: f64,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsocurveResponse {
    pub isocurves: Vec<Isocurve>,
}

impl IsocurveResponse {
    /// One `MultiPolygon` feature per requested value
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let features = self
            .isocurves
            .iter()
            .map(|isocurve| {
                let geometry = GeoJsonGeometry::new(GeoJsonValue::from(&isocurve.geometry));
                Feature::from_json_value(json!({
                    "type": "Feature",
                    "geometry": geometry,
                    "properties": { "value": isocurve.value },
                }))
                .map_err(|e| Error::CanNotCompute(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::CanNotCompute(e.to_string()))
    }
}

/// Pieces of edge geometry reachable from the spliced start nodes within `budget`.
///
/// `Backward` gives the pieces from which the start nodes can be reached.
pub fn reachable_geometry(
    spliced: &SplicedGraph<'_>,
    direction: Direction,
    budget: f64,
) -> Vec<LineString<f64>> {
    let sources: Vec<_> = spliced
        .starts()
        .iter()
        .enumerate()
        .filter_map(|(label, node)| node.map(|node| (label, node)))
        .collect();
    let search_direction = match direction {
        Direction::Forward => petgraph::Direction::Outgoing,
        Direction::Backward => petgraph::Direction::Incoming,
    };
    let tree = dijkstra(&spliced.graph, &sources, search_direction, Some(budget), &[]);

    let mut lines = Vec::new();
    for arc in spliced.graph.edge_references() {
        let half = arc.weight();
        let near = match direction {
            Direction::Forward => arc.source(),
            Direction::Backward => arc.target(),
        };
        let Some(spent) = tree.cost(near) else {
            continue;
        };
        let share = if half.weight > 0.0 {
            ((budget - spent) / half.weight).min(1.0)
        } else {
            1.0
        };
        if share <= 0.0 {
            continue;
        }

        let span = half.to_fraction - half.from_fraction;
        let (from, to) = match direction {
            Direction::Forward => (half.from_fraction, half.from_fraction + share * span),
            Direction::Backward => (half.to_fraction - share * span, half.to_fraction),
        };
        lines.push(directed_substring(&spliced.edge(half).geometry, from, to));
    }
    lines
}

/// Area reachable within `value`, as dissolved H3 cells
pub fn calculate_isocurve(
    spliced: &SplicedGraph<'_>,
    origins: &[SnapCandidate],
    direction: Direction,
    value: f64,
    config: &IsocurveConfig,
) -> Result<MultiPolygon<f64>, Error> {
    let resolution = Resolution::try_from(config.resolution)
        .map_err(|e| Error::CanNotCompute(format!("Got invalid H3 resolution {e}")))?;

    let lines = reachable_geometry(spliced, direction, value);
    let samples = origins.iter().map(|origin| origin.point).chain(
        lines
            .iter()
            .flat_map(|line| sample_along(line, config.sample_spacing)),
    );

    let mut cells: HashSet<CellIndex> = HashSet::new();
    for point in samples {
        cells.insert(to_cell(point, resolution)?);
    }
    debug!(
        "Isocurve {value}: {} reached pieces, {} cells",
        lines.len(),
        cells.len()
    );

    let solvent = SolventBuilder::new().build();
    solvent
        .dissolve(cells)
        .map_err(|e| Error::CanNotCompute(e.to_string()))
}

/// Computes every value independently on the rayon pool, keeping input order
pub fn bulk_isocurves(
    spliced: &SplicedGraph<'_>,
    origins: &[SnapCandidate],
    direction: Direction,
    values: &[f64],
    config: &IsocurveConfig,
) -> Result<Vec<Isocurve>, Error> {
    values
        .par_iter()
        .map(|&value| {
            calculate_isocurve(spliced, origins, direction, value, config)
                .map(|geometry| Isocurve { value, geometry })
        })
        .collect()
}

fn to_cell(point: Point<f64>, resolution: Resolution) -> Result<CellIndex, Error> {
    LatLng::new(point.y(), point.x())
        .map(|ll| ll.to_cell(resolution))
        .map_err(|e| Error::CanNotCompute(format!("Invalid coordinate for H3: {e}")))
}
