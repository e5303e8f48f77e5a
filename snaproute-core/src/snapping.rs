//! Mapping free coordinates onto the network

use std::sync::Arc;

use geo::{Coord, Intersects, Line, Point};
use hashbrown::HashMap;
use log::debug;

use crate::config::TableRef;
use crate::model::{Edge, EdgeMatch, SnapCandidate};
use crate::provider::NetworkProvider;
use crate::{EdgeId, Error};

/// Part of the query → snap point connector checked for crossings,
/// so that touching the candidate edge itself does not count
const CONNECTOR_TRIM: f64 = 1e-4;

/// Ratio reported when the best match lies exactly on the network
const ON_NETWORK_RATIO: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapOptions {
    /// Threshold in meters
    pub max_distance: f64,
    /// 0 keeps the single nearest edge
    pub ratio: f64,
}

/// Snaps `point` onto one or more edges not excluded by `avoid`.
///
/// Fails with [`Error::Snapping`] when no edge lies within the threshold.
pub fn snap(
    provider: &dyn NetworkProvider,
    table: &TableRef,
    point: Point<f64>,
    options: SnapOptions,
    avoid: &[String],
) -> Result<Vec<SnapCandidate>, Error> {
    let matches = provider.nearest_edges(table, point, options.max_distance, avoid)?;
    let Some(nearest) = matches.first() else {
        return Err(Error::Snapping {
            lat: point.y(),
            lon: point.x(),
            max_distance: options.max_distance,
        });
    };

    if options.ratio <= 0.0 {
        return Ok(vec![nearest.clone().into()]);
    }

    let geometries: HashMap<EdgeId, Arc<Edge>> = matches
        .iter()
        .map(|m| provider.edge_by_id(table, m.edge_id))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .map(|edge| (edge.id, edge))
        .collect();

    let d_min = nearest.distance;
    let mut candidates: Vec<SnapCandidate> = matches
        .iter()
        .filter(|m| distance_ratio(m.distance, d_min) < options.ratio)
        .filter(|m| !crosses_other_edge(point, m, &geometries))
        .cloned()
        .map(SnapCandidate::from)
        .collect();

    if candidates.is_empty() {
        candidates.push(nearest.clone().into());
    }

    debug!(
        "Snapped ({}, {}) to {} of {} edges",
        point.y(),
        point.x(),
        candidates.len(),
        matches.len()
    );
    Ok(candidates)
}

/// Relative excess distance of a match over the nearest one
pub fn distance_ratio(distance: f64, d_min: f64) -> f64 {
    if d_min == 0.0 {
        if distance == 0.0 { 0.0 } else { ON_NETWORK_RATIO }
    } else {
        (distance - d_min) / d_min
    }
}

/// True when the straight connector from the query to the match crosses
/// any other nearby edge
fn crosses_other_edge(
    point: Point<f64>,
    m: &EdgeMatch,
    geometries: &HashMap<EdgeId, Arc<Edge>>,
) -> bool {
    let connector = trimmed_connector(point.0, m.point.0);
    geometries
        .values()
        .filter(|edge| edge.id != m.edge_id)
        .any(|edge| connector.intersects(&edge.geometry))
}

fn trimmed_connector(from: Coord<f64>, to: Coord<f64>) -> Line<f64> {
    let at = |t: f64| Coord {
        x: from.x + (to.x - from.x) * t,
        y: from.y + (to.y - from.y) * t,
    };
    Line::new(at(CONNECTOR_TRIM), at(1.0 - CONNECTOR_TRIM))
}
