//! Geometry helpers on lon/lat polylines.
//!
//! Fractions along a polyline are measured on planar length, matching
//! `LineLocatePoint`. Distances in meters and closest points are
//! great-circle.

use geo::{
    Closest, Coord, Distance, Geometry, Haversine, HaversineClosestPoint, LineLocatePoint,
    LineString, MultiLineString, Point,
};

use crate::config::MIN_SAMPLE_SPACING;

/// Mean earth radius in meters
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Great-circle distance in meters
pub fn haversine(a: Point<f64>, b: Point<f64>) -> f64 {
    Haversine.distance(a, b)
}

/// Degrees of latitude spanned by `meters` along a meridian
pub fn meters_to_degrees(meters: f64) -> f64 {
    (meters / EARTH_RADIUS).to_degrees()
}

/// Great-circle closest location on `line` and its fraction along the line
pub fn locate_point(line: &LineString<f64>, point: &Point<f64>) -> Option<(f64, Point<f64>)> {
    let located = match line.haversine_closest_point(point) {
        Closest::Intersection(located) | Closest::SinglePoint(located) => located,
        Closest::Indeterminate => return None,
    };
    let fraction = line.line_locate_point(&located)?;
    Some((fraction, located))
}

/// Part of `line` between two fractions, oriented from `from` to `to`.
///
/// `from > to` yields the reversed sub-line.
pub fn directed_substring(line: &LineString<f64>, from: f64, to: f64) -> LineString<f64> {
    if from <= to {
        substring(line, from, to)
    } else {
        let mut reversed = substring(line, to, from);
        reversed.0.reverse();
        reversed
    }
}

/// Part of `line` between `start` and `end` fractions, `start <= end`
pub fn substring(line: &LineString<f64>, start: f64, end: f64) -> LineString<f64> {
    let coords = &line.0;
    if coords.len() < 2 {
        return line.clone();
    }

    let lengths: Vec<f64> = line
        .lines()
        .map(|segment| {
            let delta = segment.delta();
            delta.x.hypot(delta.y)
        })
        .collect();
    let total: f64 = lengths.iter().sum();
    if total == 0.0 {
        return LineString::new(vec![coords[0], coords[0]]);
    }

    let start_len = start.clamp(0.0, 1.0) * total;
    let end_len = end.clamp(0.0, 1.0) * total;

    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    let mut walked = 0.0;
    for (i, seg_len) in lengths.iter().enumerate() {
        let (a, b) = (coords[i], coords[i + 1]);
        let seg_end = walked + seg_len;

        if out.is_empty() && start_len <= seg_end {
            push_distinct(&mut out, interpolate(a, b, walked, *seg_len, start_len));
        }
        if !out.is_empty() {
            if end_len <= seg_end {
                push_distinct(&mut out, interpolate(a, b, walked, *seg_len, end_len));
                break;
            }
            push_distinct(&mut out, b);
        }
        walked = seg_end;
    }

    match out.len() {
        0 => {
            let last = coords[coords.len() - 1];
            LineString::new(vec![last, last])
        }
        1 => {
            let only = out[0];
            LineString::new(vec![only, only])
        }
        _ => LineString::new(out),
    }
}

fn interpolate(a: Coord<f64>, b: Coord<f64>, offset: f64, seg_len: f64, at: f64) -> Coord<f64> {
    if seg_len == 0.0 {
        return a;
    }
    let t = ((at - offset) / seg_len).clamp(0.0, 1.0);
    Coord {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

fn push_distinct(coords: &mut Vec<Coord<f64>>, coord: Coord<f64>) {
    if coords.last() != Some(&coord) {
        coords.push(coord);
    }
}

/// Joins consecutive lines sharing an endpoint.
///
/// Returns a `LineString` when everything chains, a `MultiLineString` otherwise.
pub fn merge_lines(lines: impl IntoIterator<Item = LineString<f64>>) -> Geometry<f64> {
    let mut merged: Vec<LineString<f64>> = Vec::new();
    for line in lines {
        if let Some(last) = merged.last_mut()
            && last.0.last() == line.0.first()
        {
            last.0.extend(line.0.into_iter().skip(1));
            continue;
        }
        merged.push(line);
    }

    if merged.len() == 1 {
        Geometry::LineString(merged.remove(0))
    } else {
        Geometry::MultiLineString(MultiLineString::new(merged))
    }
}

/// Vertices of `line` plus intermediate points no more than `spacing` meters apart.
///
/// Spacing below [`MIN_SAMPLE_SPACING`] is raised to it.
pub fn sample_along(line: &LineString<f64>, spacing: f64) -> Vec<Point<f64>> {
    let mut points: Vec<Point<f64>> = Vec::new();
    if let Some(first) = line.0.first() {
        points.push(Point::from(*first));
    }
    for segment in line.lines() {
        let (a, b) = (segment.start, segment.end);
        let length = haversine(Point::from(a), Point::from(b));
        let steps = (length / spacing.max(MIN_SAMPLE_SPACING)).ceil().max(1.0) as usize;
        for step in 1..=steps {
            let t = step as f64 / steps as f64;
            points.push(Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t));
        }
    }
    points
}
