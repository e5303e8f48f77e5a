use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use geo::LineString;
use hashbrown::HashMap;
use snaproute_core::prelude::*;
use snaproute_core::Edge;

/// Square grid of `size` × `size` nodes, 0.001° apart, two-way streets
fn grid(size: i64) -> MemoryNetwork {
    let step = 0.001;
    let node = |x: i64, y: i64| y * size + x;
    let mut edges = Vec::new();
    let mut push = |source: i64, target: i64, from: (f64, f64), to: (f64, f64)| {
        let mut costs = HashMap::new();
        costs.insert("duration".to_string(), 8.0);
        costs.insert("distance".to_string(), 111.0);
        edges.push(Edge {
            id: edges.len() as i64 + 1,
            source,
            target,
            geometry: LineString::from(vec![from, to]),
            reverse_costs: costs.clone(),
            costs,
            filters: HashMap::new(),
            properties: HashMap::new(),
        });
    };

    for y in 0..size {
        for x in 0..size {
            let here = (x as f64 * step, y as f64 * step);
            if x + 1 < size {
                push(node(x, y), node(x + 1, y), here, ((x + 1) as f64 * step, here.1));
            }
            if y + 1 < size {
                push(node(x, y), node(x, y + 1), here, (here.0, (y + 1) as f64 * step));
            }
        }
    }

    let catalog = [
        "id",
        "source",
        "target",
        "cost_duration",
        "reverse_cost_duration",
        "cost_distance",
        "reverse_cost_distance",
        "the_geom",
    ]
    .map(String::from)
    .to_vec();
    MemoryNetwork::new(TableRef::default(), catalog, edges).expect("grid is valid")
}

fn benchmark_routing(c: &mut Criterion) {
    let engine = RoutingEngine::new(EngineConfig::default(), Arc::new(grid(60)));
    let across = RouteParams {
        from: Some("0.0002,0.0005".to_string()),
        to: Some("0.0585,0.0591".to_string()),
        cost_type: Some("duration".to_string()),
        avoid: None,
    };

    c.bench_function("route_grid_60", |b| {
        b.iter(|| {
            let response = engine.routing(black_box(&across)).expect("route exists");
            black_box(response.features.len())
        });
    });

    let widened = RoutingEngine::new(
        EngineConfig::default().with_snapping_ratio(2.0),
        Arc::new(grid(60)),
    );
    c.bench_function("route_grid_60_ratio", |b| {
        b.iter(|| {
            let response = widened.routing(black_box(&across)).expect("route exists");
            black_box(response.total_cost("duration"))
        });
    });

    let isocurve = IsocurveParams {
        from: Some("0.0302,0.0305".to_string()),
        cost_type: Some("duration".to_string()),
        values: Some(ValuesParam::Text("60,120".to_string())),
        ..Default::default()
    };
    c.bench_function("isocurve_grid_60", |b| {
        b.iter(|| {
            let response = engine.isocurve(black_box(&isocurve)).expect("isocurve computes");
            black_box(response.isocurves.len())
        });
    });
}

criterion_group!(benches, benchmark_routing);
criterion_main!(benches);
