#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use snaproute_core::prelude::*;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/network.geojson")
}

pub fn fixture_network() -> MemoryNetwork {
    MemoryNetwork::from_geojson_path(TableRef::default(), fixture_path()).expect("fixture loads")
}

pub fn engine(config: EngineConfig) -> RoutingEngine {
    RoutingEngine::new(config, Arc::new(fixture_network()))
}

pub fn route(from: &str, to: &str, cost_type: &str) -> RouteParams {
    RouteParams {
        from: Some(from.to_string()),
        to: Some(to.to_string()),
        cost_type: Some(cost_type.to_string()),
        avoid: None,
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}
