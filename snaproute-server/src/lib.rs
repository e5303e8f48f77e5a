//! HTTP transport for the snaproute engine.
//!
//! # Endpoints
//!
//! - `GET|POST /route` - least-cost route between `from` and `to`
//! - `GET|POST /isocurve` - reachable areas around `from` (or towards `to`)
//! - `GET /capabilities` - cost types, filters and properties of the network
//! - `GET /version` - version of the network backend
//! - `GET /health` - liveness

pub mod config;
mod error;
mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    error_handling::HandleErrorLayer,
    routing::get,
};
use chrono::{DateTime, Utc};
use snaproute_core::RoutingEngine;
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Args, ServerConfig};
pub use error::ApiError;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RoutingEngine>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: RoutingEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            started_at: Utc::now(),
        }
    }
}

/// Routes without transport limits
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/route",
            get(handlers::route_query).post(handlers::route_body),
        )
        .route(
            "/isocurve",
            get(handlers::isocurve_query).post(handlers::isocurve_body),
        )
        .route("/capabilities", get(handlers::capabilities))
        .route("/version", get(handlers::version))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Routes wrapped with tracing, CORS, a request timeout and a concurrency cap
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(HandleErrorLayer::new(error::handle_middleware_error))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )))
            .layer(GlobalConcurrencyLimitLayer::new(
                config.max_concurrent_requests,
            )),
    )
}
