use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value as JsonValue, json, map::Entry};
use snaproute_core::params::{IsocurveParams, RouteParams};
use snaproute_core::{RoutingEngine, SchemaInfo};
use tracing::debug;

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    started_at: chrono::DateTime<chrono::Utc>,
}

/// Runs CPU-bound engine work off the async workers
async fn blocking<T, F>(engine: &Arc<RoutingEngine>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&RoutingEngine) -> Result<T, snaproute_core::Error> + Send + 'static,
{
    let engine = Arc::clone(engine);
    Ok(tokio::task::spawn_blocking(move || work(&engine)).await??)
}

type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// Decodes query string pairs the same way as a JSON body.
///
/// Repeated keys and `key[]` keys collect into arrays, so `avoid=a&avoid=b`
/// and `avoid[]=a` reach the list form.
fn query_params<T: DeserializeOwned>(query: QueryPairs) -> Result<T, ApiError> {
    let Query(pairs) = query?;
    let mut object = serde_json::Map::new();
    for (key, value) in pairs {
        let (key, listed) = match key.strip_suffix("[]") {
            Some(stripped) => (stripped.to_string(), true),
            None => (key, false),
        };
        let value = JsonValue::String(value);
        match object.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(if listed {
                    JsonValue::Array(vec![value])
                } else {
                    value
                });
            }
            Entry::Occupied(mut entry) => match entry.get_mut() {
                JsonValue::Array(items) => items.push(value),
                single => {
                    let first = single.take();
                    *single = JsonValue::Array(vec![first, value]);
                }
            },
        }
    }
    Ok(serde_json::from_value(JsonValue::Object(object))?)
}

pub(crate) async fn route_query(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Response, ApiError> {
    let params: RouteParams = query_params(query)?;
    route(state, params).await
}

pub(crate) async fn route_body(
    State(state): State<AppState>,
    body: Result<Json<RouteParams>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(params) = body?;
    route(state, params).await
}

async fn route(state: AppState, params: RouteParams) -> Result<Response, ApiError> {
    debug!(from = ?params.from, to = ?params.to, cost_type = ?params.cost_type, "route request");
    let collection = blocking(&state.engine, move |engine| {
        engine.routing(&params)?.to_geojson()
    })
    .await?;
    Ok(Json(collection).into_response())
}

pub(crate) async fn isocurve_query(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Response, ApiError> {
    let params: IsocurveParams = query_params(query)?;
    isocurve(state, params).await
}

pub(crate) async fn isocurve_body(
    State(state): State<AppState>,
    body: Result<Json<IsocurveParams>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(params) = body?;
    isocurve(state, params).await
}

async fn isocurve(state: AppState, params: IsocurveParams) -> Result<Response, ApiError> {
    debug!(from = ?params.from, to = ?params.to, "isocurve request");
    let collection = blocking(&state.engine, move |engine| {
        engine.isocurve(&params)?.to_geojson()
    })
    .await?;
    Ok(Json(collection).into_response())
}

pub(crate) async fn capabilities(State(state): State<AppState>) -> Result<Json<SchemaInfo>, ApiError> {
    let schema = blocking(&state.engine, |engine| Ok(engine.capabilities())).await?;
    Ok(Json(schema))
}

pub(crate) async fn version(State(state): State<AppState>) -> Result<Response, ApiError> {
    let version = blocking(&state.engine, |engine| engine.version()).await?;
    Ok(Json(json!({ "version": version })).into_response())
}

pub(crate) async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at,
    })
}
