//! Request orchestration: validate, resolve schema, snap, splice, search, assemble

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use geo::Point;
use log::{debug, warn};

use crate::algo::{IsocurveResponse, bulk_isocurves};
use crate::config::EngineConfig;
use crate::model::{SchemaInfo, SnapCandidate};
use crate::params::{IsocurveParams, RouteParams};
use crate::provider::NetworkProvider;
use crate::routing::{RouteResponse, SplicedGraph, assemble, shortest_path};
use crate::snapping::{SnapOptions, snap};
use crate::Error;

/// Routing engine bound to one network table.
///
/// Cheap to share across threads; the schema is resolved on first use and
/// kept once a resolution succeeds.
pub struct RoutingEngine {
    config: EngineConfig,
    provider: Arc<dyn NetworkProvider>,
    schema: OnceLock<SchemaInfo>,
}

impl std::fmt::Debug for RoutingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEngine")
            .field("config", &self.config)
            .field("schema", &self.schema.get())
            .finish_non_exhaustive()
    }
}

impl RoutingEngine {
    pub fn new(config: EngineConfig, provider: Arc<dyn NetworkProvider>) -> Self {
        Self {
            config,
            provider,
            schema: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cost types, filters and properties of the network.
    ///
    /// A failed resolution logs a warning and yields an empty schema; it is
    /// not cached, so the next call asks the provider again.
    pub fn schema(&self) -> Cow<'_, SchemaInfo> {
        if let Some(schema) = self.schema.get() {
            return Cow::Borrowed(schema);
        }
        match self.provider.attribute_catalog(&self.config.table) {
            Ok(catalog) => {
                let resolved = SchemaInfo::from_catalog(&catalog);
                debug!(
                    "Resolved schema of {}: {} types, {} filters, {} properties",
                    self.config.table,
                    resolved.types.len(),
                    resolved.filters.len(),
                    resolved.properties.len()
                );
                Cow::Borrowed(self.schema.get_or_init(|| resolved))
            }
            Err(err) => {
                warn!("Can not resolve schema of {}: {err}", self.config.table);
                Cow::Owned(SchemaInfo::default())
            }
        }
    }

    pub fn types(&self) -> Vec<String> {
        self.schema().types.clone()
    }

    pub fn filters(&self) -> Vec<String> {
        self.schema().filters.clone()
    }

    pub fn properties(&self) -> Vec<String> {
        self.schema().properties.clone()
    }

    pub fn capabilities(&self) -> SchemaInfo {
        self.schema().into_owned()
    }

    pub fn version(&self) -> Result<String, Error> {
        Ok(self.provider.version()?)
    }

    /// Least-cost route between `params.from` and `params.to`
    pub fn routing(&self, params: &RouteParams) -> Result<RouteResponse, Error> {
        let schema = self.schema();
        let query = params.validate(&schema)?;

        let (start, end) = rayon::join(
            || self.snap(query.from, &query.avoid),
            || self.snap(query.to, &query.avoid),
        );
        let (start, end) = (start?, end?);

        let edges = self.provider.edges(&self.config.table, &query.avoid)?;
        let spliced = SplicedGraph::build(&edges, &start, &end, &query.cost_type);
        let path = shortest_path(&spliced).ok_or_else(Error::no_path)?;
        debug!(
            "Route by {}: {} steps, cost {}",
            query.cost_type,
            path.steps.len(),
            path.cost
        );

        Ok(assemble(
            &spliced,
            &path,
            &schema,
            query.from,
            query.to,
            &start[path.start],
            &end[path.end],
        ))
    }

    /// One reachability boundary per requested value
    pub fn isocurve(&self, params: &IsocurveParams) -> Result<IsocurveResponse, Error> {
        let schema = self.schema();
        let query = params.validate(&schema)?;

        let origins = self.snap(query.origin, &query.avoid)?;
        let edges = self.provider.edges(&self.config.table, &query.avoid)?;
        let spliced = SplicedGraph::build(&edges, &origins, &[], &query.cost_type);

        let isocurves = bulk_isocurves(
            &spliced,
            &origins,
            query.direction,
            &query.values,
            &self.config.isocurve,
        )?;
        Ok(IsocurveResponse { isocurves })
    }

    fn snap(&self, point: Point<f64>, avoid: &[String]) -> Result<Vec<SnapCandidate>, Error> {
        snap(
            self.provider.as_ref(),
            &self.config.table,
            point,
            SnapOptions {
                max_distance: self.config.max_snapping_distance,
                ratio: self.config.snapping_ratio,
            },
            avoid,
        )
    }
}
