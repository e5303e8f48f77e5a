//! Server settings: TOML file, then command line and environment overrides

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use snaproute_core::config::MIN_SAMPLE_SPACING;
use snaproute_core::{EngineConfig, TableRef};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "snaproute-server", version, about = "Least-cost routing over a road network")]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// GeoJSON network to serve
    #[arg(short, long)]
    pub network: Option<PathBuf>,

    #[arg(short, long)]
    pub listen: Option<SocketAddr>,

    /// Edge table as `[schema.]table`
    #[arg(long, env = "PGTABLE")]
    pub table: Option<String>,

    /// Snapping threshold in meters
    #[arg(long)]
    pub max_snapping_distance: Option<f64>,

    #[arg(long)]
    pub snapping_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub network: Option<PathBuf>,
    pub max_concurrent_requests: usize,
    pub request_timeout_secs: u64,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            network: None,
            max_concurrent_requests: 64,
            request_timeout_secs: 30,
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// File settings (or defaults) with `args` applied on top
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(args);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, args: &Args) {
        if let Some(network) = &args.network {
            self.network = Some(network.clone());
        }
        if let Some(listen) = args.listen {
            self.listen = listen;
        }
        if let Some(table) = &args.table {
            self.engine.table = TableRef::parse(table);
        }
        if let Some(distance) = args.max_snapping_distance {
            self.engine.max_snapping_distance = distance;
        }
        if let Some(ratio) = args.snapping_ratio {
            self.engine.snapping_ratio = ratio;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_requests must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        let distance = self.engine.max_snapping_distance;
        if distance.is_nan() || distance <= 0.0 {
            return Err(ConfigError::Invalid(
                "engine.max_snapping_distance must be greater than 0".into(),
            ));
        }
        let ratio = self.engine.snapping_ratio;
        if ratio.is_nan() || ratio < 0.0 {
            return Err(ConfigError::Invalid(
                "engine.snapping_ratio can not be negative".into(),
            ));
        }
        let spacing = self.engine.isocurve.sample_spacing;
        if spacing.is_nan() || spacing < MIN_SAMPLE_SPACING {
            return Err(ConfigError::Invalid(format!(
                "engine.isocurve.sample_spacing must be at least {MIN_SAMPLE_SPACING}"
            )));
        }
        if self.engine.isocurve.resolution > 15 {
            return Err(ConfigError::Invalid(
                "engine.isocurve.resolution must be between 0 and 15".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.engine.table.to_string(), "public.edge");
    }

    #[test]
    fn nested_engine_section() {
        let config = ServerConfig::from_toml(
            r#"
            listen = "0.0.0.0:8080"
            network = "data/roads.geojson"

            [engine]
            table = "roads.edge"
            max_snapping_distance = 250.0
            snapping_ratio = 0.5

            [engine.isocurve]
            resolution = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.engine.table, TableRef::new("roads", "edge"));
        assert_eq!(config.engine.snapping_ratio, 0.5);
        assert_eq!(config.engine.isocurve.resolution, 9);
        assert_eq!(config.engine.isocurve.sample_spacing, 25.0);
    }

    #[test]
    fn arguments_override_file() {
        let args = Args {
            table: Some("edges".to_string()),
            max_snapping_distance: Some(40.0),
            ..Args::default()
        };
        let config = ServerConfig::load(&args).unwrap();
        assert_eq!(config.engine.table, TableRef::new("public", "edges"));
        assert_eq!(config.engine.max_snapping_distance, 40.0);
    }

    #[test]
    fn rejects_zero_limits() {
        let err = ServerConfig::from_toml("max_concurrent_requests = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_degenerate_isocurve_sampling() {
        for spacing in ["0.0", "-5.0", "1e-9", "nan"] {
            let err = ServerConfig::from_toml(&format!(
                "[engine.isocurve]\nsample_spacing = {spacing}"
            ))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{spacing}");
        }

        let err = ServerConfig::from_toml("[engine.isocurve]\nresolution = 16").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = ServerConfig::from_toml("[engine.isocurve]\nsample_spacing = 1.0").unwrap();
        assert_eq!(config.engine.isocurve.sample_spacing, MIN_SAMPLE_SPACING);
    }
}
