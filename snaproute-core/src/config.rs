//! Engine configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_TABLE: &str = "edge";

/// Table holding the network edges, optionally schema-qualified
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Parses `table` or `schema.table`; an unqualified name lives in `public`.
    pub fn parse(value: &str) -> Self {
        match value.split_once('.') {
            Some((schema, table)) if !schema.is_empty() && !table.contains('.') => {
                Self::new(schema, table)
            }
            _ => Self::new(DEFAULT_SCHEMA, value),
        }
    }
}

impl Default for TableRef {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA, DEFAULT_TABLE)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

impl FromStr for TableRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for TableRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TableRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Smallest spacing in meters accepted between isocurve samples
pub const MIN_SAMPLE_SPACING: f64 = 1.0;

/// Isocurve boundary extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsocurveConfig {
    /// H3 resolution of the reachability grid
    pub resolution: u8,
    /// Spacing in meters between samples taken along reached geometry,
    /// at least [`MIN_SAMPLE_SPACING`]
    pub sample_spacing: f64,
}

impl Default for IsocurveConfig {
    fn default() -> Self {
        Self {
            resolution: 10,
            sample_spacing: 25.0,
        }
    }
}

/// Configuration of a [`crate::RoutingEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub table: TableRef,
    /// Great-circle snapping threshold in meters
    pub max_snapping_distance: f64,
    /// 0 keeps only the nearest edge, larger values widen the candidate set
    pub snapping_ratio: f64,
    pub isocurve: IsocurveConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table: TableRef::default(),
            max_snapping_distance: 100.0,
            snapping_ratio: 0.0,
            isocurve: IsocurveConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = TableRef::parse(table);
        self
    }

    pub fn with_max_snapping_distance(mut self, meters: f64) -> Self {
        self.max_snapping_distance = meters;
        self
    }

    pub fn with_snapping_ratio(mut self, ratio: f64) -> Self {
        self.snapping_ratio = ratio;
        self
    }
}
