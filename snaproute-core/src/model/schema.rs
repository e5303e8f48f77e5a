//! Capability set derived from the provider's attribute catalog

use serde::{Deserialize, Serialize};

const COST_PREFIX: &str = "cost_";
const REVERSE_COST_PREFIX: &str = "reverse_cost_";
const FILTER_PREFIX: &str = "filter_";

/// Columns describing the graph itself rather than an edge attribute
pub const STRUCTURAL_COLUMNS: [&str; 5] = ["id", "source", "target", "the_geom", "seq"];

/// Cost types, filters and passthrough properties available on the network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub types: Vec<String>,
    pub filters: Vec<String>,
    pub properties: Vec<String>,
}

impl SchemaInfo {
    /// Partitions an attribute catalog, keeping catalog order.
    ///
    /// A `cost_<type>` column only declares a type when its
    /// `reverse_cost_<type>` pair is present as well.
    pub fn from_catalog<S: AsRef<str>>(catalog: &[S]) -> Self {
        let names: Vec<&str> = catalog.iter().map(AsRef::as_ref).collect();
        let mut info = SchemaInfo::default();

        for &name in &names {
            if STRUCTURAL_COLUMNS.contains(&name) || name.starts_with(REVERSE_COST_PREFIX) {
                continue;
            }
            if let Some(cost_type) = name.strip_prefix(COST_PREFIX) {
                let reverse = format!("{REVERSE_COST_PREFIX}{cost_type}");
                if names.contains(&reverse.as_str()) {
                    info.types.push(cost_type.to_string());
                } else {
                    log::warn!("Ignoring cost column {name}: missing {reverse}");
                }
            } else if let Some(filter) = name.strip_prefix(FILTER_PREFIX) {
                info.filters.push(filter.to_string());
            } else {
                info.properties.push(name.to_string());
            }
        }

        info
    }

    pub fn has_type(&self, cost_type: &str) -> bool {
        self.types.iter().any(|t| t == cost_type)
    }

    pub fn has_filter(&self, filter: &str) -> bool {
        self.filters.iter().any(|f| f == filter)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.filters.is_empty() && self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<&'static str> {
        vec![
            "id",
            "source",
            "target",
            "cost_distance",
            "reverse_cost_distance",
            "cost_duration",
            "reverse_cost_duration",
            "cost_consumption",
            "reverse_cost_consumption",
            "filter_toll",
            "filter_highway",
            "name",
            "cost",
            "the_geom",
        ]
    }

    #[test]
    fn partitions_catalog_in_declared_order() {
        let info = SchemaInfo::from_catalog(&catalog());
        assert_eq!(info.types, ["distance", "duration", "consumption"]);
        assert_eq!(info.filters, ["toll", "highway"]);
        assert_eq!(info.properties, ["name", "cost"]);
    }

    #[test]
    fn cost_without_reverse_pair_is_not_a_type() {
        let info = SchemaInfo::from_catalog(&["id", "cost_length", "cost_time", "reverse_cost_time"]);
        assert_eq!(info.types, ["time"]);
        assert!(info.properties.is_empty());
    }

    #[test]
    fn sets_are_disjoint() {
        let info = SchemaInfo::from_catalog(&catalog());
        for t in &info.types {
            assert!(!info.filters.contains(t));
            assert!(!info.properties.contains(t));
        }
        for f in &info.filters {
            assert!(!info.properties.contains(f));
        }
    }

    #[test]
    fn empty_catalog_yields_empty_schema() {
        let info = SchemaInfo::from_catalog::<&str>(&[]);
        assert!(info.is_empty());
    }
}
