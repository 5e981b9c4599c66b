//! Configuration shapes for virtual schemas, sources, and nodes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Defines the data sources that make up one virtual schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Virtual schema name, must be unique
    pub name: String,
    /// Names of the sources contributing tables
    #[serde(default)]
    pub sources: Vec<String>,
    /// Names of backend server nodes
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// Configuration for a single source: one backend type, possibly
/// several nodes, participating in one or more virtual schemas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Backend type name in the datasource registry (csv, memory, ...)
    #[serde(rename = "type")]
    pub source_type: String,
    /// Allowlist: when non-empty, only these tables load (lowercase,
    /// case-insensitive match)
    #[serde(default)]
    pub tables_to_load: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    /// Arbitrary settings specific to each source type
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            ..Default::default()
        }
    }

    /// Does the allowlist admit this table? Matches on lowercase.
    pub fn loads_table(&self, table: &str) -> bool {
        if self.tables_to_load.is_empty() {
            return true;
        }
        let lower = table.to_lowercase();
        self.tables_to_load
            .iter()
            .any(|t| t.to_lowercase() == lower)
    }
}

impl fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<sourceconfig name={:?} type={:?} />",
            self.name, self.source_type
        )
    }
}

/// A server node belonging to a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub name: String,
    /// Name of the source this node belongs to
    #[serde(default)]
    pub source: String,
    /// host/ip
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_table_allowlist() {
        let mut conf = SourceConfig::new("csv", "csv");
        assert!(conf.loads_table("anything"));

        conf.tables_to_load = vec!["users".to_string()];
        assert!(conf.loads_table("users"));
        assert!(conf.loads_table("USERS"));
        assert!(!conf.loads_table("orders"));
    }

    #[test]
    fn test_source_config_from_json() {
        let conf: SourceConfig = serde_json::from_str(
            r#"{"name":"mocksource","type":"memory","tables_to_load":["users"],
                "settings":{"path":"/data"}}"#,
        )
        .unwrap();
        assert_eq!(conf.name, "mocksource");
        assert_eq!(conf.source_type, "memory");
        assert_eq!(conf.tables_to_load, vec!["users".to_string()]);
        assert!(conf.settings.contains_key("path"));
    }
}
