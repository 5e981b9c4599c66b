//! Data source registry: maps source-type names from configuration to
//! factories producing live sources.

use super::memory::MemoryDataSource;
use super::traits::DataSource;
use crate::omniquery::schema::config::SourceConfig;
use crate::omniquery::schema::error::{SchemaError, SchemaResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

type SourceFactory = Box<dyn Fn(&SourceConfig) -> SchemaResult<Arc<dyn DataSource>> + Send + Sync>;

/// Registry of data source factories keyed by the `type` field of a
/// [`SourceConfig`].
pub struct DataSourceRegistry {
    factories: Mutex<HashMap<String, SourceFactory>>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self {
            factories: Mutex::new(HashMap::new()),
        }
    }

    /// Register a factory for a source type.
    pub fn register<F>(&self, source_type: &str, factory: F)
    where
        F: Fn(&SourceConfig) -> SchemaResult<Arc<dyn DataSource>> + Send + Sync + 'static,
    {
        let mut factories = self.factories.lock().unwrap();
        factories.insert(source_type.to_lowercase(), Box::new(factory));
    }

    /// Create a data source from its configuration.
    pub fn create(&self, conf: &SourceConfig) -> SchemaResult<Arc<dyn DataSource>> {
        let factories = self.factories.lock().unwrap();
        let factory = factories
            .get(&conf.source_type.to_lowercase())
            .ok_or_else(|| {
                SchemaError::config(format!(
                    "no datasource registered for type {:?}",
                    conf.source_type
                ))
            })?;
        factory(conf)
    }

    /// Sorted registered source-type names.
    pub fn source_types(&self) -> Vec<String> {
        let factories = self.factories.lock().unwrap();
        let mut types: Vec<String> = factories.keys().cloned().collect();
        types.sort();
        types
    }
}

impl Default for DataSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide registry with the builtin backends installed.
pub fn default_registry() -> &'static DataSourceRegistry {
    static REGISTRY: OnceLock<DataSourceRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = DataSourceRegistry::new();
        registry.register("memory", |_conf| Ok(Arc::new(MemoryDataSource::new())));
        registry
    })
}
