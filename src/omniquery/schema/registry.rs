//! Virtual schema and source schema registries.
//!
//! A [`Schema`] merges the table namespaces of its [`SourceSchema`]s.
//! Identity is immutable after registration; the table sets mutate
//! behind one reader-writer lock per registry. Lazy materialization
//! re-verifies under the write side before inserting, so concurrent
//! readers racing on a cache miss converge on one table.
//!
//! Ownership runs downward (schema owns sources, sources own tables);
//! the reverse links are weak handles.

use super::config::{NodeConfig, SourceConfig};
use super::error::{SchemaError, SchemaResult};
use super::table::{schema_refresh_interval, Table};
use crate::omniquery::datasource::{DataSource, SourceConnection};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

/// A virtual schema database: multiple data sources, each supplying
/// tables to one shared pool. Each table name must be unique across
/// the schema, or aliased — an unaliased collision is a configuration
/// error.
pub struct Schema {
    name: String,
    inner: RwLock<SchemaInner>,
}

#[derive(Default)]
struct SchemaInner {
    /// source name -> source schema
    source_schemas: HashMap<String, Arc<SourceSchema>>,
    /// table name -> owning source schema
    table_sources: HashMap<String, Arc<SourceSchema>>,
    /// table name -> table; None marks a known but unmaterialized table
    table_map: HashMap<String, Option<Arc<Table>>>,
    /// sorted, duplicate-free
    table_names: Vec<String>,
    last_refreshed: Option<DateTime<Utc>>,
}

impl Schema {
    /// New empty schema; the name is lowercased.
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_lowercase(),
            inner: RwLock::new(SchemaInner::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install a source schema and pick up its tables.
    pub fn add_source_schema(self: &Arc<Self>, source: &Arc<SourceSchema>) {
        source.attach(self);
        {
            let mut inner = self.inner.write().unwrap();
            inner
                .source_schemas
                .insert(source.name().to_string(), source.clone());
        }
        self.refresh_schema();
    }

    /// Re-enumerate every source's tables into the name lists.
    pub fn refresh_schema(&self) {
        let sources: Vec<Arc<SourceSchema>> = {
            let inner = self.inner.read().unwrap();
            inner.source_schemas.values().cloned().collect()
        };
        for source in sources {
            let table_names = match source.datasource() {
                Some(ds) => ds.tables(),
                // no live datasource: re-propagate what the source knows
                None => source.tables(),
            };
            for table_name in table_names {
                source.add_table_name(&table_name);
            }
        }
        let mut inner = self.inner.write().unwrap();
        inner.last_refreshed = Some(Utc::now());
    }

    /// Resolve a table name to the source schema backing it.
    ///
    /// Tries exact then lowercased match; on a miss, probes every
    /// source for newly appeared tables, refreshes once, and retries.
    pub fn source(&self, table_name: &str) -> SchemaResult<Arc<SourceSchema>> {
        if let Some(source) = self.lookup_source(table_name) {
            return Ok(source);
        }

        // A table may have been added at the source since we built the
        // internal cache; look for anything unknown and refresh.
        let sources: Vec<Arc<SourceSchema>> = {
            let inner = self.inner.read().unwrap();
            inner.source_schemas.values().cloned().collect()
        };
        let mut discovered = false;
        'sources: for source in &sources {
            let Some(ds) = source.datasource() else {
                continue;
            };
            for table in ds.tables() {
                let known = {
                    let inner = self.inner.read().unwrap();
                    inner.table_sources.contains_key(&table)
                };
                if !known {
                    log::debug!("schema {}: discovered new table {:?}", self.name, table);
                    discovered = true;
                    break 'sources;
                }
            }
        }
        if discovered {
            self.refresh_schema();
            if let Some(source) = self.lookup_source(table_name) {
                return Ok(source);
            }
        }
        Err(SchemaError::source_not_found(table_name))
    }

    fn lookup_source(&self, table_name: &str) -> Option<Arc<SourceSchema>> {
        let inner = self.inner.read().unwrap();
        if let Some(source) = inner.table_sources.get(table_name) {
            return Some(source.clone());
        }
        inner
            .table_sources
            .get(&table_name.to_lowercase())
            .cloned()
    }

    /// Get a connection to the source backing a table. The caller owns
    /// the connection's lifetime; nothing is pooled here.
    pub fn open(&self, table_name: &str) -> SchemaResult<Box<dyn SourceConnection>> {
        let source = self.source(table_name)?;
        let ds = source
            .datasource()
            .ok_or_else(|| SchemaError::source_not_found(table_name))?;
        ds.open(table_name)
    }

    /// Look up a table, materializing it from its datasource when only
    /// a placeholder is present.
    pub fn table(&self, table_name: &str) -> SchemaResult<Arc<Table>> {
        let lower = table_name.to_lowercase();
        {
            let inner = self.inner.read().unwrap();
            if let Some(Some(table)) = inner.table_map.get(table_name) {
                return Ok(table.clone());
            }
            if let Some(Some(table)) = inner.table_map.get(&lower) {
                return Ok(table.clone());
            }
        }

        let source = self
            .lookup_source(&lower)
            .ok_or_else(|| SchemaError::table_not_found(table_name))?;
        source.table(&lower)
    }

    /// Sorted snapshot of every table name in the schema.
    pub fn tables(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        inner.table_names.clone()
    }

    /// Register a table name for a source. Insert-if-absent; keeps the
    /// name list sorted.
    pub fn add_table_name(&self, table_name: &str, source: &Arc<SourceSchema>) {
        let mut inner = self.inner.write().unwrap();
        if !inner.table_names.iter().any(|t| t == table_name) {
            inner.table_names.push(table_name.to_string());
            inner.table_names.sort();
            if !inner.table_map.contains_key(table_name) {
                inner
                    .table_sources
                    .insert(table_name.to_string(), source.clone());
                inner.table_map.insert(table_name.to_string(), None);
            }
        }
    }

    pub(crate) fn add_table(&self, table: Arc<Table>, source: &Arc<SourceSchema>) {
        let name = table.name().to_string();
        let mut inner = self.inner.write().unwrap();
        inner.table_sources.insert(name.clone(), source.clone());
        inner.table_map.insert(name.clone(), Some(table));
        if !inner.table_names.iter().any(|t| t == &name) {
            inner.table_names.push(name);
            inner.table_names.sort();
        }
    }

    /// The source schemas participating in this schema.
    pub fn source_schemas(&self) -> Vec<Arc<SourceSchema>> {
        let inner = self.inner.read().unwrap();
        inner.source_schemas.values().cloned().collect()
    }

    pub fn source_schema(&self, name: &str) -> Option<Arc<SourceSchema>> {
        let inner = self.inner.read().unwrap();
        inner.source_schemas.get(name).cloned()
    }

    /// Has this schema been refreshed within the staleness window?
    pub fn current(&self) -> bool {
        self.since(schema_refresh_interval())
    }

    pub fn since(&self, within: Duration) -> bool {
        let inner = self.inner.read().unwrap();
        match inner.last_refreshed {
            None => false,
            Some(at) => Utc::now() - at < within,
        }
    }
}

/// The catalog one data source contributes to a virtual schema.
pub struct SourceSchema {
    name: String,
    conf: SourceConfig,
    schema: RwLock<Weak<Schema>>,
    self_ref: Weak<SourceSchema>,
    inner: RwLock<SourceInner>,
}

#[derive(Default)]
struct SourceInner {
    ds: Option<Arc<dyn DataSource>>,
    nodes: Vec<NodeConfig>,
    /// table name -> table; None marks a placeholder
    table_map: HashMap<String, Option<Arc<Table>>>,
    table_names: Vec<String>,
}

impl SourceSchema {
    pub fn new(name: &str, source_type: &str) -> Arc<Self> {
        Self::with_config(SourceConfig::new(name, source_type))
    }

    pub fn with_config(conf: SourceConfig) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            name: conf.name.clone(),
            conf,
            schema: RwLock::new(Weak::new()),
            self_ref: me.clone(),
            inner: RwLock::new(SourceInner::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conf(&self) -> &SourceConfig {
        &self.conf
    }

    /// The schema this source participates in, once registered.
    pub fn schema(&self) -> Option<Arc<Schema>> {
        self.schema.read().unwrap().upgrade()
    }

    pub(crate) fn attach(&self, schema: &Arc<Schema>) {
        *self.schema.write().unwrap() = Arc::downgrade(schema);
    }

    pub fn set_datasource(&self, ds: Arc<dyn DataSource>) {
        let mut inner = self.inner.write().unwrap();
        inner.ds = Some(ds);
    }

    pub fn datasource(&self) -> Option<Arc<dyn DataSource>> {
        let inner = self.inner.read().unwrap();
        inner.ds.clone()
    }

    pub fn add_node(&self, node: NodeConfig) {
        let mut inner = self.inner.write().unwrap();
        inner.nodes.push(node);
    }

    pub fn nodes(&self) -> Vec<NodeConfig> {
        let inner = self.inner.read().unwrap();
        inner.nodes.clone()
    }

    /// Register a table name, honoring the `tables_to_load` allowlist,
    /// and propagate it to the parent schema. Idempotent.
    pub fn add_table_name(&self, table_name: &str) {
        if !self.conf.loads_table(table_name) {
            return;
        }
        let inserted = {
            let mut inner = self.inner.write().unwrap();
            if inner.table_names.iter().any(|t| t == table_name) {
                false
            } else {
                inner.table_names.push(table_name.to_string());
                inner.table_names.sort();
                inner
                    .table_map
                    .entry(table_name.to_string())
                    .or_insert(None);
                true
            }
        };
        if inserted {
            if let (Some(schema), Some(me)) = (self.schema(), self.self_ref.upgrade()) {
                schema.add_table_name(table_name, &me);
            }
        }
    }

    /// Register a materialized table: assigns its id, links the owner
    /// backpointers, stores it here and in the parent schema.
    pub fn add_table(&self, mut table: Table) -> Arc<Table> {
        table.assign_id();
        let schema_weak = self
            .schema()
            .map(|s| Arc::downgrade(&s))
            .unwrap_or_default();
        table.set_owners(schema_weak, self.self_ref.clone());

        let name = table.name().to_string();
        let table = Arc::new(table);
        {
            let mut inner = self.inner.write().unwrap();
            inner.table_map.insert(name.clone(), Some(table.clone()));
            if !inner.table_names.iter().any(|t| t == &name) {
                inner.table_names.push(name.clone());
                inner.table_names.sort();
            }
        }
        if let (Some(schema), Some(me)) = (self.schema(), self.self_ref.upgrade()) {
            schema.add_table(table.clone(), &me);
        }
        table
    }

    /// Sorted snapshot of this source's table names.
    pub fn tables(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        inner.table_names.clone()
    }

    /// Look up a table, materializing placeholders and refreshing
    /// stale entries through the datasource's schema provider.
    pub fn table(&self, table_name: &str) -> SchemaResult<Arc<Table>> {
        let known = {
            let inner = self.inner.read().unwrap();
            match inner.table_map.get(table_name) {
                Some(Some(table)) if table.current() => return Ok(table.clone()),
                Some(_) => true,
                None => false,
            }
        };
        if !known {
            return Err(SchemaError::table_not_found(table_name));
        }

        let ds = self
            .datasource()
            .ok_or_else(|| SchemaError::source_not_found(table_name))?;
        let provider = ds
            .as_schema_provider()
            .ok_or_else(|| SchemaError::table_not_found(table_name))?;
        let fetched = provider.table(table_name)?;

        // another caller may have materialized while we fetched
        {
            let inner = self.inner.read().unwrap();
            if let Some(Some(existing)) = inner.table_map.get(table_name) {
                if existing.current() {
                    return Ok(existing.clone());
                }
            }
        }
        log::debug!("source {}: materialized table {:?}", self.name, table_name);
        Ok(self.add_table(fetched))
    }
}
