//! Virtual schema registry.
//!
//! A [`Schema`] is a virtual database: multiple [`SourceSchema`]s,
//! each backed by one data source, contribute tables to a single
//! namespace. Table names must be unique across the schema (or
//! aliased). Tables may exist as placeholders and are materialized
//! lazily from their data source on first access; a refresh interval
//! bounds how stale a materialized catalog may get.

pub mod config;
pub mod error;
pub mod registry;
pub mod table;

pub use config::{NodeConfig, SchemaConfig, SourceConfig};
pub use error::{SchemaError, SchemaResult};
pub use registry::{Schema, SourceSchema};
pub use table::{
    describe_full_headers, describe_headers, fnv64, schema_refresh_interval, Field, Index, Table,
    DEFAULT_CHARSET, DESCRIBE_COLS, DESCRIBE_FULL_COLS,
};
