//! Backend-facing traits and implementations.
//!
//! [`DataSource`] is the interface a backend exposes to the virtual
//! schema: table enumeration and connection open, with an optional
//! [`SchemaProvider`] capability for catalog detail. [`memory`] is the
//! in-memory reference backend; [`registry`] maps source-type names
//! from configuration to factories.

pub mod memory;
pub mod registry;
pub mod traits;

pub use memory::{MemoryConnection, MemoryDataSource};
pub use registry::{default_registry, DataSourceRegistry};
pub use traits::{DataSource, SchemaProvider, SourceConnection};
