//! Data source abstraction traits.
//!
//! These are the seams between the engine and concrete backends (CSV
//! files, column stores, remote databases, in-memory tables). The
//! evaluation core is synchronous; implementations that block should
//! honor cancellation through their own means.

use crate::omniquery::schema::error::SchemaResult;
use crate::omniquery::schema::table::Table;
use crate::omniquery::sql::execution::context::RowContext;

/// A backend participating in a virtual schema.
pub trait DataSource: Send + Sync {
    /// List the table names this source exposes.
    fn tables(&self) -> Vec<String>;

    /// Obtain a handle for reading one table. The caller owns the
    /// connection's lifetime.
    fn open(&self, table_name: &str) -> SchemaResult<Box<dyn SourceConnection>>;

    /// Catalog-detail capability, when the source can describe its
    /// tables.
    fn as_schema_provider(&self) -> Option<&dyn SchemaProvider> {
        None
    }
}

/// Optional capability: materialize full catalog detail for a table.
pub trait SchemaProvider {
    fn table(&self, table_name: &str) -> SchemaResult<Table>;
}

/// A live read handle over one table.
pub trait SourceConnection {
    fn table_name(&self) -> &str;

    /// Next row, presented as a read context; `None` at the end.
    fn next_row(&mut self) -> Option<RowContext>;

    fn close(&mut self) -> SchemaResult<()> {
        Ok(())
    }
}
