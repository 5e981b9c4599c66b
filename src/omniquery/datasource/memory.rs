//! In-memory data source: the reference backend and test fixture.
//!
//! Tables are loaded as column lists plus row vectors; connections
//! iterate rows as [`RowContext`]s keyed by the table name.

use super::traits::{DataSource, SchemaProvider, SourceConnection};
use crate::omniquery::schema::error::{SchemaError, SchemaResult};
use crate::omniquery::schema::table::Table;
use crate::omniquery::sql::execution::context::RowContext;
use crate::omniquery::sql::execution::types::{Value, ValueKind};
use std::collections::BTreeMap;
use std::sync::RwLock;

struct MemoryTable {
    columns: Vec<(String, ValueKind)>,
    rows: Vec<Vec<Value>>,
}

/// An in-memory table store.
#[derive(Default)]
pub struct MemoryDataSource {
    tables: RwLock<BTreeMap<String, MemoryTable>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or replace) a table. Row values are positional against
    /// the column list; short rows read as NULL.
    pub fn load_table(
        &self,
        name: &str,
        columns: Vec<(String, ValueKind)>,
        rows: Vec<Vec<Value>>,
    ) {
        let mut tables = self.tables.write().unwrap();
        tables.insert(name.to_lowercase(), MemoryTable { columns, rows });
    }

    pub fn row_count(&self, name: &str) -> usize {
        let tables = self.tables.read().unwrap();
        tables.get(&name.to_lowercase()).map_or(0, |t| t.rows.len())
    }
}

impl DataSource for MemoryDataSource {
    fn tables(&self) -> Vec<String> {
        let tables = self.tables.read().unwrap();
        tables.keys().cloned().collect()
    }

    fn open(&self, table_name: &str) -> SchemaResult<Box<dyn SourceConnection>> {
        let lower = table_name.to_lowercase();
        let tables = self.tables.read().unwrap();
        let table = tables
            .get(&lower)
            .ok_or_else(|| SchemaError::table_not_found(table_name))?;

        let rows = table
            .rows
            .iter()
            .map(|row| {
                let mut ctx = RowContext::new().with_key(lower.clone());
                for (idx, (col, _)) in table.columns.iter().enumerate() {
                    let value = row.get(idx).cloned().unwrap_or(Value::Null);
                    ctx.insert(col.clone(), value);
                }
                ctx
            })
            .collect();
        Ok(Box::new(MemoryConnection {
            table_name: lower,
            rows,
            pos: 0,
        }))
    }

    fn as_schema_provider(&self) -> Option<&dyn SchemaProvider> {
        Some(self)
    }
}

impl SchemaProvider for MemoryDataSource {
    fn table(&self, table_name: &str) -> SchemaResult<Table> {
        let lower = table_name.to_lowercase();
        let tables = self.tables.read().unwrap();
        let mem = tables
            .get(&lower)
            .ok_or_else(|| SchemaError::table_not_found(table_name))?;

        let mut table = Table::new(&lower);
        for (col, kind) in &mem.columns {
            table.add_field_type(col.clone(), *kind);
        }
        table.set_columns(mem.columns.iter().map(|(col, _)| col.clone()).collect());
        table.set_refreshed();
        Ok(table)
    }
}

/// Row iterator over one in-memory table.
pub struct MemoryConnection {
    table_name: String,
    rows: Vec<RowContext>,
    pos: usize,
}

impl SourceConnection for MemoryConnection {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn next_row(&mut self) -> Option<RowContext> {
        let row = self.rows.get(self.pos).cloned();
        if row.is_some() {
            self.pos += 1;
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::omniquery::sql::execution::context::ReadContext;

    fn users_source() -> MemoryDataSource {
        let ds = MemoryDataSource::new();
        ds.load_table(
            "users",
            vec![
                ("user_id".to_string(), ValueKind::String),
                ("email".to_string(), ValueKind::String),
                ("referral_count".to_string(), ValueKind::Int),
            ],
            vec![
                vec![
                    Value::String("u1".into()),
                    Value::String("aaron@email.com".into()),
                    Value::Int(82),
                ],
                vec![
                    Value::String("u2".into()),
                    Value::String("bob@email.com".into()),
                    Value::Int(12),
                ],
            ],
        );
        ds
    }

    #[test]
    fn test_tables_sorted() {
        let ds = users_source();
        ds.load_table("orders", vec![("order_id".to_string(), ValueKind::Int)], vec![]);
        assert_eq!(ds.tables(), vec!["orders".to_string(), "users".to_string()]);
    }

    #[test]
    fn test_open_iterates_rows() {
        let ds = users_source();
        let mut conn = ds.open("users").unwrap();
        assert_eq!(conn.table_name(), "users");

        let row = conn.next_row().unwrap();
        assert_eq!(row.schema_key(), "users");
        assert_eq!(row.get("referral_count"), Some(Value::Int(82)));
        assert!(conn.next_row().is_some());
        assert!(conn.next_row().is_none());
    }

    #[test]
    fn test_schema_provider_table() {
        let ds = users_source();
        let table = ds.as_schema_provider().unwrap().table("USERS").unwrap();
        assert_eq!(table.name(), "users");
        assert_eq!(table.fields().len(), 3);
        assert_eq!(table.field_positions()["email"], 1);
        assert!(ds.as_schema_provider().unwrap().table("missing").is_err());
    }

    #[test]
    fn test_short_rows_read_null() {
        let ds = MemoryDataSource::new();
        ds.load_table(
            "t",
            vec![
                ("a".to_string(), ValueKind::Int),
                ("b".to_string(), ValueKind::Int),
            ],
            vec![vec![Value::Int(1)]],
        );
        let mut conn = ds.open("t").unwrap();
        let row = conn.next_row().unwrap();
        assert_eq!(row.get("a"), Some(Value::Int(1)));
        assert_eq!(row.get("b"), Some(Value::Null));
    }
}
