//! Evaluation contexts: the read side presents one input row to the
//! evaluator, the write side receives projected column values.

use super::types::Value;
use crate::omniquery::sql::error::SqlError;
use std::collections::HashMap;

/// Identifies the schema origin of a column descriptor. The key may be
/// empty for descriptor-less writes (single-expression VM results).
pub trait SchemaInfo {
    fn key(&self) -> &str;
}

/// The empty descriptor used when an expression result has no column.
pub struct NoSchema;

impl SchemaInfo for NoSchema {
    fn key(&self) -> &str {
        ""
    }
}

/// Read access to one input row.
///
/// A missing name is `None`; the evaluator treats that as NULL rather
/// than an error, so sparse rows evaluate without ceremony.
pub trait ReadContext {
    fn get(&self, name: &str) -> Option<Value>;

    /// Key identifying the schema this row originated from.
    fn schema_key(&self) -> &str {
        ""
    }
}

/// Write access to the output row or message.
pub trait WriteContext {
    fn put(
        &mut self,
        col: &dyn SchemaInfo,
        read: &dyn ReadContext,
        value: Value,
    ) -> Result<(), SqlError>;
}

impl ReadContext for HashMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        HashMap::get(self, name).cloned()
    }
}

/// Map-backed read context over one row.
#[derive(Debug, Clone, Default)]
pub struct RowContext {
    fields: HashMap<String, Value>,
    key: String,
}

impl RowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: HashMap<String, Value>) -> Self {
        Self {
            fields,
            key: String::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Builder-style field insertion for tests and fixtures.
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }
}

impl ReadContext for RowContext {
    fn get(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn schema_key(&self) -> &str {
        &self.key
    }
}

/// Map-backed write context collecting projected values.
///
/// Duplicate column names keep the last write.
#[derive(Debug, Clone, Default)]
pub struct RowWriter {
    fields: HashMap<String, Value>,
}

impl RowWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> HashMap<String, Value> {
        self.fields
    }
}

impl WriteContext for RowWriter {
    fn put(
        &mut self,
        col: &dyn SchemaInfo,
        _read: &dyn ReadContext,
        value: Value,
    ) -> Result<(), SqlError> {
        self.fields.insert(col.key().to_string(), value);
        Ok(())
    }
}
