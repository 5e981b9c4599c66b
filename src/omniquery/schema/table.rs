//! Tables and fields: the catalog detail of a virtual schema, plus the
//! static column layouts used for SHOW COLUMNS output.

use super::registry::{Schema, SourceSchema};
use crate::omniquery::sql::execution::types::{Value, ValueKind};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Default table character set (utf8).
pub const DEFAULT_CHARSET: u16 = 33;

/// Elapsed seconds after which a schema or table is considered stale.
pub const SCHEMA_REFRESH_SECONDS: i64 = 5 * 60;

/// The staleness window as a duration.
pub fn schema_refresh_interval() -> Duration {
    Duration::seconds(SCHEMA_REFRESH_SECONDS)
}

/// 64-bit FNV-1 hash, used for stable table ids.
pub fn fnv64(data: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 14695981039346656037;
    const PRIME: u64 = 1099511628211;
    let mut hash = OFFSET_BASIS;
    for &byte in data {
        hash = hash.wrapping_mul(PRIME);
        hash ^= byte as u64;
    }
    hash
}

/// Column names shown by `DESCRIBE <table>`.
pub const DESCRIBE_COLS: [&str; 6] = ["Field", "Type", "Null", "Key", "Default", "Extra"];

/// Column names shown by `SHOW FULL COLUMNS`.
pub const DESCRIBE_FULL_COLS: [&str; 9] = [
    "Field",
    "Type",
    "Collation",
    "Null",
    "Key",
    "Default",
    "Extra",
    "Privileges",
    "Comment",
];

/// An index over one or more fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    pub fields: Vec<String>,
}

/// Describes one column: name, data type, defaults, index, null policy.
///
/// Dialects carry their own descriptors for these; this is the generic
/// shape converted at the frontend.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    /// Comment/description
    pub description: String,
    /// Key info (primary etc)
    pub key: String,
    pub extra: String,
    /// Field size, ie varchar(255)
    pub length: u32,
    pub value_type: ValueKind,
    pub default_value: Option<Value>,
    pub indexed: bool,
    /// Whether nulls are rejected; default false (nulls allowed)
    pub no_nulls: bool,
    pub collation: String,
    /// ie {select, insert, update, delete}
    pub roles: Vec<String>,
    pub indexes: Vec<Index>,
    idx: usize,
}

impl Field {
    pub fn base(
        name: impl Into<String>,
        value_type: ValueKind,
        length: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            key: String::new(),
            extra: String::new(),
            length,
            value_type,
            default_value: None,
            indexed: false,
            no_nulls: false,
            collation: String::new(),
            roles: Vec::new(),
            indexes: Vec::new(),
            idx: 0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        value_type: ValueKind,
        length: u32,
        allow_nulls: bool,
        default_value: Option<Value>,
        key: impl Into<String>,
        collation: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut field = Field::base(name, value_type, length, description);
        field.no_nulls = !allow_nulls;
        field.default_value = default_value;
        field.key = key.into();
        field.collation = collation.into();
        field
    }

    /// Ordinal position within the table's field list.
    pub fn position(&self) -> usize {
        self.idx
    }
}

/// Traditional definition of a database table: member of a schema,
/// usable to open a datasource connection reading it.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    name_original: String,
    fields: Vec<Field>,
    field_map: HashMap<String, usize>,
    field_positions: HashMap<String, usize>,
    cols: Vec<String>,
    charset: u16,
    table_id: u64,
    schema: Weak<Schema>,
    source_schema: Weak<SourceSchema>,
    last_refreshed: DateTime<Utc>,
}

impl Table {
    /// New table; the name is lowercased, the original case retained.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            name_original: name.to_string(),
            fields: Vec::new(),
            field_map: HashMap::new(),
            field_positions: HashMap::new(),
            cols: Vec::new(),
            charset: DEFAULT_CHARSET,
            table_id: 0,
            schema: Weak::new(),
            source_schema: Weak::new(),
            last_refreshed: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_original(&self) -> &str {
        &self.name_original
    }

    /// Stable id: FNV-64 of the lowercase name, assigned at
    /// registration and immutable thereafter.
    pub fn id(&self) -> u64 {
        self.table_id
    }

    pub fn charset(&self) -> u16 {
        self.charset
    }

    pub(crate) fn assign_id(&mut self) {
        if self.table_id == 0 {
            self.table_id = fnv64(self.name.as_bytes());
        }
    }

    pub(crate) fn set_owners(&mut self, schema: Weak<Schema>, source: Weak<SourceSchema>) {
        self.schema = schema;
        self.source_schema = source;
    }

    /// The virtual schema this table is a member of, if registered.
    pub fn schema(&self) -> Option<Arc<Schema>> {
        self.schema.upgrade()
    }

    /// The source schema this table came from, if registered.
    pub fn source_schema(&self) -> Option<Arc<SourceSchema>> {
        self.source_schema.upgrade()
    }

    /// Add a field; replaces an existing field of the same name in
    /// place, otherwise appends with the next ordinal.
    pub fn add_field(&mut self, mut field: Field) {
        match self.field_map.get(&field.name) {
            Some(&existing) => {
                field.idx = existing;
                self.fields[existing] = field.clone();
                self.field_map.insert(field.name, existing);
            }
            None => {
                field.idx = self.fields.len();
                self.field_map.insert(field.name.clone(), field.idx);
                self.fields.push(field);
            }
        }
    }

    pub fn add_field_type(&mut self, name: impl Into<String>, value_type: ValueKind) {
        self.add_field(Field::base(name, value_type, 0, ""));
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_map.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_map.get(name).map(|&i| &self.fields[i])
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Explicitly set the column name list, rebuilding positions.
    pub fn set_columns(&mut self, cols: Vec<String>) {
        self.field_positions = cols
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.clone(), idx))
            .collect();
        self.cols = cols;
    }

    pub fn columns(&self) -> &[String] {
        &self.cols
    }

    /// Field name to ordinal position in the column list.
    pub fn field_positions(&self) -> &HashMap<String, usize> {
        &self.field_positions
    }

    pub fn set_refreshed(&mut self) {
        self.last_refreshed = Utc::now();
    }

    /// Has this catalog been refreshed within the staleness window?
    pub fn current(&self) -> bool {
        self.since(schema_refresh_interval())
    }

    pub fn since(&self, within: Duration) -> bool {
        Utc::now() - self.last_refreshed < within
    }
}

/// Field layout for `SHOW FULL COLUMNS` (9 columns).
pub fn describe_full_headers() -> Vec<Field> {
    vec![
        Field::base("Field", ValueKind::String, 255, "COLUMN_NAME"),
        Field::base("Type", ValueKind::String, 32, "COLUMN_TYPE"),
        Field::base("Collation", ValueKind::String, 32, "COLUMN_COLLATION"),
        Field::base("Null", ValueKind::String, 4, "IS_NULLABLE"),
        Field::base("Key", ValueKind::String, 64, "COLUMN_KEY"),
        Field::base("Default", ValueKind::String, 32, "COLUMN_DEFAULT"),
        Field::base("Extra", ValueKind::String, 255, ""),
        Field::base("Privileges", ValueKind::String, 255, ""),
        Field::base("Comment", ValueKind::String, 255, ""),
    ]
}

/// Field layout for `SHOW COLUMNS` / `DESCRIBE` (6 columns).
pub fn describe_headers() -> Vec<Field> {
    vec![
        Field::base("Field", ValueKind::String, 255, "COLUMN_NAME"),
        Field::base("Type", ValueKind::String, 32, "COLUMN_TYPE"),
        Field::base("Null", ValueKind::String, 4, "IS_NULLABLE"),
        Field::base("Key", ValueKind::String, 64, "COLUMN_KEY"),
        Field::base("Default", ValueKind::String, 32, "COLUMN_DEFAULT"),
        Field::base("Extra", ValueKind::String, 255, ""),
    ]
}
