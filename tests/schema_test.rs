//! Virtual schema registry: refresh, lookup, lazy materialization.

use omniquery::omniquery::datasource::MemoryDataSource;
use omniquery::omniquery::schema::{fnv64, SourceConfig};
use omniquery::{
    eval_select, Column, Expr, Operator, RowWriter, Schema, SourceSchema, SqlSelect, Value,
    ValueKind,
};
use std::sync::Arc;

fn users_orders_source() -> Arc<MemoryDataSource> {
    let ds = Arc::new(MemoryDataSource::new());
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
    ds.load_table(
        "orders",
        vec![
            ("order_id".to_string(), ValueKind::Int),
            ("user_id".to_string(), ValueKind::String),
            ("price".to_string(), ValueKind::Number),
        ],
        vec![vec![
            Value::Int(1),
            Value::String("u1".into()),
            Value::Number(22.5),
        ]],
    );
    ds
}

fn csv_schema() -> (Arc<Schema>, Arc<SourceSchema>, Arc<MemoryDataSource>) {
    let ds = users_orders_source();
    let source = SourceSchema::new("csv", "memory");
    source.set_datasource(ds.clone());
    let schema = Schema::new("test_db");
    schema.add_source_schema(&source);
    (schema, source, ds)
}

#[test]
fn test_tables_merged_and_sorted() {
    let (schema, source, _ds) = csv_schema();
    assert_eq!(
        schema.tables(),
        vec!["orders".to_string(), "users".to_string()]
    );
    assert_eq!(
        source.tables(),
        vec!["orders".to_string(), "users".to_string()]
    );
}

#[test]
fn test_refresh_is_idempotent() {
    let (schema, source, _ds) = csv_schema();
    schema.refresh_schema();
    schema.refresh_schema();
    assert_eq!(schema.tables().len(), 2);
    assert_eq!(source.tables().len(), 2);

    source.add_table_name("users");
    source.add_table_name("users");
    assert_eq!(schema.tables().len(), 2);
}

#[test]
fn test_refresh_marks_schema_current() {
    let (schema, _source, _ds) = csv_schema();
    assert!(schema.current());
    assert!(!schema.since(chrono::Duration::seconds(0)));
}

#[test]
fn test_table_materializes_lazily() {
    let (schema, _source, _ds) = csv_schema();
    let table = schema.table("users").unwrap();
    assert_eq!(table.name(), "users");
    assert_eq!(table.fields().len(), 3);
    assert_eq!(table.field_positions()["email"], 1);
    assert_eq!(table.id(), fnv64(b"users"));
}

#[test]
fn test_table_lookup_lowercase_fallback() {
    let (schema, _source, _ds) = csv_schema();
    let table = schema.table("USERS").unwrap();
    assert_eq!(table.name(), "users");
    assert_eq!(table.name_original(), "users");
}

#[test]
fn test_table_reachable_from_both_registries_identically() {
    let (schema, source, _ds) = csv_schema();
    let from_schema = schema.table("users").unwrap();
    let from_source = source.table("users").unwrap();
    assert!(Arc::ptr_eq(&from_schema, &from_source));

    // back-references point at the owners
    assert!(Arc::ptr_eq(&from_schema.schema().unwrap(), &schema));
    assert!(Arc::ptr_eq(&from_schema.source_schema().unwrap(), &source));
}

#[test]
fn test_unknown_table_is_error() {
    let (schema, _source, _ds) = csv_schema();
    assert!(schema.table("nope").is_err());
    assert!(schema.source("nope").is_err());
    assert!(schema.open("nope").is_err());
}

#[test]
fn test_source_resolution() {
    let (schema, source, _ds) = csv_schema();
    let resolved = schema.source("users").unwrap();
    assert!(Arc::ptr_eq(&resolved, &source));
}

#[test]
fn test_newly_exposed_table_discovered_on_source_lookup() {
    let (schema, _source, ds) = csv_schema();

    // the backend grows a table after the schema was built
    ds.load_table(
        "items",
        vec![("item_id".to_string(), ValueKind::Int)],
        vec![],
    );
    assert!(!schema.tables().contains(&"items".to_string()));

    let resolved = schema.source("items").unwrap();
    assert_eq!(resolved.name(), "csv");
    assert!(schema.tables().contains(&"items".to_string()));
}

#[test]
fn test_tables_to_load_allowlist() {
    let ds = users_orders_source();
    let mut conf = SourceConfig::new("csv", "memory");
    conf.tables_to_load = vec!["users".to_string()];
    let source = SourceSchema::with_config(conf);
    source.set_datasource(ds);

    let schema = Schema::new("filtered");
    schema.add_source_schema(&source);

    assert_eq!(schema.tables(), vec!["users".to_string()]);
    assert_eq!(source.tables(), vec!["users".to_string()]);
}

#[test]
fn test_open_and_project_rows() {
    let (schema, _source, _ds) = csv_schema();
    let mut conn = schema.open("users").unwrap();

    let sel = SqlSelect::new(vec![
        Column::new("email", Expr::ident("email")),
        Column::new("referrals", Expr::ident("referral_count")),
    ])
    .with_where(Expr::binary(
        Operator::Gt,
        Expr::ident("referral_count"),
        Expr::int(50),
    ));

    let mut kept = Vec::new();
    while let Some(row) = conn.next_row() {
        let mut writer = RowWriter::new();
        let (keep, err) = eval_select(&sel, &row, &mut writer);
        assert!(err.is_none());
        if keep {
            kept.push(writer);
        }
    }
    conn.close().unwrap();

    assert_eq!(kept.len(), 1);
    assert_eq!(
        kept[0].get("email"),
        Some(&Value::String("aaron@email.com".to_string()))
    );
    assert_eq!(kept[0].get("referrals"), Some(&Value::Int(82)));
}
