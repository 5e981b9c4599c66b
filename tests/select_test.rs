//! SQL row evaluator: WHERE gates, column guards, projection.

use omniquery::{
    eval_select, Column, Expr, Operator, RowContext, RowWriter, SqlSelect, Value,
};

fn test_row() -> RowContext {
    RowContext::new()
        .field("name", Value::String("bob".to_string()))
        .field("age", Value::Int(42))
        .field("email", Value::String("bob@email.com".to_string()))
}

fn select_name_and_age() -> Vec<Column> {
    vec![
        Column::new("name", Expr::ident("name")),
        Column::new("age", Expr::ident("age")),
    ]
}

#[test]
fn test_projection_without_where() {
    let sel = SqlSelect::new(select_name_and_age());
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(err.is_none());
    assert_eq!(writer.get("name"), Some(&Value::String("bob".to_string())));
    assert_eq!(writer.get("age"), Some(&Value::Int(42)));
}

#[test]
fn test_where_false_filters_row() {
    let sel = SqlSelect::new(select_name_and_age()).with_where(Expr::binary(
        Operator::Gt,
        Expr::ident("age"),
        Expr::int(100),
    ));
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(!keep);
    assert!(err.is_none());
    // filtered rows never project
    assert!(writer.is_empty());
}

#[test]
fn test_where_true_projects() {
    let sel = SqlSelect::new(select_name_and_age()).with_where(Expr::binary(
        Operator::EqualEqual,
        Expr::ident("name"),
        Expr::string("bob"),
    ));
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(err.is_none());
    assert_eq!(writer.len(), 2);
}

#[test]
fn test_where_unknown_keeps_row() {
    // comparing a missing column: the predicate cannot resolve, and
    // unknown keeps the row
    let sel = SqlSelect::new(select_name_and_age()).with_where(Expr::binary(
        Operator::EqualEqual,
        Expr::ident("missing_col"),
        Expr::string("bob"),
    ));
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(err.is_none());
}

#[test]
fn test_where_null_keeps_row() {
    let sel = SqlSelect::new(select_name_and_age()).with_where(Expr::literal(Value::Null));
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(err.is_none());
}

#[test]
fn test_where_error_value_keeps_row_and_surfaces_error() {
    // multiplying strings is a row-local error value
    let sel = SqlSelect::new(select_name_and_age()).with_where(Expr::binary(
        Operator::Multiply,
        Expr::ident("name"),
        Expr::ident("email"),
    ));
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(err.is_some());
}

#[test]
fn test_guard_false_skips_only_that_column() {
    let guarded = Column::new("email", Expr::ident("email")).with_guard(Expr::binary(
        Operator::Gt,
        Expr::ident("age"),
        Expr::int(100),
    ));
    let sel = SqlSelect::new(vec![
        Column::new("name", Expr::ident("name")),
        guarded,
        Column::new("age", Expr::ident("age")),
    ]);
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(err.is_none());
    assert!(writer.contains("name"));
    assert!(writer.contains("age"));
    assert!(!writer.contains("email"));
}

#[test]
fn test_guard_true_keeps_column() {
    let guarded = Column::new("email", Expr::ident("email")).with_guard(Expr::binary(
        Operator::Gt,
        Expr::ident("age"),
        Expr::int(40),
    ));
    let sel = SqlSelect::new(vec![guarded]);
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, _) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(writer.contains("email"));
}

#[test]
fn test_guard_on_missing_column_skips() {
    let guarded = Column::new("email", Expr::ident("email")).with_guard(Expr::binary(
        Operator::EqualEqual,
        Expr::ident("missing_col"),
        Expr::int(1),
    ));
    let sel = SqlSelect::new(vec![guarded, Column::new("name", Expr::ident("name"))]);
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(err.is_none());
    assert!(!writer.contains("email"));
    assert!(writer.contains("name"));
}

#[test]
fn test_unresolved_column_is_omitted() {
    let sel = SqlSelect::new(vec![
        Column::new("name", Expr::ident("name")),
        Column::new("nope", Expr::ident("missing_col")),
    ]);
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(err.is_none());
    assert!(writer.contains("name"));
    assert!(!writer.contains("nope"));
}

#[test]
fn test_undefined_function_column_is_omitted() {
    let sel = SqlSelect::new(vec![
        Column::new("root", Expr::func("sqrt", vec![Expr::ident("name")])),
        Column::new("age", Expr::ident("age")),
    ]);
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, err) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert!(err.is_none());
    assert!(!writer.contains("root"));
    assert!(writer.contains("age"));
}

#[test]
fn test_computed_columns() {
    let sel = SqlSelect::new(vec![
        Column::new("next_age", Expr::binary(Operator::Plus, Expr::ident("age"), Expr::int(1))),
        Column::new("n", Expr::func("count", vec![Expr::ident("age")])),
    ]);
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, _) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert_eq!(writer.get("next_age"), Some(&Value::Int(43)));
    assert_eq!(writer.get("n"), Some(&Value::Int(1)));
}

#[test]
fn test_duplicate_output_names_last_write_wins() {
    let sel = SqlSelect::new(vec![
        Column::new("v", Expr::int(1)),
        Column::new("v", Expr::int(2)),
    ]);
    let row = test_row();
    let mut writer = RowWriter::new();

    let (keep, _) = eval_select(&sel, &row, &mut writer);
    assert!(keep);
    assert_eq!(writer.get("v"), Some(&Value::Int(2)));
    assert_eq!(writer.len(), 1);
}
