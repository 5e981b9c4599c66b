//! Expression evaluation core for an embeddable SQL-like query engine.
//!
//! `omniquery` provides the pieces needed to run SELECT-style projection
//! and filtering over rows coming from heterogeneous backends:
//!
//! - A dynamic [`Value`] system with uniform coercion and comparison
//! - A tree-walking expression evaluator over a parsed AST
//! - A SQL row evaluator applying WHERE gates and per-column guards
//! - A virtual schema registry merging table catalogs from multiple
//!   data sources, with lazy materialization and interval refresh
//!
//! The SQL parser and concrete remote backends are external; this crate
//! consumes their AST and [`DataSource`] interfaces.
//!
//! [`Value`]: omniquery::sql::execution::types::Value
//! [`DataSource`]: omniquery::datasource::DataSource

pub mod omniquery;

// Re-export the primary API surface
pub use omniquery::datasource::{DataSource, SchemaProvider, SourceConnection};
pub use omniquery::schema::{Field, Schema, SchemaError, SchemaResult, SourceSchema, Table};
pub use omniquery::sql::ast::{Column, Expr, Operator, SqlSelect};
pub use omniquery::sql::error::{SqlError, SqlResult};
pub use omniquery::sql::execution::context::{ReadContext, RowContext, RowWriter, WriteContext};
pub use omniquery::sql::execution::expression::{ExpressionEvaluator, ExprVm, FunctionRegistry};
pub use omniquery::sql::execution::select::eval_select;
pub use omniquery::sql::execution::types::{Value, ValueKind};
