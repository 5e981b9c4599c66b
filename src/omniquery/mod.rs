//! Top-level module layout.
//!
//! - [`sql`] — AST contract, errors, and the execution engine
//!   (value system, expression evaluator, row evaluator)
//! - [`schema`] — the virtual schema registry: schemas, source
//!   schemas, tables, fields, and configuration
//! - [`datasource`] — backend-facing traits plus the in-memory
//!   reference implementation and the source-type registry

pub mod datasource;
pub mod schema;
pub mod sql;
