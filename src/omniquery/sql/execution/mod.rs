//! Execution engine: the dynamic value system, evaluation contexts,
//! the expression evaluator, and the SQL row evaluator.

pub mod context;
pub mod expression;
pub mod select;
pub mod types;

pub use context::{ReadContext, RowContext, RowWriter, WriteContext};
pub use select::eval_select;
pub use types::{Value, ValueKind};
