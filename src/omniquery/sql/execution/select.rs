//! SQL row evaluator: applies a SELECT to one row.
//!
//! The WHERE predicate gates the whole row; each column may carry its
//! own guard that omits just that column. WHERE follows three-valued
//! logic: a predicate that is NULL or could not fully resolve keeps
//! the row — unknown is not false.

use super::context::{ReadContext, WriteContext};
use super::expression::ExpressionEvaluator;
use super::types::Value;
use crate::omniquery::sql::ast::SqlSelect;
use crate::omniquery::sql::error::SqlError;

/// Apply `sel` to one row.
///
/// Returns `(keep, error)`: whether the row passed the WHERE gate,
/// plus any error surfaced along the way. A row can be kept *and*
/// carry an error — a WHERE clause that evaluates to an error value
/// keeps the row and reports the error.
pub fn eval_select(
    sel: &SqlSelect,
    read: &dyn ReadContext,
    write: &mut dyn WriteContext,
) -> (bool, Option<SqlError>) {
    if let Some(where_expr) = &sel.where_clause {
        let (value, resolved) = match ExpressionEvaluator::evaluate_resolved(Some(read), where_expr)
        {
            Ok(outcome) => outcome,
            Err(err) => return (false, Some(err)),
        };
        if !resolved {
            // unknown predicate keeps the row
            return (true, None);
        }
        match value {
            Value::Bool(false) => return (false, None),
            Value::Bool(true) => {}
            Value::Null => return (true, None),
            Value::Error(msg) => return (true, Some(SqlError::execution_error(msg, None))),
            other => {
                if other.is_null() {
                    return (false, None);
                }
            }
        }
    }

    for col in &sel.columns {
        if let Some(guard) = &col.guard {
            match ExpressionEvaluator::evaluate_resolved(Some(read), guard) {
                Err(err) => {
                    log::warn!("could not evaluate guard for {}: {}", col.as_name, err);
                    continue;
                }
                Ok((_, false)) => continue,
                Ok((value, true)) => match value {
                    Value::Bool(false) | Value::Null | Value::Error(_) => continue,
                    Value::Bool(true) => {}
                    other => {
                        if other.is_null() {
                            continue;
                        }
                    }
                },
            }
        }

        let (value, resolved) = match ExpressionEvaluator::evaluate_resolved(Some(read), &col.expr)
        {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("could not evaluate column {}: {}", col.as_name, err);
                return (false, Some(err));
            }
        };
        // undefined results (missing identity, function reporting
        // undefined) omit the column rather than writing NULL
        if !resolved {
            continue;
        }
        if let Err(err) = write.put(col, read, value) {
            return (false, Some(err));
        }
    }

    (true, None)
}
