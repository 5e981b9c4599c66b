//! Builtin scalar functions.
//!
//! Each function reports `(value, defined)`: when `defined` is false
//! the result is undefined for these inputs and the caller omits the
//! column (projection) or reads it as false (predicate).

use crate::omniquery::sql::error::SqlError;
use crate::omniquery::sql::execution::context::ReadContext;
use crate::omniquery::sql::execution::types::Value;

/// Builtin scalar function implementations.
pub struct BuiltinScalars;

impl BuiltinScalars {
    /// count(v) — 1 when the value is present, undefined otherwise.
    pub fn count(
        _ctx: Option<&dyn ReadContext>,
        args: &[Value],
    ) -> Result<(Value, bool), SqlError> {
        let val = &args[0];
        if val.is_error() || val.is_null() {
            return Ok((Value::Int(0), false));
        }
        Ok((Value::Int(1), true))
    }

    /// sqrt(v) — square root; NaN and undefined for non-numeric input.
    pub fn sqrt(
        _ctx: Option<&dyn ReadContext>,
        args: &[Value],
    ) -> Result<(Value, bool), SqlError> {
        let val = &args[0];
        if !val.is_numeric() {
            return Ok((Value::Number(f64::NAN), false));
        }
        if val.is_error() || val.is_null() {
            return Ok((Value::Number(0.0), false));
        }
        let fv = val.as_f64().unwrap_or(f64::NAN);
        Ok((Value::Number(fv.sqrt()), true))
    }

    /// pow(v, p) — v raised to p; undefined on nil or NaN input.
    pub fn pow(
        _ctx: Option<&dyn ReadContext>,
        args: &[Value],
    ) -> Result<(Value, bool), SqlError> {
        let (val, to_power) = (&args[0], &args[1]);
        if val.is_error() || val.is_null() {
            return Ok((Value::Number(0.0), false));
        }
        if to_power.is_error() || to_power.is_null() {
            return Ok((Value::Number(0.0), false));
        }
        let fv = val.as_f64().unwrap_or(f64::NAN);
        let pow = to_power.as_f64().unwrap_or(f64::NAN);
        if fv.is_nan() || pow.is_nan() {
            return Ok((Value::Number(0.0), false));
        }
        Ok((Value::Number(fv.powf(pow)), true))
    }
}

crate::register_scalar_function!(name: "count", arity: Some(1), handler: BuiltinScalars::count);
crate::register_scalar_function!(name: "sqrt", arity: Some(1), handler: BuiltinScalars::sqrt);
crate::register_scalar_function!(name: "pow", arity: Some(2), handler: BuiltinScalars::pow);
