//! Tree-walking expression evaluator.
//!
//! A single dispatch on node kind routes to a walker per node type;
//! walkers recurse through [`ExpressionEvaluator::evaluate_resolved`].
//! Binary operators dispatch over the (kind, kind) pair of their
//! operands.
//!
//! Operand evaluation is eager, left to right; `AND`/`OR` do not
//! short-circuit here. Callers needing short-circuit guards wrap the
//! predicate layer instead.
//!
//! Two failure channels exist: data failures (type mismatch, bad LIKE
//! pattern) become [`Value::Error`] values that filter the row
//! through, while structural failures (unknown operator for a kind,
//! bad function call) return [`SqlError`] and stop processing.

use super::function_metadata::FunctionRegistry;
use crate::omniquery::sql::ast::{
    BinaryNode, Expr, FuncNode, IdentityNode, MultiArgNode, NumberNode, Operator, TriNode,
    UnaryNode,
};
use crate::omniquery::sql::error::SqlError;
use crate::omniquery::sql::execution::context::{NoSchema, ReadContext, WriteContext};
use crate::omniquery::sql::execution::types::{parse_bool_str, values_equal, Value};
use regex::Regex;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A value plus whether every identity it depends on resolved.
///
/// The flag is how the row evaluator distinguishes a predicate that
/// *computed* false from one that could not be fully evaluated: an
/// unresolved predicate keeps the row (three-valued logic).
pub type Resolved = (Value, bool);

/// A precompiled expression: the node-kind dispatch has already
/// happened, so the closure can be applied to many rows.
pub type CompiledExpr = Box<dyn Fn(Option<&dyn ReadContext>) -> Result<Value, SqlError> + Send + Sync>;

/// The expression evaluator.
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    /// Evaluate an expression against an optional row context.
    ///
    /// With no context, identifiers fold to their own text, which lets
    /// constant expressions evaluate at bind time.
    pub fn evaluate(ctx: Option<&dyn ReadContext>, expr: &Expr) -> Result<Value, SqlError> {
        Self::evaluate_resolved(ctx, expr).map(|(value, _)| value)
    }

    /// Evaluate an expression, reporting whether it fully resolved.
    pub fn evaluate_resolved(
        ctx: Option<&dyn ReadContext>,
        expr: &Expr,
    ) -> Result<Resolved, SqlError> {
        match expr {
            Expr::Number(n) => number_node_value(n),
            Expr::String(s) => Ok((Value::String(s.text.clone()), true)),
            Expr::Identity(id) => walk_identity(ctx, id),
            Expr::Unary(u) => walk_unary(ctx, u),
            Expr::Binary(b) => walk_binary(ctx, b),
            Expr::Tri(t) => walk_tri(ctx, t),
            Expr::Multi(m) => walk_multi(ctx, m),
            Expr::Func(f) => walk_func(ctx, f),
            Expr::Value(v) => Ok((v.value.clone(), true)),
        }
    }

    /// Precompile an expression into a closure applied per row.
    pub fn compile(expr: &Expr) -> CompiledExpr {
        match expr {
            Expr::Number(n) => {
                let n = n.clone();
                Box::new(move |_ctx| number_node_value(&n).map(|(v, _)| v))
            }
            Expr::String(s) => {
                let text = s.text.clone();
                Box::new(move |_ctx| Ok(Value::String(text.clone())))
            }
            Expr::Identity(id) => {
                let id = id.clone();
                Box::new(move |ctx: Option<&dyn ReadContext>| {
                    walk_identity(ctx, &id).map(|(v, _)| v)
                })
            }
            Expr::Unary(u) => {
                let u = u.clone();
                Box::new(move |ctx: Option<&dyn ReadContext>| walk_unary(ctx, &u).map(|(v, _)| v))
            }
            Expr::Binary(b) => {
                let b = b.clone();
                Box::new(move |ctx: Option<&dyn ReadContext>| walk_binary(ctx, &b).map(|(v, _)| v))
            }
            Expr::Tri(t) => {
                let t = t.clone();
                Box::new(move |ctx: Option<&dyn ReadContext>| walk_tri(ctx, &t).map(|(v, _)| v))
            }
            Expr::Multi(m) => {
                let m = m.clone();
                Box::new(move |ctx: Option<&dyn ReadContext>| walk_multi(ctx, &m).map(|(v, _)| v))
            }
            Expr::Func(f) => {
                let f = f.clone();
                Box::new(move |ctx: Option<&dyn ReadContext>| walk_func(ctx, &f).map(|(v, _)| v))
            }
            Expr::Value(v) => {
                let value = v.value.clone();
                Box::new(move |_ctx| Ok(value.clone()))
            }
        }
    }
}

/// A VM for a single expression tree.
///
/// [`ExprVm::execute`] is the panic-recovery boundary: a panicking
/// host function becomes an execution error instead of unwinding into
/// the caller.
pub struct ExprVm {
    expr: Expr,
}

impl ExprVm {
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Apply the expression to a row and write the result.
    ///
    /// A top-level [`Value::Error`] result is surfaced as an error.
    pub fn execute(
        &self,
        write: &mut dyn WriteContext,
        read: &dyn ReadContext,
    ) -> Result<(), SqlError> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            ExpressionEvaluator::evaluate(Some(read), &self.expr)
        }));
        let value = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                return Err(SqlError::execution_error(
                    format!("panic during evaluation: {}", panic_message(payload.as_ref())),
                    None,
                ))
            }
        };
        if let Value::Error(msg) = &value {
            return Err(SqlError::execution_error(msg.clone(), None));
        }
        write.put(&NoSchema, read, value)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn number_node_value(node: &NumberNode) -> Result<Resolved, SqlError> {
    if node.is_int {
        Ok((Value::Int(node.int64), true))
    } else if node.is_float {
        Ok((Value::Number(node.float64), true))
    } else {
        log::warn!("no numeric conversion for {:?}", node.text);
        Ok((Value::Null, true))
    }
}

fn walk_identity(ctx: Option<&dyn ReadContext>, node: &IdentityNode) -> Result<Resolved, SqlError> {
    if node.is_boolean_identity() {
        return Ok((Value::Bool(node.as_bool()), true));
    }
    match ctx {
        None => Ok((Value::String(node.text.clone()), true)),
        Some(reader) => match reader.get(&node.text) {
            Some(value) => Ok((value, true)),
            None => Ok((Value::Null, false)),
        },
    }
}

fn walk_unary(ctx: Option<&dyn ReadContext>, node: &UnaryNode) -> Result<Resolved, SqlError> {
    let (value, resolved) = ExpressionEvaluator::evaluate_resolved(ctx, &node.arg)?;
    if !resolved {
        if node.operator == Operator::Exists {
            return Ok((Value::Bool(false), true));
        }
        log::debug!("unary {} arg did not resolve", node.operator);
        return Ok((value, false));
    }
    match node.operator {
        Operator::Negate => match value {
            Value::Bool(b) => Ok((Value::Bool(!b), true)),
            other => Err(SqlError::type_error(
                "BOOLEAN",
                other.type_name(),
                Some(other.to_string()),
            )),
        },
        Operator::Minus => {
            if value.is_numeric() {
                let f = value.as_f64().unwrap_or(f64::NAN);
                Ok((Value::Number(-f), true))
            } else {
                Ok((Value::Null, false))
            }
        }
        Operator::Exists => Ok((Value::Bool(!value.is_null()), true)),
        op => Err(SqlError::unsupported_operator(op, "unary expression")),
    }
}

fn walk_binary(ctx: Option<&dyn ReadContext>, node: &BinaryNode) -> Result<Resolved, SqlError> {
    let (a, aok) = ExpressionEvaluator::evaluate_resolved(ctx, &node.args[0])?;
    let (b, bok) = ExpressionEvaluator::evaluate_resolved(ctx, &node.args[1])?;
    let resolved = aok && bok;
    let op = node.operator;

    let value = match (&a, &b) {
        (Value::Null, other) => null_binary(op, other),
        (other, Value::Null) => null_binary(op, other),
        (Value::Int(x), Value::Int(y)) => operate_ints(op, *x, *y)?,
        (Value::Int(x), Value::Number(y)) => operate_numbers(op, *x as f64, *y)?,
        (Value::Number(x), Value::Int(y)) => operate_numbers(op, *x, *y as f64)?,
        (Value::Number(x), Value::Number(y)) => operate_numbers(op, *x, *y)?,
        (Value::Int(x), Value::String(s)) => match parse_numeric(s) {
            Some(y) => operate_numbers(op, *x as f64, y)?,
            None => type_mismatch(op, &a, &b),
        },
        (Value::Number(x), Value::String(s)) => match parse_numeric(s) {
            Some(y) => operate_numbers(op, *x, y)?,
            None => type_mismatch(op, &a, &b),
        },
        (Value::String(s), Value::Int(y)) => match parse_numeric(s) {
            Some(x) => operate_numbers(op, x, *y as f64)?,
            None => type_mismatch(op, &a, &b),
        },
        (Value::String(s), Value::Number(y)) => match parse_numeric(s) {
            Some(x) => operate_numbers(op, x, *y)?,
            None => type_mismatch(op, &a, &b),
        },
        (Value::String(x), Value::String(y)) => operate_strings(op, x, y),
        (Value::Bool(x), Value::Bool(y)) => bool_binary(op, *x, *y)?,
        (Value::Bool(x), Value::String(s)) => bool_strcompare(op, *x, s)?,
        (Value::String(s), Value::Bool(y)) => bool_strcompare(op, *y, s)?,
        _ => {
            log::debug!(
                "no binary dispatch for {} {} {}",
                a.type_name(),
                op,
                b.type_name()
            );
            type_mismatch(op, &a, &b)
        }
    };
    Ok((value, resolved))
}

fn parse_numeric(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn type_mismatch(op: Operator, a: &Value, b: &Value) -> Value {
    Value::error(format!(
        "unsupported operand types for {}: {} and {}",
        op,
        a.type_name(),
        b.type_name()
    ))
}

/// Binary semantics when one operand is NULL. `other` is the non-null
/// side (or NULL itself when both are).
fn null_binary(op: Operator, other: &Value) -> Value {
    match op {
        Operator::And => Value::Bool(false),
        Operator::Or => match other {
            Value::Bool(b) => Value::Bool(*b),
            _ => Value::Bool(false),
        },
        Operator::Equal | Operator::EqualEqual => Value::Bool(other.is_null()),
        Operator::NotEqual => Value::Bool(!other.is_null()),
        // Ordering against NULL has no answer; the row filters out
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => Value::Null,
        _ => Value::Null,
    }
}

fn operate_ints(op: Operator, a: i64, b: i64) -> Result<Value, SqlError> {
    match op {
        Operator::Plus => Ok(Value::Int(a.wrapping_add(b))),
        Operator::Multiply => Ok(Value::Int(a.wrapping_mul(b))),
        Operator::Minus => Ok(Value::Int(a.wrapping_sub(b))),
        Operator::Divide => {
            if b == 0 {
                Ok(Value::error("integer division by zero"))
            } else {
                Ok(Value::Int(a.wrapping_div(b)))
            }
        }
        Operator::Modulus => {
            if b == 0 {
                Ok(Value::error("integer modulus by zero"))
            } else {
                Ok(Value::Int(a.wrapping_rem(b)))
            }
        }
        Operator::Equal | Operator::EqualEqual => Ok(Value::Bool(a == b)),
        Operator::NotEqual => Ok(Value::Bool(a != b)),
        Operator::Gt => Ok(Value::Bool(a > b)),
        Operator::Lt => Ok(Value::Bool(a < b)),
        Operator::Ge => Ok(Value::Bool(a >= b)),
        Operator::Le => Ok(Value::Bool(a <= b)),
        Operator::Or => Ok(Value::Bool(a != 0 || b != 0)),
        Operator::And => Ok(Value::Bool(a != 0 && b != 0)),
        other => Err(SqlError::unsupported_operator(other, "integer operands")),
    }
}

fn operate_numbers(op: Operator, a: f64, b: f64) -> Result<Value, SqlError> {
    if matches!(
        op,
        Operator::Plus | Operator::Multiply | Operator::Minus | Operator::Divide | Operator::Modulus
    ) && (a.is_nan() || b.is_nan())
    {
        return Ok(Value::Number(f64::NAN));
    }

    match op {
        Operator::Plus => Ok(Value::Number(a + b)),
        Operator::Multiply => Ok(Value::Number(a * b)),
        Operator::Minus => Ok(Value::Number(a - b)),
        Operator::Divide => Ok(Value::Number(a / b)),
        Operator::Modulus => {
            // modulus on floats works through their integer parts
            let divisor = b as i64;
            if divisor == 0 {
                Ok(Value::error("modulus by zero"))
            } else {
                Ok(Value::Number((a as i64).wrapping_rem(divisor) as f64))
            }
        }
        Operator::Equal | Operator::EqualEqual => Ok(Value::Bool(a == b)),
        Operator::NotEqual => Ok(Value::Bool(a != b)),
        Operator::Gt => Ok(Value::Bool(a > b)),
        Operator::Lt => Ok(Value::Bool(a < b)),
        Operator::Ge => Ok(Value::Bool(a >= b)),
        Operator::Le => Ok(Value::Bool(a <= b)),
        Operator::Or => Ok(Value::Bool(a != 0.0 || b != 0.0)),
        Operator::And => Ok(Value::Bool(a != 0.0 && b != 0.0)),
        other => Err(SqlError::unsupported_operator(other, "numeric operands")),
    }
}

fn operate_strings(op: Operator, a: &str, b: &str) -> Value {
    match op {
        Operator::Equal | Operator::EqualEqual => Value::Bool(a == b),
        Operator::NotEqual => Value::Bool(a != b),
        // a(value) LIKE b(pattern)
        Operator::Like => like_match(a, b),
        other => Value::error(format!("unsupported operator for strings: {}", other)),
    }
}

fn bool_binary(op: Operator, a: bool, b: bool) -> Result<Value, SqlError> {
    match op {
        Operator::And => Ok(Value::Bool(a && b)),
        Operator::Or => Ok(Value::Bool(a || b)),
        Operator::Equal | Operator::EqualEqual => Ok(Value::Bool(a == b)),
        Operator::NotEqual => Ok(Value::Bool(a != b)),
        other => Err(SqlError::unsupported_operator(other, "boolean operands")),
    }
}

fn bool_strcompare(op: Operator, a: bool, s: &str) -> Result<Value, SqlError> {
    match parse_bool_str(s) {
        Some(sb) => match op {
            Operator::Equal | Operator::EqualEqual => Ok(Value::Bool(a == sb)),
            Operator::NotEqual => Ok(Value::Bool(a != sb)),
            other => Err(SqlError::unsupported_operator(
                other,
                "boolean and string operands",
            )),
        },
        None => Ok(Value::error(format!(
            "cannot compare boolean to non-boolean string {:?}",
            s
        ))),
    }
}

/// Glob match: `*` any run, `?` any char, `[...]`/`[!...]` classes.
fn like_match(text: &str, pattern: &str) -> Value {
    match Regex::new(&glob_to_regex(pattern)) {
        Ok(re) => Value::Bool(re.is_match(text)),
        Err(_) => Value::error(format!("invalid LIKE pattern: {:?}", pattern)),
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => {
                re.push('[');
                if chars.peek() == Some(&'!') {
                    chars.next();
                    re.push('^');
                }
                for cc in chars.by_ref() {
                    re.push(cc);
                    if cc == ']' {
                        break;
                    }
                }
            }
            c if ".+()|{}^$\\".contains(c) => {
                re.push('\\');
                re.push(c);
            }
            c => re.push(c),
        }
    }
    re.push('$');
    re
}

/// `a BETWEEN b AND c` — strict on both bounds.
fn walk_tri(ctx: Option<&dyn ReadContext>, node: &TriNode) -> Result<Resolved, SqlError> {
    let (a, aok) = ExpressionEvaluator::evaluate_resolved(ctx, &node.args[0])?;
    let (b, bok) = ExpressionEvaluator::evaluate_resolved(ctx, &node.args[1])?;
    let (c, cok) = ExpressionEvaluator::evaluate_resolved(ctx, &node.args[2])?;
    if !(aok && bok && cok) {
        log::debug!("could not evaluate BETWEEN operands");
        return Ok((Value::Bool(false), false));
    }
    match node.operator {
        Operator::Between => {
            if let (Value::Int(av), Value::Int(bv), Value::Int(cv)) = (&a, &b, &c) {
                return Ok((Value::Bool(av > bv && av < cv), true));
            }
            // mixed numeric kinds promote to floats
            if a.is_numeric() && b.is_numeric() && c.is_numeric() {
                let af = a.as_f64().unwrap_or(f64::NAN);
                let bf = b.as_f64().unwrap_or(f64::NAN);
                let cf = c.as_f64().unwrap_or(f64::NAN);
                return Ok((Value::Bool(af > bf && af < cf), true));
            }
            Ok((Value::Bool(false), true))
        }
        op => Err(SqlError::unsupported_operator(op, "ternary expression")),
    }
}

/// `a IN (x, y, z)` over literal args, or `a IN ident` over a slice.
fn walk_multi(ctx: Option<&dyn ReadContext>, node: &MultiArgNode) -> Result<Resolved, SqlError> {
    let (a, aok) = ExpressionEvaluator::evaluate_resolved(ctx, &node.args[0])?;
    if !aok {
        // missing data on the left side is expected, not an error
        return Ok((Value::Bool(false), false));
    }
    if node.operator != Operator::In {
        return Err(SqlError::unsupported_operator(
            node.operator,
            "multi-arg expression",
        ));
    }

    // `"literal" IN identity` — scan the resolved slice
    if node.args.len() == 2 {
        if let Expr::Identity(ident) = &node.args[1] {
            let (member, mok) = walk_identity(ctx, ident)?;
            if !mok {
                return Ok((Value::Bool(false), true));
            }
            return match member {
                Value::Slice(items) => {
                    let found = items.iter().any(|item| values_equal(item, &a));
                    Ok((Value::Bool(found), true))
                }
                Value::StringSlice(items) => {
                    let found = items
                        .iter()
                        .any(|s| values_equal(&Value::String(s.clone()), &a));
                    Ok((Value::Bool(found), true))
                }
                other => {
                    log::debug!("IN expected slice but received {}", other.type_name());
                    Ok((Value::Bool(false), false))
                }
            };
        }
    }

    for arg in &node.args[1..] {
        match ExpressionEvaluator::evaluate_resolved(ctx, arg) {
            Ok((v, true)) => {
                if values_equal(&a, &v) {
                    return Ok((Value::Bool(true), true));
                }
            }
            // arguments that fail to evaluate simply never match
            Ok((_, false)) | Err(_) => {}
        }
    }
    Ok((Value::Bool(false), true))
}

fn walk_func(ctx: Option<&dyn ReadContext>, node: &FuncNode) -> Result<Resolved, SqlError> {
    let descriptor = match &node.descriptor {
        Some(d) => d.clone(),
        None => FunctionRegistry::global().get(&node.name).ok_or_else(|| {
            SqlError::execution_error(format!("unknown function: {}", node.name), None)
        })?,
    };
    if let Some(expected) = descriptor.arity {
        if node.args.len() != expected {
            return Err(SqlError::execution_error(
                format!(
                    "function {} expects {} argument(s), got {}",
                    descriptor.name,
                    expected,
                    node.args.len()
                ),
                None,
            ));
        }
    }

    let mut argv = Vec::with_capacity(node.args.len());
    for arg in &node.args {
        let value = match arg {
            Expr::String(s) => Value::String(s.text.clone()),
            // nil arguments are valid; pass NULL for unresolved names
            Expr::Identity(id) => {
                let (v, ok) = walk_identity(ctx, id)?;
                if ok {
                    v
                } else {
                    Value::Null
                }
            }
            Expr::Number(n) => number_node_value(n)?.0,
            Expr::Func(f) => {
                let (v, ok) = walk_func(ctx, f)?;
                if ok {
                    v
                } else {
                    Value::Null
                }
            }
            Expr::Unary(u) => {
                let (v, ok) = walk_unary(ctx, u)?;
                if ok {
                    v
                } else {
                    Value::Null
                }
            }
            Expr::Binary(b) => walk_binary(ctx, b)?.0,
            Expr::Value(vn) => vn.value.clone(),
            other => ExpressionEvaluator::evaluate_resolved(ctx, other)?.0,
        };
        argv.push(value);
    }

    let (value, defined) = (descriptor.handler)(ctx, &argv)?;
    Ok((value, defined))
}
