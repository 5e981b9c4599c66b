//! AST shapes consumed by the evaluator.
//!
//! The parser is external; this module defines only the node contract
//! the engine walks. Nodes form a tagged variant ([`Expr`]) matched in
//! a single dispatch site, each carrying its operator token.

use super::execution::context::SchemaInfo;
use super::execution::expression::function_metadata::FunctionDescriptor;
use super::execution::types::Value;
use std::fmt;

/// Operator tokens attached to unary/binary/tri/multi nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,

    // Comparison
    Equal,
    EqualEqual,
    NotEqual,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
    Negate,

    // Multi-operand
    Between,
    In,
    Like,
    Exists,
}

impl Operator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::EqualEqual
                | Operator::NotEqual
                | Operator::Lt
                | Operator::Le
                | Operator::Gt
                | Operator::Ge
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulus => "%",
            Operator::Equal => "=",
            Operator::EqualEqual => "==",
            Operator::NotEqual => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Negate => "!",
            Operator::Between => "BETWEEN",
            Operator::In => "IN",
            Operator::Like => "LIKE",
            Operator::Exists => "EXISTS",
        };
        f.write_str(s)
    }
}

/// Numeric literal. The parser sets exactly one of `is_int`/`is_float`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberNode {
    pub is_int: bool,
    pub int64: i64,
    pub is_float: bool,
    pub float64: f64,
    pub text: String,
}

impl NumberNode {
    pub fn int(v: i64) -> Self {
        Self {
            is_int: true,
            int64: v,
            is_float: false,
            float64: 0.0,
            text: v.to_string(),
        }
    }

    pub fn float(v: f64) -> Self {
        Self {
            is_int: false,
            int64: 0,
            is_float: true,
            float64: v,
            text: v.to_string(),
        }
    }
}

/// String literal.
#[derive(Debug, Clone, PartialEq)]
pub struct StringNode {
    pub text: String,
}

/// Identifier: a column reference, or the literal tokens `true`/`false`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityNode {
    pub text: String,
}

impl IdentityNode {
    /// Is this identifier actually a boolean literal token?
    pub fn is_boolean_identity(&self) -> bool {
        self.text.eq_ignore_ascii_case("true") || self.text.eq_ignore_ascii_case("false")
    }

    /// The boolean value of a boolean identity token.
    pub fn as_bool(&self) -> bool {
        self.text.eq_ignore_ascii_case("true")
    }
}

/// Unary operation: `!x`, `-x`, `EXISTS x`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryNode {
    pub operator: Operator,
    pub arg: Box<Expr>,
}

/// Binary operation over two operands.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryNode {
    pub operator: Operator,
    pub args: Box<[Expr; 2]>,
}

/// Ternary operation: `a BETWEEN b AND c`.
#[derive(Debug, Clone, PartialEq)]
pub struct TriNode {
    pub operator: Operator,
    pub args: Box<[Expr; 3]>,
}

/// Variadic operation: `a IN (b, c, d)` or `a IN ident`.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiArgNode {
    pub operator: Operator,
    pub args: Vec<Expr>,
}

/// Function call. The descriptor is resolved at bind time when the
/// parser consulted the registry; otherwise the evaluator looks the
/// name up in the global registry at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncNode {
    pub name: String,
    pub args: Vec<Expr>,
    pub descriptor: Option<FunctionDescriptor>,
}

/// Pre-computed literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    pub value: Value,
}

/// Expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(NumberNode),
    String(StringNode),
    Identity(IdentityNode),
    Unary(UnaryNode),
    Binary(BinaryNode),
    Tri(TriNode),
    Multi(MultiArgNode),
    Func(FuncNode),
    Value(ValueNode),
}

impl Expr {
    pub fn int(v: i64) -> Self {
        Expr::Number(NumberNode::int(v))
    }

    pub fn float(v: f64) -> Self {
        Expr::Number(NumberNode::float(v))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Expr::String(StringNode { text: text.into() })
    }

    pub fn ident(text: impl Into<String>) -> Self {
        Expr::Identity(IdentityNode { text: text.into() })
    }

    pub fn literal(value: Value) -> Self {
        Expr::Value(ValueNode { value })
    }

    pub fn unary(operator: Operator, arg: Expr) -> Self {
        Expr::Unary(UnaryNode {
            operator,
            arg: Box::new(arg),
        })
    }

    pub fn binary(operator: Operator, left: Expr, right: Expr) -> Self {
        Expr::Binary(BinaryNode {
            operator,
            args: Box::new([left, right]),
        })
    }

    pub fn tri(operator: Operator, a: Expr, b: Expr, c: Expr) -> Self {
        Expr::Tri(TriNode {
            operator,
            args: Box::new([a, b, c]),
        })
    }

    pub fn multi(operator: Operator, args: Vec<Expr>) -> Self {
        Expr::Multi(MultiArgNode { operator, args })
    }

    pub fn func(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Func(FuncNode {
            name: name.into(),
            args,
            descriptor: None,
        })
    }

    /// Node kind name for diagnostics.
    pub fn node_name(&self) -> &'static str {
        match self {
            Expr::Number(_) => "number",
            Expr::String(_) => "string",
            Expr::Identity(_) => "identity",
            Expr::Unary(_) => "unary",
            Expr::Binary(_) => "binary",
            Expr::Tri(_) => "tri",
            Expr::Multi(_) => "multi",
            Expr::Func(_) => "func",
            Expr::Value(_) => "value",
        }
    }
}

/// One projected column of a SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Output name (the AS alias, or the source expression text)
    pub as_name: String,
    /// Expression producing the column value
    pub expr: Expr,
    /// Optional guard predicate; false omits the column from output
    pub guard: Option<Expr>,
}

impl Column {
    pub fn new(as_name: impl Into<String>, expr: Expr) -> Self {
        Self {
            as_name: as_name.into(),
            expr,
            guard: None,
        }
    }

    pub fn with_guard(mut self, guard: Expr) -> Self {
        self.guard = Some(guard);
        self
    }
}

impl SchemaInfo for Column {
    fn key(&self) -> &str {
        &self.as_name
    }
}

/// Parsed SELECT statement, reduced to the shape the row evaluator
/// consumes: projected columns plus an optional WHERE predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlSelect {
    pub columns: Vec<Column>,
    pub where_clause: Option<Expr>,
}

impl SqlSelect {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            where_clause: None,
        }
    }

    pub fn with_where(mut self, where_clause: Expr) -> Self {
        self.where_clause = Some(where_clause);
        self
    }
}
