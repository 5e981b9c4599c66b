use std::fmt;

/// Errors that can occur during expression and query evaluation.
///
/// Only *structural* failures are reported here: unknown node kinds,
/// unknown operators, bad function calls. Row-local data failures
/// (type mismatches, bad LIKE patterns) travel as
/// [`Value::Error`](super::execution::types::Value::Error) values and
/// never abort evaluation.
#[derive(Debug, Clone)]
pub enum SqlError {
    /// Errors passed through from the external SQL/expression parser
    ParseError {
        message: String,
        position: Option<usize>,
    },

    /// An AST node kind the evaluator does not understand
    UnknownNode { node: String },

    /// An operator applied in a position where it has no meaning
    UnsupportedOperator { operator: String, context: String },

    /// Type conversion errors
    TypeError {
        expected: String,
        actual: String,
        value: Option<String>,
    },

    /// Evaluation errors: bad function calls, recovered panics
    ExecutionError {
        message: String,
        query: Option<String>,
    },
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlError::ParseError { message, position } => {
                if let Some(pos) = position {
                    write!(f, "SQL parse error at position {}: {}", pos, message)
                } else {
                    write!(f, "SQL parse error: {}", message)
                }
            }
            SqlError::UnknownNode { node } => write!(f, "unknown node type: {}", node),
            SqlError::UnsupportedOperator { operator, context } => {
                write!(f, "unsupported operator {} for {}", operator, context)
            }
            SqlError::TypeError {
                expected,
                actual,
                value,
            } => {
                if let Some(val) = value {
                    write!(
                        f,
                        "type error: expected {}, got {} for value '{}'",
                        expected, actual, val
                    )
                } else {
                    write!(f, "type error: expected {}, got {}", expected, actual)
                }
            }
            SqlError::ExecutionError { message, query } => {
                if let Some(q) = query {
                    write!(f, "execution error in '{}': {}", q, message)
                } else {
                    write!(f, "execution error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for SqlError {}

impl SqlError {
    /// Create a parse error with optional position
    pub fn parse_error(message: impl Into<String>, position: Option<usize>) -> Self {
        SqlError::ParseError {
            message: message.into(),
            position,
        }
    }

    /// Create an unknown-node error
    pub fn unknown_node(node: impl Into<String>) -> Self {
        SqlError::UnknownNode { node: node.into() }
    }

    /// Create an unsupported-operator error
    pub fn unsupported_operator(
        operator: impl fmt::Display,
        context: impl Into<String>,
    ) -> Self {
        SqlError::UnsupportedOperator {
            operator: operator.to_string(),
            context: context.into(),
        }
    }

    /// Create a type error
    pub fn type_error(
        expected: impl Into<String>,
        actual: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        SqlError::TypeError {
            expected: expected.into(),
            actual: actual.into(),
            value,
        }
    }

    /// Create an execution error
    pub fn execution_error(message: impl Into<String>, query: Option<String>) -> Self {
        SqlError::ExecutionError {
            message: message.into(),
            query,
        }
    }
}

/// Result type for SQL operations
pub type SqlResult<T> = Result<T, SqlError>;
