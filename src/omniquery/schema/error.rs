//! Error types for schema and catalog operations.

/// Errors from virtual schema lookups and materialization.
#[derive(Debug)]
pub enum SchemaError {
    TableNotFound {
        table: String,
    },
    SourceNotFound {
        table: String,
    },
    Provider {
        source: String,
        message: String,
    },
    Config {
        message: String,
    },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::TableNotFound { table } => {
                write!(f, "could not find that table: {}", table)
            }
            SchemaError::SourceNotFound { table } => {
                write!(f, "could not find a source for table {:?}", table)
            }
            SchemaError::Provider { source, message } => {
                write!(f, "source {:?} error: {}", source, message)
            }
            SchemaError::Config { message } => write!(f, "schema config error: {}", message),
        }
    }
}

impl std::error::Error for SchemaError {}

impl SchemaError {
    pub fn table_not_found(table: impl Into<String>) -> Self {
        SchemaError::TableNotFound {
            table: table.into(),
        }
    }

    pub fn source_not_found(table: impl Into<String>) -> Self {
        SchemaError::SourceNotFound {
            table: table.into(),
        }
    }

    pub fn provider(source: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::Provider {
            source: source.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        SchemaError::Config {
            message: message.into(),
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
