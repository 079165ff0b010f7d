//! Error types for dr-sql

use thiserror::Error;

/// SQL parsing and analysis errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// SQL parse error
    #[error("SQL parse error at line {line}, column {column}: {message}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Empty SQL
    #[error("SQL is empty")]
    EmptySql,

    /// Unsupported SQL statement
    #[error("Unsupported SQL statement: {0}")]
    UnsupportedStatement(String),

    /// A FROM clause referenced a table not present in the catalog passed
    /// to the lowering step.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// A construct `lower_statement` has no translation for (a SQL
    /// feature sqlparser can parse that docrelay's logical tree has no
    /// node for, e.g. subqueries or window functions).
    #[error("unsupported SQL construct: {0}")]
    UnsupportedExpr(String),
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
