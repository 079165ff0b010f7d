//! Execution-time error kinds (§7), distinct from `dr_plan::CompileError`
//! (a fatal, compile-time error type). Only `DataTypeConflict` is ever
//! non-fatal: row-level, recorded as a warning on the cursor, execution
//! continues.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    /// The document-client reported a transport failure (§7 `Transport`).
    #[error("document client transport error: {0}")]
    Transport(#[from] dr_doc::DocClientError),

    /// Cooperative cancellation observed at a suspension point.
    #[error("query cancelled")]
    Cancelled,

    /// The query exceeded its wall-clock budget.
    #[error("query timed out")]
    Timeout,
}

pub type ExecResult<T> = Result<T, ExecError>;

/// A non-fatal, row-level coercion failure (§7 `DataTypeConflict`): the
/// offending row is dropped from its batch and this is recorded as a
/// warning on the `Cursor`, not returned as an `Err`.
#[derive(Debug, Clone)]
pub struct RowWarning {
    pub column: String,
    pub message: String,
}

impl std::fmt::Display for RowWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "column '{}': {}", self.column, self.message)
    }
}
