//! Compile-time error type (§7), ported from the teacher's
//! `AnalysisError`'s numbered-variant `thiserror` shape.

use dr_core::TableId;
use thiserror::Error;

/// Errors `PlanCompiler`/`OperatorTranslator`/`ExpressionTranslator` can
/// raise. Compilation is all-or-nothing (§4.6): any one of these aborts
/// the whole compile, never a partial pipeline.
#[derive(Error, Debug)]
pub enum CompileError {
    /// SQL refers to an unknown table/column, or aggregates a
    /// non-grouped column (§7 `InvalidQuery`).
    #[error("[P001] invalid query: {message}")]
    InvalidQuery { message: String },

    /// `table_id` not present in the `Schema` passed to `compile`.
    #[error("[P002] unknown table {table_id}")]
    UnknownTable { table_id: TableId },

    /// A `ColumnRef` that doesn't resolve against the current
    /// `visible_columns`.
    #[error("[P003] unknown column '{name}'")]
    UnknownColumn { name: String },

    /// An operator/function/CAST target this translator does not know
    /// (§7 `Unsupported`), named so the caller can report exactly what
    /// construct failed.
    #[error("[P004] unsupported construct: {construct}")]
    Unsupported { construct: String },

    /// Cross-collection join, or a join condition that isn't an equality
    /// over matching foreign-key/primary-key (and array-index) columns
    /// (§4.5 `UNSUPPORTED_JOIN_TYPE`).
    #[error("[P005] unsupported join: {reason}")]
    UnsupportedJoin { reason: String },

    /// TIMESTAMPADD/TIMESTAMPDIFF for a unit the engine cannot express as
    /// a millisecond arithmetic op (§4.4 `UNSUPPORTED_CONVERSION`: YEAR/
    /// MONTH/QUARTER for TIMESTAMPADD).
    #[error("[P006] unsupported conversion: {message}")]
    UnsupportedConversion { message: String },

    #[error("[P007] core error: {0}")]
    Core(#[from] dr_core::CoreError),
}

pub type CompileResult<T> = Result<T, CompileError>;
