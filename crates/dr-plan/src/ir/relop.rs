//! Logical relational operator tree (§6.3), grounded on the teacher's
//! `RelOp` tagged variant — trimmed to the exact six operators plus Join
//! named in §6.3 (no `SetOp`: the write path and set operations are out
//! of scope, §1).

use dr_core::TableId;
use serde::{Deserialize, Serialize};

use super::expr::Expr;

/// Join kind (§6.3: `kind ∈ {inner, left}`). Only these two are ever
/// accepted by `OperatorTranslator`; anything else is a parser-level
/// concern outside the core's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER"),
            JoinKind::Left => write!(f, "LEFT"),
        }
    }
}

/// One `ORDER BY` key. Null placement is not stored here: §4.5 fixes it
/// to the SQL default (nulls last ascending, first descending) rather
/// than making it a per-key choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortKey {
    pub expr: Expr,
    pub ascending: bool,
}

/// A node of the logical plan tree consumed by `PlanCompiler` (§6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RelOp {
    /// Scan of one virtual table, already resolved to a `table_id` by
    /// whatever built this tree (dr-sql, or a test fixture) against a
    /// concrete `Schema`.
    Scan { table_id: TableId },

    Filter { input: Box<RelOp>, predicate: Expr },

    /// `(output_name, expr)` pairs, in output order.
    Project {
        input: Box<RelOp>,
        exprs: Vec<(String, Expr)>,
    },

    /// `aggs` are `(output_name, Expr::Call{operator: "sum"|"avg"|"min"|
    /// "max"|"count", ..})` pairs; `group_keys` are plain column/scalar
    /// expressions.
    Aggregate {
        input: Box<RelOp>,
        group_keys: Vec<Expr>,
        aggs: Vec<(String, Expr)>,
    },

    Sort {
        input: Box<RelOp>,
        keys: Vec<SortKey>,
    },

    /// Offset without limit (`n: None`) emits only the `$skip` stage
    /// (§4.5).
    Limit {
        input: Box<RelOp>,
        n: Option<u64>,
        offset: Option<u64>,
    },

    Join {
        left: Box<RelOp>,
        right: Box<RelOp>,
        kind: JoinKind,
        condition: Expr,
    },
}

impl RelOp {
    /// Best-effort label for diagnostics: the scanned table, or `None`
    /// for compound operators with no single source.
    pub fn scanned_table(&self) -> Option<TableId> {
        match self {
            RelOp::Scan { table_id } => Some(*table_id),
            _ => None,
        }
    }
}
