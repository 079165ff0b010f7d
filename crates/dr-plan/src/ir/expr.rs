//! Logical expression tree (§6.3): "a tagged variant over Literal,
//! ColumnRef, Call{operator, args[]}". Ported from the teacher's
//! `TypedExpr`, collapsing `BinaryOp`/`UnaryOp`/`FunctionCall`/`Cast`/
//! `Case`/`IsNull` into the single `Call` shape §9 calls for ("no dynamic
//! dispatch is needed"): every non-trivial node is an operator name plus
//! argument list, resolved against a schema only at compile time
//! (dr-plan's `ExpressionTranslator`), not baked into the tree itself.

use serde::{Deserialize, Serialize};

/// A literal value carried directly in the logical tree. Distinct from
/// `dr_core::DocValue`: this is a SQL-literal shape produced by the
/// boundary parser (dr-sql), before any document-engine representation is
/// chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int64(i64),
    Double(f64),
    String(String),
}

/// A node of the logical expression tree (§6.3).
///
/// `Call`'s `operator` is one of a fixed vocabulary understood by
/// `ExpressionTranslator` (§4.4): `"+" "-" "*" "/" "mod"`, `"="  "<>" "<"
/// "<=" ">" ">="`, `"and" "or" "not"`, `"is_null" "is_not_null"`, `"case"`
/// (args alternate condition/result, an odd trailing arg is ELSE),
/// `"cast"` (args: `[expr, Literal::String(target_type_name)]`),
/// `"substring"` (args: `[expr, start, length?]`, 1-indexed per SQL),
/// `"concat"`, `"timestampadd"`/`"timestampdiff"` (args:
/// `[Literal::String(unit), amount_or_lhs, rhs]`), `"floor_to"` (args:
/// `[expr, Literal::String(unit)]`), `"extract_quarter"`, `"dayname"`,
/// `"monthname"`, and the aggregate names `"sum" "avg" "min" "max"
/// "count"` (used only inside `RelOp::Aggregate`'s `aggs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),

    /// Reference to a column visible at this point in the plan. `table`
    /// disambiguates a join's two sides; absent for an unqualified
    /// reference.
    ColumnRef { table: Option<String>, name: String },

    Call { operator: String, args: Vec<Expr> },
}

impl Expr {
    pub fn call(operator: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            operator: operator.into(),
            args,
        }
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expr::ColumnRef {
            table: None,
            name: name.into(),
        }
    }

    /// True for `Call{operator: "count", args: []}` — `COUNT(*)`, the one
    /// aggregate call with no operand.
    pub fn is_count_star(&self) -> bool {
        matches!(self, Expr::Call { operator, args } if operator == "count" && args.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_star_is_a_zero_arg_count_call() {
        let e = Expr::call("count", vec![]);
        assert!(e.is_count_star());
        let not_star = Expr::call("count", vec![Expr::column("field")]);
        assert!(!not_star.is_count_star());
    }
}
