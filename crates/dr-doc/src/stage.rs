//! Aggregation pipeline stage model (§1, Glossary "Pipeline"): the wire
//! format `OperatorTranslator`/`PathResolver` (dr-plan) emit into and that
//! a `DocumentClient` interprets. New relative to the teacher — the
//! teacher never talks to a pipeline-based engine — but kept in the same
//! "plain enum, `Serialize`/`Deserialize`, one `impl Display` for
//! debugging" texture as `ir::relop::JoinType`.

use dr_core::DocValue;
use serde::{Deserialize, Serialize};

/// A single aggregation-pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stage {
    /// `$match`: keep documents where `expr` evaluates truthy.
    Match { expr: AggExpr },

    /// `$project`: replace each document with the given field -> expr map,
    /// in order. A field can shadow an existing top-level field (used for
    /// the filter-flag bookkeeping of §4.5).
    Project { fields: Vec<(String, AggExpr)> },

    /// `$unwind`: flatten an array field into one document per element.
    Unwind {
        path: String,
        preserve_null_and_empty: bool,
        index_field: Option<String>,
    },

    /// `$group`: bucket by `key` expressions, computing `accumulators`.
    Group {
        key: Vec<(String, AggExpr)>,
        accumulators: Vec<(String, Accumulator)>,
    },

    /// `$sort`: order by the given fields.
    Sort { keys: Vec<SortSpec> },

    /// `$limit`
    Limit { n: u64 },

    /// `$skip`
    Skip { n: u64 },

    /// `$lookup`: part of the document engine's stage vocabulary (§1),
    /// but never emitted by `OperatorTranslator` — the only join shape it
    /// accepts (both sides sharing a root collection, §4.5) reduces to
    /// merged unwinds over shared data rather than a cross-collection
    /// lookup. Kept so the in-memory client's stage vocabulary matches
    /// the document engine's, not just what this translator happens to
    /// emit.
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        r#as: String,
    },
}

/// A sort key and direction, with SQL-default null placement (§4.5:
/// "Nulls sort last for ASC, first for DESC").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub ascending: bool,
}

/// Aggregation accumulator for `$group` (§4.5 table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Accumulator {
    Sum(AggExpr),
    Avg(AggExpr),
    Min(AggExpr),
    Max(AggExpr),
    /// `COUNT(*)`
    CountAll,
    /// `COUNT(col)` — omits rows where `col` is missing/null (§4.5).
    CountColumn(AggExpr),
}

/// The aggregation-stage form of a scalar expression — "works anywhere"
/// per §4.4. Deliberately a much smaller vocabulary than `dr_plan::Expr`:
/// this is the wire format a document engine evaluates, not the typed SQL
/// IR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AggExpr {
    Literal(DocValue),
    /// `$fieldName`-style field reference, dotted path already resolved.
    Field(String),
    /// Named operator application (`"eq"`, `"and"`, `"add"`, `"cond"`,
    /// `"dateAdd"`, ...). Operator names are the engine's own vocabulary,
    /// not SQL function names — `ExpressionTranslator` does that mapping.
    Op { name: String, args: Vec<AggExpr> },
    /// Existence test — `$exists` semantics (distinct from an explicit
    /// null comparison).
    Exists { field: String, negate: bool },
    /// Explicit type coercion, used both for `CAST` and for the
    /// executor's declared-type coercion pass (§4.7).
    Cast {
        expr: Box<AggExpr>,
        target: dr_core::SqlType,
    },
}

impl AggExpr {
    pub fn field(name: impl Into<String>) -> Self {
        AggExpr::Field(name.into())
    }

    pub fn lit(v: DocValue) -> Self {
        AggExpr::Literal(v)
    }

    pub fn op(name: &str, args: Vec<AggExpr>) -> Self {
        AggExpr::Op {
            name: name.to_string(),
            args,
        }
    }
}

/// The match-stage form of a predicate (§4.4): only ever constructed for
/// expressions of the shape `field OP literal` (or a conjunction/
/// disjunction thereof), so an engine can push it down to an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchExpr {
    Cmp {
        field: String,
        op: CmpOp,
        value: DocValue,
    },
    And(Vec<MatchExpr>),
    Or(Vec<MatchExpr>),
    Exists { field: String, negate: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Match { .. } => write!(f, "$match"),
            Stage::Project { .. } => write!(f, "$project"),
            Stage::Unwind { path, .. } => write!(f, "$unwind({path})"),
            Stage::Group { .. } => write!(f, "$group"),
            Stage::Sort { .. } => write!(f, "$sort"),
            Stage::Limit { n } => write!(f, "$limit({n})"),
            Stage::Skip { n } => write!(f, "$skip({n})"),
            Stage::Lookup { from, .. } => write!(f, "$lookup({from})"),
        }
    }
}
