//! dr-plan - SQL-to-aggregation-pipeline translation for docrelay: a
//! minimal logical tree (§6.3), `PathResolver` (§4.3), `ExpressionTranslator`
//! (§4.4), `OperatorTranslator` (§4.5) and `PlanCompiler` (§4.6).

pub mod compiler;
pub mod error;
pub mod expr_translator;
pub mod ir;
pub mod locale;
pub mod operator_translator;
pub mod path_resolver;

#[cfg(test)]
mod test_support;

pub use compiler::{OutputColumn, PlanCompiler, QueryContext};
pub use error::{CompileError, CompileResult};
pub use expr_translator::ExpressionTranslator;
pub use ir::expr::{Expr, Literal};
pub use ir::relop::{JoinKind, RelOp, SortKey};
pub use ir::schema::{RelSchema, VisibleColumn};
pub use locale::Locale;
pub use operator_translator::OperatorTranslator;
pub use path_resolver::PathResolver;
