//! The logical tree consumed by `PlanCompiler` (§6.3).

pub mod expr;
pub mod relop;
pub mod schema;
