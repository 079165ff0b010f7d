//! dr-sql - SQL text to logical-tree lowering for docrelay
//!
//! This crate is not part of docrelay's core pipeline (§1: there is no
//! client-facing SQL endpoint in scope). It exists so tests, demos, and the
//! CLI have a hand for turning SQL text into the `dr_plan::RelOp` tree that
//! `dr-plan`/`dr-exec` actually consume, via a thin `sqlparser-rs` wrapper
//! (`dialect`, `parser`) and an AST-to-IR lowering pass (`lower`).

pub mod dialect;
pub mod error;
pub mod lower;
pub mod parser;

pub use dialect::{AnsiDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use lower::{lower_statement, SchemaCatalog};
pub use parser::SqlParser;
