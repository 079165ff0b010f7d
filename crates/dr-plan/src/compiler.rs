//! PlanCompiler (§4.6): walks a logical tree bottom-up through
//! `OperatorTranslator`, producing a `QueryContext`. Compilation is
//! all-or-nothing — `?` propagation means the first `CompileError` from
//! any subtree aborts the whole compile, never a partial pipeline.

use dr_core::SqlType;
use dr_doc::Stage;
use dr_schema::Schema;

use crate::error::CompileResult;
use crate::ir::relop::RelOp;
use crate::locale::Locale;
use crate::operator_translator::OperatorTranslator;

/// One output column's shape, as seen by a client running the compiled
/// pipeline (§4.6: `output_columns: [(name, sql_type, nullable)]`).
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
}

/// The compiled result of one logical tree (§4.6, §6.2).
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub collection: String,
    pub stages: Vec<Stage>,
    pub output_columns: Vec<OutputColumn>,
}

impl QueryContext {
    /// EXPLAIN-style introspection (supplemented): one line per stage, in
    /// execution order, for `dr-cli explain` to print without reaching
    /// into `Stage`'s `Debug` form.
    pub fn explain(&self) -> String {
        self.stages
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{i:>3}  {s}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct PlanCompiler;

impl PlanCompiler {
    /// Compile `logical_tree` against `schema` using `locale` for any
    /// locale-dependent expressions (DAYNAME/MONTHNAME, §4.4). Every
    /// `Scan` in the tree must resolve against a table actually reachable
    /// from some single collection; that collection becomes
    /// `QueryContext::collection`.
    pub fn compile(logical_tree: &RelOp, schema: &Schema, locale: &Locale) -> CompileResult<QueryContext> {
        let collection = source_collection(logical_tree, schema)?;

        let mut translator = OperatorTranslator::new(schema, locale);
        let (stages, visible) = translator.translate(logical_tree)?;

        let output_columns = visible
            .columns
            .into_iter()
            .map(|c| OutputColumn { name: c.name, sql_type: c.sql_type, nullable: c.nullable })
            .collect();

        Ok(QueryContext { collection, stages, output_columns })
    }
}

/// The single source collection a logical tree reads from, found by
/// walking to its leftmost `Scan`. `OperatorTranslator::translate_join`
/// has already rejected any tree whose scans don't share one.
fn source_collection(op: &RelOp, schema: &Schema) -> CompileResult<String> {
    match op {
        RelOp::Scan { table_id } => {
            let table = schema
                .table(*table_id)
                .ok_or(crate::error::CompileError::UnknownTable { table_id: *table_id })?;
            Ok(table.source_collection.clone())
        }
        RelOp::Filter { input, .. }
        | RelOp::Project { input, .. }
        | RelOp::Aggregate { input, .. }
        | RelOp::Sort { input, .. }
        | RelOp::Limit { input, .. } => source_collection(input, schema),
        RelOp::Join { left, .. } => source_collection(left, schema),
    }
}

#[cfg(test)]
#[path = "compiler_test.rs"]
mod tests;
