//! OperatorTranslator (§4.5): walks one `RelOp` node at a time (the
//! recursion itself lives in `PlanCompiler`), turning it into the
//! pipeline stages that realize it and the `visible_columns` its parent
//! sees. Holds the one `PathResolver` shared across a whole compile so
//! two `Scan`s of overlapping paths (a self-join, or a join across two
//! sibling tables) never double-unwind the same array (§8 property 3).

use dr_core::{ColumnId, SqlType, TableId};
use dr_schema::{Schema, SchemaTable};
use dr_doc::{AggExpr, Accumulator, SortSpec, Stage};

use crate::error::{CompileError, CompileResult};
use crate::expr_translator::ExpressionTranslator;
use crate::ir::expr::Expr;
use crate::ir::relop::{JoinKind, RelOp};
use crate::ir::schema::{RelSchema, VisibleColumn};
use crate::locale::Locale;
use crate::path_resolver::{array_paths, PathResolver};

pub struct OperatorTranslator<'a> {
    schema: &'a Schema,
    locale: &'a Locale,
    path_resolver: PathResolver,
    flag_counter: usize,
}

impl<'a> OperatorTranslator<'a> {
    pub fn new(schema: &'a Schema, locale: &'a Locale) -> Self {
        OperatorTranslator {
            schema,
            locale,
            path_resolver: PathResolver::new(),
            flag_counter: 0,
        }
    }

    pub fn translate(&mut self, op: &RelOp) -> CompileResult<(Vec<Stage>, RelSchema)> {
        match op {
            RelOp::Scan { table_id } => self.translate_scan(*table_id),
            RelOp::Filter { input, predicate } => self.translate_filter(input, predicate),
            RelOp::Project { input, exprs } => self.translate_project(input, exprs),
            RelOp::Aggregate { input, group_keys, aggs } => {
                self.translate_aggregate(input, group_keys, aggs)
            }
            RelOp::Sort { input, keys } => self.translate_sort(input, keys),
            RelOp::Limit { input, n, offset } => self.translate_limit(input, *n, *offset),
            RelOp::Join { left, right, kind, condition } => {
                self.translate_join(left, right, *kind, condition)
            }
        }
    }

    fn table(&self, table_id: TableId) -> CompileResult<&'a SchemaTable> {
        self.schema
            .table(table_id)
            .ok_or(CompileError::UnknownTable { table_id })
    }

    /// Scan(table) (§4.5): the required existence match + unwinds from
    /// `PathResolver`, then a `$project` that flattens every column onto
    /// a single top-level field named after it, so everything downstream
    /// addresses columns by simple name instead of a document path.
    fn translate_scan(&mut self, table_id: TableId) -> CompileResult<(Vec<Stage>, RelSchema)> {
        let table = self.table(table_id)?;
        let mut stages = self.path_resolver.resolve(&table.path_from_root);

        let arrays = array_paths(&table.path_from_root);
        let flattened_root = table.path_from_root.replace("[]", "");

        let mut fields = Vec::with_capacity(table.columns.len());
        let mut visible = Vec::with_capacity(table.columns.len());
        for col in &table.columns {
            let source = match &col.source_field_path {
                Some(rel) => {
                    if flattened_root.is_empty() {
                        rel.clone()
                    } else {
                        format!("{flattened_root}.{rel}")
                    }
                }
                None => {
                    // Synthetic array-index column. Its position in
                    // `arrays` is the depth recorded in its own name
                    // (`array_index_lvl_N`); `PathResolver` may have
                    // assigned that array path a *different* field name
                    // if another table already unwound it first.
                    let level: usize = col
                        .name
                        .strip_prefix("array_index_lvl_")
                        .and_then(|n| n.parse().ok())
                        .ok_or_else(|| CompileError::Unsupported {
                            construct: format!("unrecognized synthetic column '{}'", col.name),
                        })?;
                    let path = arrays.get(level).ok_or_else(|| CompileError::Unsupported {
                        construct: format!("'{}' has no matching array boundary", col.name),
                    })?;
                    self.path_resolver
                        .index_field_for(path)
                        .ok_or_else(|| CompileError::Unsupported {
                            construct: format!("'{}' was never unwound", col.name),
                        })?
                        .to_string()
                }
            };
            fields.push((col.name.clone(), AggExpr::Field(source)));
            visible.push(VisibleColumn {
                name: col.name.clone(),
                column_id: Some(col.column_id),
                sql_type: col.sql_type,
                nullable: col.nullable,
                field_path: col.name.clone(),
                doc_type_hint: col.doc_type_hint,
            });
        }
        stages.push(Stage::Project { fields });

        Ok((stages, RelSchema::new(visible)))
    }

    /// Filter(pred) (§4.5): an index-friendly `MatchExpr` becomes a
    /// direct `$match`; anything else goes through the filter-flag
    /// sequence (project the flag in, match on it, project it back out)
    /// so three-valued truth still only lets `true` rows through.
    fn translate_filter(&mut self, input: &RelOp, predicate: &Expr) -> CompileResult<(Vec<Stage>, RelSchema)> {
        let (mut stages, schema) = self.translate(input)?;
        let (agg, match_expr) = ExpressionTranslator::new(&schema, self.locale).translate(predicate)?;

        if match_expr.is_some() {
            stages.push(Stage::Match { expr: agg });
        } else {
            let flag = format!("__filter_flag_{}", self.flag_counter);
            self.flag_counter += 1;

            let mut with_flag: Vec<(String, AggExpr)> =
                schema.columns.iter().map(|c| (c.name.clone(), AggExpr::Field(c.name.clone()))).collect();
            with_flag.push((flag.clone(), agg));
            stages.push(Stage::Project { fields: with_flag });

            stages.push(Stage::Match {
                expr: AggExpr::op(
                    "eq",
                    vec![AggExpr::Field(flag.clone()), AggExpr::Literal(dr_core::DocValue::Bool(true))],
                ),
            });

            let without_flag: Vec<(String, AggExpr)> =
                schema.columns.iter().map(|c| (c.name.clone(), AggExpr::Field(c.name.clone()))).collect();
            stages.push(Stage::Project { fields: without_flag });
        }

        Ok((stages, schema))
    }

    /// Project(exprs) (§4.5): a `$project` mapping each named output to
    /// its `AggExpr`; `visible_columns'` is exactly the given names, in
    /// order.
    fn translate_project(&mut self, input: &RelOp, exprs: &[(String, Expr)]) -> CompileResult<(Vec<Stage>, RelSchema)> {
        let (mut stages, schema) = self.translate(input)?;
        let translator = ExpressionTranslator::new(&schema, self.locale);

        let mut fields = Vec::with_capacity(exprs.len());
        let mut visible = Vec::with_capacity(exprs.len());
        for (name, expr) in exprs {
            let (agg, _) = translator.translate(expr)?;
            let source_col = match expr {
                Expr::ColumnRef { name: src, .. } => schema.find(src),
                _ => None,
            };
            fields.push((name.clone(), agg));
            visible.push(VisibleColumn {
                name: name.clone(),
                column_id: source_col.and_then(|c| c.column_id),
                sql_type: source_col.map(|c| c.sql_type).unwrap_or(SqlType::Varchar),
                nullable: source_col.map(|c| c.nullable).unwrap_or(true),
                field_path: name.clone(),
                doc_type_hint: source_col.and_then(|c| c.doc_type_hint),
            });
        }
        stages.push(Stage::Project { fields });

        Ok((stages, RelSchema::new(visible)))
    }

    /// Aggregate(group_keys, aggs) (§4.5). The in-memory document
    /// client's `$group` already emits key and accumulator fields flat at
    /// the top level (no `_id` nesting survives into the output
    /// document), so unlike the literal table in §4.5 this needs no
    /// separate lifting `$project` afterwards.
    fn translate_aggregate(
        &mut self,
        input: &RelOp,
        group_keys: &[Expr],
        aggs: &[(String, Expr)],
    ) -> CompileResult<(Vec<Stage>, RelSchema)> {
        let (mut stages, schema) = self.translate(input)?;
        let translator = ExpressionTranslator::new(&schema, self.locale);

        let mut key = Vec::with_capacity(group_keys.len());
        let mut visible = Vec::with_capacity(group_keys.len() + aggs.len());
        for (i, expr) in group_keys.iter().enumerate() {
            let (agg, _) = translator.translate(expr)?;
            let (name, source_col) = match expr {
                Expr::ColumnRef { name, .. } => (name.clone(), schema.find(name)),
                _ => (format!("key_{i}"), None),
            };
            key.push((name.clone(), agg));
            visible.push(VisibleColumn {
                name: name.clone(),
                column_id: source_col.and_then(|c| c.column_id),
                sql_type: source_col.map(|c| c.sql_type).unwrap_or(SqlType::Varchar),
                nullable: source_col.map(|c| c.nullable).unwrap_or(true),
                field_path: name,
                doc_type_hint: source_col.and_then(|c| c.doc_type_hint),
            });
        }

        let mut accumulators = Vec::with_capacity(aggs.len());
        for (name, expr) in aggs {
            let Expr::Call { operator, args } = expr else {
                return Err(CompileError::InvalidQuery {
                    message: format!("aggregate '{name}' must be a function call"),
                });
            };
            let (acc, sql_type) = match operator.as_str() {
                "count" if args.is_empty() => (Accumulator::CountAll, SqlType::BigInt),
                "count" => {
                    let (agg, _) = translator.translate(&args[0])?;
                    (Accumulator::CountColumn(agg), SqlType::BigInt)
                }
                "sum" => {
                    let (agg, _) = translator.translate(&args[0])?;
                    (Accumulator::Sum(agg), SqlType::Double)
                }
                "avg" => {
                    let (agg, _) = translator.translate(&args[0])?;
                    (Accumulator::Avg(agg), SqlType::Double)
                }
                "min" => {
                    let source_col = column_ref_source(&args[0], &schema);
                    let (agg, _) = translator.translate(&args[0])?;
                    (Accumulator::Min(agg), source_col.map(|c| c.sql_type).unwrap_or(SqlType::Double))
                }
                "max" => {
                    let source_col = column_ref_source(&args[0], &schema);
                    let (agg, _) = translator.translate(&args[0])?;
                    (Accumulator::Max(agg), source_col.map(|c| c.sql_type).unwrap_or(SqlType::Double))
                }
                other => {
                    return Err(CompileError::Unsupported {
                        construct: format!("aggregate function '{other}'"),
                    })
                }
            };
            accumulators.push((name.clone(), acc));
            visible.push(VisibleColumn {
                name: name.clone(),
                column_id: None,
                sql_type,
                nullable: true,
                field_path: name.clone(),
                doc_type_hint: None,
            });
        }

        stages.push(Stage::Group { key, accumulators });
        Ok((stages, RelSchema::new(visible)))
    }

    /// Sort(keys) (§4.5). The engine's `$sort` addresses plain field
    /// names, so only `ColumnRef` keys are accepted — sorting by a
    /// computed expression would need an extra `Project` to materialize
    /// it first, which the caller (not this translator) is responsible
    /// for inserting.
    fn translate_sort(
        &mut self,
        input: &RelOp,
        keys: &[crate::ir::relop::SortKey],
    ) -> CompileResult<(Vec<Stage>, RelSchema)> {
        let (mut stages, schema) = self.translate(input)?;
        let mut specs = Vec::with_capacity(keys.len());
        for key in keys {
            let Expr::ColumnRef { name, .. } = &key.expr else {
                return Err(CompileError::Unsupported {
                    construct: "ORDER BY a computed expression (project it first)".to_string(),
                });
            };
            let col = schema.find(name).ok_or_else(|| CompileError::UnknownColumn { name: name.clone() })?;
            specs.push(SortSpec {
                field: col.field_path.clone(),
                ascending: key.ascending,
            });
        }
        stages.push(Stage::Sort { keys: specs });
        Ok((stages, schema))
    }

    /// Limit(n)/Offset(k) (§4.5): skip before limit; offset alone emits
    /// only `$skip`.
    fn translate_limit(
        &mut self,
        input: &RelOp,
        n: Option<u64>,
        offset: Option<u64>,
    ) -> CompileResult<(Vec<Stage>, RelSchema)> {
        let (mut stages, schema) = self.translate(input)?;
        if let Some(k) = offset {
            if k > 0 {
                stages.push(Stage::Skip { n: k });
            }
        }
        if let Some(n) = n {
            stages.push(Stage::Limit { n });
        }
        Ok((stages, schema))
    }

    /// Join(left, right, cond) (§4.5): accepted only when both sides
    /// share a root collection and `cond` is an equality between a
    /// foreign key and the primary key (or matching array-index levels)
    /// it references. When that holds the relationship already holds for
    /// every row reachable from the shared document, so translation is
    /// just concatenating both sides' pipelines (their unwinds already
    /// deduplicated by the shared `PathResolver`) and merging schemas.
    /// `Left` relies on `preserveNullAndEmpty` already having kept the
    /// unmatched rows; `Inner` adds one existence match on the right
    /// side's join column to drop them.
    fn translate_join(
        &mut self,
        left: &RelOp,
        right: &RelOp,
        kind: JoinKind,
        condition: &Expr,
    ) -> CompileResult<(Vec<Stage>, RelSchema)> {
        let left_table = root_table(left).ok_or_else(|| CompileError::UnsupportedJoin {
            reason: "left side of the join has no traceable source table".to_string(),
        })?;
        let right_table = root_table(right).ok_or_else(|| CompileError::UnsupportedJoin {
            reason: "right side of the join has no traceable source table".to_string(),
        })?;
        let left_schema_table = self.table(left_table)?;
        let right_schema_table = self.table(right_table)?;
        if left_schema_table.source_collection != right_schema_table.source_collection {
            return Err(CompileError::UnsupportedJoin {
                reason: format!(
                    "cross-collection join ('{}' vs '{}')",
                    left_schema_table.source_collection, right_schema_table.source_collection
                ),
            });
        }

        let (left_stages, left_schema) = self.translate(left)?;
        let (right_stages, right_schema) = self.translate(right)?;

        let Expr::Call { operator, args } = condition else {
            return Err(CompileError::UnsupportedJoin {
                reason: "join condition must be a single equality".to_string(),
            });
        };
        if operator != "=" || args.len() != 2 {
            return Err(CompileError::UnsupportedJoin {
                reason: "join condition must be 'left.col = right.col'".to_string(),
            });
        }
        let (Expr::ColumnRef { name: name_a, .. }, Expr::ColumnRef { name: name_b, .. }) = (&args[0], &args[1])
        else {
            return Err(CompileError::UnsupportedJoin {
                reason: "join condition must equate two columns, not expressions".to_string(),
            });
        };
        let (col_a, col_b) = match (left_schema.find(name_a), right_schema.find(name_b)) {
            (Some(a), Some(b)) => (a, b),
            _ => match (left_schema.find(name_b), right_schema.find(name_a)) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(CompileError::UnsupportedJoin {
                        reason: format!("'{name_a}'/'{name_b}' do not resolve one-per-side"),
                    })
                }
            },
        };
        if !is_fk_pk_or_shared_index(col_a, col_b, left_schema_table, right_schema_table) {
            return Err(CompileError::UnsupportedJoin {
                reason: format!("'{}' = '{}' is not a foreign-key/primary-key or array-index relationship", col_a.name, col_b.name),
            });
        }

        let mut stages = left_stages;
        stages.extend(right_stages);
        if kind == JoinKind::Inner {
            stages.push(Stage::Match {
                expr: AggExpr::Exists { field: col_b.field_path.clone(), negate: false },
            });
        }
        // A preserved-null unwind leaves every right-side field missing on an
        // unmatched left row, including ones the schema marks non-nullable
        // (e.g. the child's own primary key). Left join output must reflect
        // that or the executor's missing-non-nullable-PK check (§4.7) would
        // drop exactly the rows this join kind exists to keep (§8 property 6).
        let right_schema = if kind == JoinKind::Left {
            right_schema.all_nullable()
        } else {
            right_schema
        };
        Ok((stages, RelSchema::merge(&left_schema, &right_schema)))
    }
}

fn column_ref_source<'a>(expr: &Expr, schema: &'a RelSchema) -> Option<&'a VisibleColumn> {
    match expr {
        Expr::ColumnRef { name, .. } => schema.find(name),
        _ => None,
    }
}

/// Walk a chain of single-input operators down to its `Scan`, the same
/// way `PathResolver`'s caller needs to know which collection a subtree
/// ultimately reads from.
fn root_table(op: &RelOp) -> Option<TableId> {
    match op {
        RelOp::Scan { table_id } => Some(*table_id),
        RelOp::Filter { input, .. }
        | RelOp::Project { input, .. }
        | RelOp::Aggregate { input, .. }
        | RelOp::Sort { input, .. }
        | RelOp::Limit { input, .. } => root_table(input),
        RelOp::Join { .. } => None,
    }
}

fn is_fk_pk_or_shared_index(
    a: &VisibleColumn,
    b: &VisibleColumn,
    table_a: &SchemaTable,
    table_b: &SchemaTable,
) -> bool {
    let (Some(id_a), Some(id_b)) = (a.column_id, b.column_id) else {
        return false;
    };
    if id_a == id_b {
        return true;
    }
    if a.name.starts_with("array_index_lvl_") && a.name == b.name {
        return true;
    }
    references(table_a, id_a, id_b) || references(table_b, id_b, id_a)
}

fn references(table: &SchemaTable, fk_column: ColumnId, pk_column: ColumnId) -> bool {
    table
        .foreign_keys
        .iter()
        .any(|fk| fk.column == fk_column && fk.references_column == pk_column)
}

#[cfg(test)]
#[path = "operator_translator_test.rs"]
mod tests;
