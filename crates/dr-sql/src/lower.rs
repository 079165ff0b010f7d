//! AST-to-IR lowering: sqlparser AST → `dr_plan::RelOp`, a `Statement` →
//! IR walk with a `SchemaCatalog` alias and per-clause `lower_*`
//! functions, adapted to a tree with no schema embedded in its nodes
//! (`PlanCompiler` resolves names against a `dr_schema::Schema` at
//! compile time, not here) and no `SetOp` — writes and set operations are
//! out of scope.
//!
//! This crate is not part of docrelay's core; it exists so tests and the
//! CLI have a hand for turning SQL text into a logical tree without a
//! real client-facing parser wired in front of `dr-plan`.

use std::collections::HashMap;

use dr_core::TableId;
use dr_plan::{Expr, JoinKind, Literal, RelOp, SortKey};
use sqlparser::ast::{
    self, BinaryOperator, Function, FunctionArg, FunctionArgExpr, GroupByExpr, Join,
    JoinConstraint, JoinOperator, OrderByExpr, Query, Select, SelectItem, SetExpr, Statement,
    TableFactor, TableWithJoins, UnaryOperator, Value,
};

use crate::error::{SqlError, SqlResult};

/// Maps a SQL table name (as written in `FROM`/`JOIN`, case-sensitive —
/// callers are expected to pass the same casing used when the schema was
/// inferred) to the virtual table it scans.
pub type SchemaCatalog = HashMap<String, TableId>;

/// Lower one parsed statement into a logical tree. Only `Statement::Query`
/// (a `SELECT`) is supported; docrelay has no write path (§1).
pub fn lower_statement(stmt: &Statement, catalog: &SchemaCatalog) -> SqlResult<RelOp> {
    match stmt {
        Statement::Query(query) => lower_query(query, catalog),
        other => Err(SqlError::UnsupportedStatement(statement_kind(other).to_string())),
    }
}

fn statement_kind(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::Insert(_) => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete(_) => "DELETE",
        Statement::CreateTable(_) => "CREATE TABLE",
        Statement::Drop { .. } => "DROP",
        _ => "unsupported statement",
    }
}

/// Query → Sort → Limit → body (§4.5/§4.6 consume the tree bottom-up, so
/// the outermost SQL clauses become the outermost tree nodes).
fn lower_query(query: &Query, catalog: &SchemaCatalog) -> SqlResult<RelOp> {
    let mut plan = lower_set_expr(&query.body, catalog)?;

    if let Some(ref order_by) = query.order_by {
        if !order_by.exprs.is_empty() {
            let keys = lower_order_by(&order_by.exprs)?;
            plan = RelOp::Sort { input: Box::new(plan), keys };
        }
    }

    let limit = query.limit.as_ref().and_then(expr_to_u64);
    let offset = query.offset.as_ref().and_then(|o| expr_to_u64(&o.value));
    if limit.is_some() || offset.is_some() {
        plan = RelOp::Limit { input: Box::new(plan), n: limit, offset };
    }

    Ok(plan)
}

fn lower_set_expr(set_expr: &SetExpr, catalog: &SchemaCatalog) -> SqlResult<RelOp> {
    match set_expr {
        SetExpr::Select(select) => lower_select(select, catalog),
        SetExpr::Query(q) => lower_query(q, catalog),
        SetExpr::SetOperation { .. } => {
            Err(SqlError::UnsupportedExpr("UNION/INTERSECT/EXCEPT".to_string()))
        }
        _ => Err(SqlError::UnsupportedExpr("VALUES/TABLE".to_string())),
    }
}

fn lower_order_by(exprs: &[OrderByExpr]) -> SqlResult<Vec<SortKey>> {
    exprs
        .iter()
        .map(|obe| {
            let expr = lower_expr(&obe.expr)?;
            Ok(SortKey { expr, ascending: obe.asc.unwrap_or(true) })
        })
        .collect()
}

fn expr_to_u64(expr: &ast::Expr) -> Option<u64> {
    match expr {
        ast::Expr::Value(Value::Number(n, _)) => n.parse().ok(),
        _ => None,
    }
}

/// FROM → WHERE → GROUP BY → HAVING → projection.
fn lower_select(select: &Select, catalog: &SchemaCatalog) -> SqlResult<RelOp> {
    let mut plan = lower_from(&select.from, catalog)?;

    if let Some(ref selection) = select.selection {
        let predicate = lower_expr(selection)?;
        plan = RelOp::Filter { input: Box::new(plan), predicate };
    }

    let group_exprs: &[ast::Expr] = match &select.group_by {
        GroupByExpr::Expressions(exprs, _) => exprs.as_slice(),
        _ => &[],
    };

    if !group_exprs.is_empty() || select_has_aggregate(&select.projection) {
        let group_keys = group_exprs.iter().map(lower_expr).collect::<SqlResult<Vec<_>>>()?;
        let mut aggs = Vec::new();
        for item in &select.projection {
            let expr = select_item_expr(item);
            if let Some(expr) = expr {
                collect_aggregates(expr, &mut aggs)?;
            }
        }
        plan = RelOp::Aggregate { input: Box::new(plan), group_keys, aggs };
    }

    if let Some(ref having) = select.having {
        let predicate = lower_expr(having)?;
        plan = RelOp::Filter { input: Box::new(plan), predicate };
    }

    let exprs = lower_projection(&select.projection)?;
    Ok(RelOp::Project { input: Box::new(plan), exprs })
}

fn select_item_expr(item: &SelectItem) -> Option<&ast::Expr> {
    match item {
        SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => Some(e),
        _ => None,
    }
}

fn select_has_aggregate(items: &[SelectItem]) -> bool {
    items.iter().any(|item| select_item_expr(item).is_some_and(contains_aggregate))
}

fn contains_aggregate(expr: &ast::Expr) -> bool {
    match expr {
        ast::Expr::Function(f) => is_aggregate_function(&f.name.to_string().to_uppercase()),
        ast::Expr::BinaryOp { left, right, .. } => contains_aggregate(left) || contains_aggregate(right),
        ast::Expr::UnaryOp { expr: inner, .. } | ast::Expr::Nested(inner) => contains_aggregate(inner),
        _ => false,
    }
}

/// `FROM` clause into a Scan/Join tree.
fn lower_from(from: &[TableWithJoins], catalog: &SchemaCatalog) -> SqlResult<RelOp> {
    let first = from
        .first()
        .ok_or_else(|| SqlError::UnsupportedExpr("SELECT with no FROM clause".to_string()))?;

    let mut plan = lower_table_factor(&first.relation, catalog)?;
    for join in &first.joins {
        plan = lower_join(plan, join, catalog)?;
    }

    if from.len() > 1 {
        return Err(SqlError::UnsupportedExpr("comma-separated FROM (implicit cross join)".to_string()));
    }

    Ok(plan)
}

/// Table aliases aren't tracked: `RelSchema::find` resolves a
/// `ColumnRef` by name alone, never by its `table` qualifier, so there is
/// nothing downstream for an alias to feed. Column names are expected to
/// be unambiguous across one query's tables, same as dr-plan's own join
/// test fixtures assume.
fn lower_table_factor(factor: &TableFactor, catalog: &SchemaCatalog) -> SqlResult<RelOp> {
    match factor {
        TableFactor::Table { name, .. } => {
            let table_name = name.to_string();
            let table_id = catalog
                .get(&table_name)
                .or_else(|| name.0.last().and_then(|i| catalog.get(&i.to_string())))
                .ok_or_else(|| SqlError::UnknownTable(table_name.clone()))?;
            Ok(RelOp::Scan { table_id: *table_id })
        }
        other => Err(SqlError::UnsupportedExpr(format!("FROM clause item {other:?}"))),
    }
}

fn lower_join(left: RelOp, join: &Join, catalog: &SchemaCatalog) -> SqlResult<RelOp> {
    let right = lower_table_factor(&join.relation, catalog)?;

    let (kind, constraint) = match &join.join_operator {
        JoinOperator::Join(c) | JoinOperator::Inner(c) => (JoinKind::Inner, Some(c)),
        JoinOperator::Left(c) | JoinOperator::LeftOuter(c) => (JoinKind::Left, Some(c)),
        other => {
            return Err(SqlError::UnsupportedExpr(format!(
                "join kind {other:?} (only INNER and LEFT are supported)"
            )))
        }
    };
    let condition = match constraint {
        Some(JoinConstraint::On(expr)) => lower_expr(expr)?,
        _ => return Err(SqlError::UnsupportedExpr("join without an ON condition".to_string())),
    };

    Ok(RelOp::Join { left: Box::new(left), right: Box::new(right), kind, condition })
}

fn lower_projection(items: &[SelectItem]) -> SqlResult<Vec<(String, Expr)>> {
    let mut out = Vec::new();
    for item in items {
        match item {
            SelectItem::UnnamedExpr(e) => {
                let name = infer_column_name(e);
                out.push((name, lower_projection_expr(e)?));
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                out.push((alias.value.clone(), lower_projection_expr(expr)?));
            }
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                return Err(SqlError::UnsupportedExpr("SELECT * (output_columns require an explicit list)".to_string()));
            }
        }
    }
    Ok(out)
}

/// A projection item that's itself an aggregate call (post-GROUP BY)
/// refers to the aggregate's own output column rather than re-lowering
/// the original function call, matching how `RelOp::Aggregate` names its
/// `aggs`.
fn lower_projection_expr(expr: &ast::Expr) -> SqlResult<Expr> {
    if let ast::Expr::Function(f) = expr {
        let name = f.name.to_string().to_uppercase();
        if is_aggregate_function(&name) {
            return Ok(Expr::column(name.to_lowercase()));
        }
    }
    lower_expr(expr)
}

fn infer_column_name(expr: &ast::Expr) -> String {
    match expr {
        ast::Expr::Identifier(ident) => ident.value.clone(),
        ast::Expr::CompoundIdentifier(idents) => {
            idents.last().map(|i| i.value.clone()).unwrap_or_else(|| "column".to_string())
        }
        ast::Expr::Function(f) => f.name.to_string().to_lowercase(),
        _ => "column".to_string(),
    }
}

fn collect_aggregates(expr: &ast::Expr, out: &mut Vec<(String, Expr)>) -> SqlResult<()> {
    match expr {
        ast::Expr::Function(f) => {
            let name_upper = f.name.to_string().to_uppercase();
            if is_aggregate_function(&name_upper) {
                out.push((name_upper.to_lowercase(), lower_expr(expr)?));
            }
        }
        ast::Expr::BinaryOp { left, right, .. } => {
            collect_aggregates(left, out)?;
            collect_aggregates(right, out)?;
        }
        ast::Expr::UnaryOp { expr: inner, .. } | ast::Expr::Nested(inner) => {
            collect_aggregates(inner, out)?;
        }
        _ => {}
    }
    Ok(())
}

fn is_aggregate_function(name: &str) -> bool {
    matches!(name, "COUNT" | "SUM" | "AVG" | "MIN" | "MAX")
}

/// sqlparser `Expr` → `dr_plan::Expr` (§6.3's `Call{operator, args}`
/// vocabulary, §4.4). Resolution against a schema happens later, in
/// `dr-plan::ExpressionTranslator` — this step only has to get the shape
/// right.
fn lower_expr(expr: &ast::Expr) -> SqlResult<Expr> {
    match expr {
        ast::Expr::Identifier(ident) => Ok(Expr::column(ident.value.clone())),

        ast::Expr::CompoundIdentifier(idents) => {
            let name = idents.last().map(|i| i.value.clone()).unwrap_or_default();
            let table = (idents.len() >= 2).then(|| idents[idents.len() - 2].value.clone());
            Ok(Expr::ColumnRef { table, name })
        }

        ast::Expr::Value(val) => lower_value(val),

        ast::Expr::BinaryOp { left, op, right } => {
            let operator = binary_operator_name(op)?;
            Ok(Expr::call(operator, vec![lower_expr(left)?, lower_expr(right)?]))
        }

        ast::Expr::UnaryOp { op: UnaryOperator::Not, expr: inner } => {
            Ok(Expr::call("not", vec![lower_expr(inner)?]))
        }
        ast::Expr::UnaryOp { op: UnaryOperator::Minus, expr: inner } => {
            Ok(Expr::call("-", vec![Expr::Literal(Literal::Int64(0)), lower_expr(inner)?]))
        }
        ast::Expr::UnaryOp { op, .. } => Err(SqlError::UnsupportedExpr(format!("unary operator {op:?}"))),

        ast::Expr::Function(f) => lower_function(f),

        ast::Expr::Cast { expr: inner, data_type, .. } => Ok(Expr::call(
            "cast",
            vec![lower_expr(inner)?, Expr::Literal(Literal::String(data_type.to_string()))],
        )),

        ast::Expr::Case { operand, conditions, results, else_result } => {
            lower_case(operand.as_deref(), conditions, results, else_result.as_deref())
        }

        ast::Expr::IsNull(inner) => Ok(Expr::call("is_null", vec![lower_expr(inner)?])),
        ast::Expr::IsNotNull(inner) => Ok(Expr::call("is_not_null", vec![lower_expr(inner)?])),

        ast::Expr::Nested(inner) => lower_expr(inner),

        ast::Expr::Between { expr: inner, negated, low, high } => {
            let inner_expr = lower_expr(inner)?;
            let low_cmp = Expr::call(if *negated { "<" } else { ">=" }, vec![inner_expr.clone(), lower_expr(low)?]);
            let high_cmp = Expr::call(if *negated { ">" } else { "<=" }, vec![inner_expr, lower_expr(high)?]);
            Ok(Expr::call(if *negated { "or" } else { "and" }, vec![low_cmp, high_cmp]))
        }

        ast::Expr::InList { expr: lhs, list, negated } => lower_in_list(lhs, list, *negated),

        other => Err(SqlError::UnsupportedExpr(format!("{other:?}").chars().take(100).collect())),
    }
}

fn binary_operator_name(op: &BinaryOperator) -> SqlResult<&'static str> {
    Ok(match op {
        BinaryOperator::Plus => "+",
        BinaryOperator::Minus => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::Modulo => "mod",
        BinaryOperator::Eq => "=",
        BinaryOperator::NotEq => "<>",
        BinaryOperator::Lt => "<",
        BinaryOperator::LtEq => "<=",
        BinaryOperator::Gt => ">",
        BinaryOperator::GtEq => ">=",
        BinaryOperator::And => "and",
        BinaryOperator::Or => "or",
        other => return Err(SqlError::UnsupportedExpr(format!("binary operator {other:?}"))),
    })
}

fn lower_value(val: &Value) -> SqlResult<Expr> {
    match val {
        Value::Number(n, _) => {
            if let Ok(i) = n.parse::<i64>() {
                Ok(Expr::Literal(Literal::Int64(i)))
            } else if let Ok(f) = n.parse::<f64>() {
                Ok(Expr::Literal(Literal::Double(f)))
            } else {
                Err(SqlError::UnsupportedExpr(format!("unparseable numeric literal '{n}'")))
            }
        }
        Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => {
            Ok(Expr::Literal(Literal::String(s.clone())))
        }
        Value::Boolean(b) => Ok(Expr::Literal(Literal::Boolean(*b))),
        Value::Null => Ok(Expr::Literal(Literal::Null)),
        other => Err(SqlError::UnsupportedExpr(format!("literal {other:?}"))),
    }
}

fn lower_function(func: &Function) -> SqlResult<Expr> {
    let name = func.name.to_string().to_uppercase();
    let args = extract_function_args(&func.args)?;

    let operator = match name.as_str() {
        "COUNT" => "count".to_string(),
        "SUM" => "sum".to_string(),
        "AVG" => "avg".to_string(),
        "MIN" => "min".to_string(),
        "MAX" => "max".to_string(),
        "SUBSTRING" => "substring".to_string(),
        "CONCAT" => "concat".to_string(),
        "TIMESTAMPADD" => "timestampadd".to_string(),
        "TIMESTAMPDIFF" => "timestampdiff".to_string(),
        "FLOOR_TO" => "floor_to".to_string(),
        "EXTRACT_QUARTER" => "extract_quarter".to_string(),
        "DAYNAME" => "dayname".to_string(),
        "MONTHNAME" => "monthname".to_string(),
        other => other.to_lowercase(),
    };
    Ok(Expr::call(operator, args))
}

fn extract_function_args(args: &ast::FunctionArguments) -> SqlResult<Vec<Expr>> {
    match args {
        ast::FunctionArguments::None => Ok(vec![]),
        ast::FunctionArguments::Subquery(_) => {
            Err(SqlError::UnsupportedExpr("subquery as a function argument".to_string()))
        }
        ast::FunctionArguments::List(arg_list) => arg_list
            .args
            .iter()
            // `COUNT(*)` lowers to a zero-arg `count` call (`Expr::is_count_star`).
            .filter(|arg| !matches!(arg, FunctionArg::Unnamed(FunctionArgExpr::Wildcard) | FunctionArg::Named { arg: FunctionArgExpr::Wildcard, .. }))
            .map(|arg| match arg {
                FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) | FunctionArg::Named { arg: FunctionArgExpr::Expr(e), .. } => lower_expr(e),
                other => Err(SqlError::UnsupportedExpr(format!("function argument {other:?}"))),
            })
            .collect(),
    }
}

fn lower_case(
    operand: Option<&ast::Expr>,
    conditions: &[ast::Expr],
    results: &[ast::Expr],
    else_result: Option<&ast::Expr>,
) -> SqlResult<Expr> {
    if operand.is_some() {
        return Err(SqlError::UnsupportedExpr("CASE <expr> WHEN (simple form); use CASE WHEN <predicate>".to_string()));
    }
    let mut args = Vec::new();
    for (cond, res) in conditions.iter().zip(results.iter()) {
        args.push(lower_expr(cond)?);
        args.push(lower_expr(res)?);
    }
    if let Some(else_expr) = else_result {
        args.push(lower_expr(else_expr)?);
    }
    Ok(Expr::call("case", args))
}

/// `a NOT IN (x, y)` → `not(or(a = x, a = y))`; `a IN (x, y)` → `or(a = x,
/// a = y)` (§9: the logical tree has no dedicated IN operator).
fn lower_in_list(lhs: &ast::Expr, list: &[ast::Expr], negated: bool) -> SqlResult<Expr> {
    if list.is_empty() {
        return Ok(Expr::Literal(Literal::Boolean(negated)));
    }
    let lhs_expr = lower_expr(lhs)?;
    let mut comparisons = Vec::with_capacity(list.len());
    for item in list {
        comparisons.push(Expr::call("=", vec![lhs_expr.clone(), lower_expr(item)?]));
    }
    let mut disjunction = comparisons.remove(0);
    for cmp in comparisons {
        disjunction = Expr::call("or", vec![disjunction, cmp]);
    }
    if negated {
        Ok(Expr::call("not", vec![disjunction]))
    } else {
        Ok(disjunction)
    }
}

#[cfg(test)]
#[path = "lower_test.rs"]
mod tests;
