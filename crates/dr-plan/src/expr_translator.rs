//! ExpressionTranslator (§4.4): `Expr` -> `(AggExpr, Option<MatchExpr>)`.
//! `AggExpr` is always produced; `MatchExpr` only for the index-friendly
//! `field OP literal` shape (or a conjunction/disjunction of those).

use dr_core::{DocTypeTag, DocValue, SqlType};
use dr_doc::{AggExpr, CmpOp, MatchExpr};

use crate::error::{CompileError, CompileResult};
use crate::ir::expr::{Expr, Literal};
use crate::ir::schema::RelSchema;
use crate::locale::Locale;

const COMPARISON_OPS: &[&str] = &["=", "<>", "<", "<=", ">", ">="];

pub struct ExpressionTranslator<'a> {
    visible: &'a RelSchema,
    #[allow(dead_code)] // threaded through for DAYNAME/MONTHNAME (§9); the
    // in-memory evaluator has only one name table to offer (dr-doc).
    locale: &'a Locale,
}

impl<'a> ExpressionTranslator<'a> {
    pub fn new(visible: &'a RelSchema, locale: &'a Locale) -> Self {
        ExpressionTranslator { visible, locale }
    }

    pub fn translate(&self, expr: &Expr) -> CompileResult<(AggExpr, Option<MatchExpr>)> {
        let agg = self.translate_agg(expr)?;
        let m = self.translate_match(expr);
        Ok((agg, m))
    }

    fn resolve_field_path(&self, name: &str) -> CompileResult<String> {
        self.visible
            .find(name)
            .map(|c| c.field_path.clone())
            .ok_or_else(|| CompileError::UnknownColumn { name: name.to_string() })
    }

    fn literal_value(lit: &Literal) -> DocValue {
        match lit {
            Literal::Null => DocValue::Null,
            Literal::Boolean(b) => DocValue::Bool(*b),
            Literal::Int64(n) => DocValue::Int64(*n),
            Literal::Double(f) => DocValue::Double(*f),
            Literal::String(s) => DocValue::String(s.clone()),
        }
    }

    /// Full `AggExpr` translation: always succeeds for every supported
    /// operator, fails only on a genuinely unknown construct.
    fn translate_agg(&self, expr: &Expr) -> CompileResult<AggExpr> {
        match expr {
            Expr::Literal(lit) => Ok(AggExpr::Literal(Self::literal_value(lit))),
            Expr::ColumnRef { name, .. } => Ok(AggExpr::Field(self.resolve_field_path(name)?)),
            Expr::Call { operator, args } => self.translate_call(operator, args),
        }
    }

    fn translate_args(&self, args: &[Expr]) -> CompileResult<Vec<AggExpr>> {
        args.iter().map(|a| self.translate_agg(a)).collect()
    }

    fn translate_call(&self, operator: &str, args: &[Expr]) -> CompileResult<AggExpr> {
        match operator {
            "+" => self.binary_op("add", args),
            "-" => self.binary_op("sub", args),
            "*" => self.binary_op("mul", args),
            "/" => self.binary_op("div", args),
            "mod" => self.binary_op("mod", args),
            "=" => self.binary_op("eq", args),
            "<>" => self.binary_op("ne", args),
            "<" => self.binary_op("lt", args),
            "<=" => self.binary_op("lte", args),
            ">" => self.binary_op("gt", args),
            ">=" => self.binary_op("gte", args),
            "and" => self.translate_bool_chain("and", args),
            "or" => self.translate_bool_chain("or", args),
            "not" => {
                let a = self.translate_one(args, 0)?;
                Ok(AggExpr::op("not", vec![a]))
            }
            "is_null" => {
                let a = self.translate_one(args, 0)?;
                Ok(AggExpr::op("isNull", vec![a]))
            }
            "is_not_null" => {
                let a = self.translate_one(args, 0)?;
                Ok(AggExpr::op("isNotNull", vec![a]))
            }
            "case" => self.translate_case(args),
            "cast" => self.translate_cast(args),
            "substring" => self.translate_substring(args),
            "concat" => Ok(AggExpr::op("concat", self.translate_args(args)?)),
            "timestampadd" => self.translate_timestampadd(args),
            "timestampdiff" => self.translate_timestampdiff(args),
            "floor_to" => self.translate_floor_to(args),
            "extract_quarter" => {
                let a = self.translate_one(args, 0)?;
                Ok(AggExpr::op("extractQuarter", vec![a]))
            }
            "dayname" => {
                let a = self.translate_one(args, 0)?;
                Ok(AggExpr::op("dayName", vec![a]))
            }
            "monthname" => {
                let a = self.translate_one(args, 0)?;
                Ok(AggExpr::op("monthName", vec![a]))
            }
            // ObjectId specialization (§4.4): a comparison against a
            // literal that could be an ObjectId is handled at the
            // comparison sites above via `maybe_objectid_branch`, not
            // here — this arm only exists for defensiveness in case a
            // caller builds the `Call` directly.
            other => Err(CompileError::Unsupported {
                construct: format!("function '{other}'"),
            }),
        }
    }

    fn translate_one(&self, args: &[Expr], idx: usize) -> CompileResult<AggExpr> {
        let e = args.get(idx).ok_or_else(|| CompileError::InvalidQuery {
            message: format!("expected an argument at position {idx}"),
        })?;
        self.translate_agg(e)
    }

    fn binary_op(&self, engine_name: &str, args: &[Expr]) -> CompileResult<AggExpr> {
        if args.len() != 2 {
            return Err(CompileError::InvalidQuery {
                message: format!("'{engine_name}' expects exactly two arguments"),
            });
        }
        if COMPARISON_OPS_ENGINE.contains(&engine_name) {
            if let Some(objectid) = self.maybe_objectid_branch(engine_name, &args[0], &args[1])? {
                return Ok(objectid);
            }
        }
        let lhs = self.translate_agg(&args[0])?;
        let rhs = self.translate_agg(&args[1])?;
        Ok(AggExpr::op(engine_name, vec![lhs, rhs]))
    }

    /// ObjectId specialization (§4.4): when one side is a field declared
    /// ObjectId and the other is a literal that could represent one
    /// (24-char hex string), emit an OR of "compare against `{$oid:
    /// hex}`" and "compare against the literal as-is".
    fn maybe_objectid_branch(
        &self,
        engine_cmp: &str,
        left: &Expr,
        right: &Expr,
    ) -> CompileResult<Option<AggExpr>> {
        let (field_expr, lit_expr) = match (left, right) {
            (Expr::ColumnRef { .. }, Expr::Literal(_)) => (left, right),
            (Expr::Literal(_), Expr::ColumnRef { .. }) => (right, left),
            _ => return Ok(None),
        };
        let Expr::ColumnRef { name, .. } = field_expr else {
            return Ok(None);
        };
        let Some(col) = self.visible.find(name) else {
            return Ok(None);
        };
        if col.doc_type_hint != Some(DocTypeTag::ObjectId) {
            return Ok(None);
        }
        let Expr::Literal(Literal::String(s)) = lit_expr else {
            return Ok(None);
        };
        if !is_objectid_hex(s) {
            return Ok(None);
        }

        let field = AggExpr::Field(col.field_path.clone());
        let as_oid = AggExpr::op(
            engine_cmp,
            vec![field.clone(), AggExpr::Literal(DocValue::ObjectId(s.clone()))],
        );
        let as_literal = AggExpr::op(
            engine_cmp,
            vec![field, AggExpr::Literal(DocValue::String(s.clone()))],
        );
        Ok(Some(AggExpr::op("or", vec![as_oid, as_literal])))
    }

    /// SQL Kleene AND/OR over an n-ary chain (§4.4's pattern generalizes
    /// past two operands the same way a flattened SQL `a AND b AND c`
    /// does).
    fn translate_bool_chain(&self, engine_name: &str, args: &[Expr]) -> CompileResult<AggExpr> {
        if args.is_empty() {
            return Err(CompileError::InvalidQuery {
                message: format!("'{engine_name}' expects at least one argument"),
            });
        }
        let translated = self.translate_args(args)?;
        Ok(translated
            .into_iter()
            .reduce(|acc, next| AggExpr::op(engine_name, vec![acc, next]))
            .expect("non-empty by construction"))
    }

    fn translate_case(&self, args: &[Expr]) -> CompileResult<AggExpr> {
        // args alternate condition/result; an odd trailing arg is ELSE.
        if args.is_empty() {
            return Err(CompileError::InvalidQuery {
                message: "CASE requires at least one WHEN/THEN pair".to_string(),
            });
        }
        let has_else = args.len() % 2 == 1;
        let else_result = if has_else {
            self.translate_agg(args.last().unwrap())?
        } else {
            AggExpr::Literal(DocValue::Null)
        };
        let pairs = if has_else { &args[..args.len() - 1] } else { args };

        let mut result = else_result;
        for chunk in pairs.chunks(2).rev() {
            let [cond, then] = chunk else {
                return Err(CompileError::InvalidQuery {
                    message: "CASE has a dangling WHEN with no THEN".to_string(),
                });
            };
            let cond = self.translate_agg(cond)?;
            let then = self.translate_agg(then)?;
            result = AggExpr::op("cond", vec![cond, then, result]);
        }
        Ok(result)
    }

    fn translate_cast(&self, args: &[Expr]) -> CompileResult<AggExpr> {
        let [expr, Expr::Literal(Literal::String(target))] = args else {
            return Err(CompileError::InvalidQuery {
                message: "CAST expects [expr, target_type_name]".to_string(),
            });
        };
        let target_type = parse_cast_target(target).ok_or_else(|| CompileError::Unsupported {
            construct: format!("CAST target '{target}'"),
        })?;
        let inner = self.translate_agg(expr)?;
        Ok(AggExpr::Cast {
            expr: Box::new(inner),
            target: target_type,
        })
    }

    /// SUBSTRING: SQL is 1-indexed, the engine is 0-indexed (§4.4:
    /// "subtract 1 before emission").
    fn translate_substring(&self, args: &[Expr]) -> CompileResult<AggExpr> {
        if args.len() < 2 || args.len() > 3 {
            return Err(CompileError::InvalidQuery {
                message: "SUBSTRING expects (expr, start[, length])".to_string(),
            });
        }
        let source = self.translate_agg(&args[0])?;
        let start_sql = self.translate_agg(&args[1])?;
        let start = AggExpr::op(
            "sub",
            vec![start_sql, AggExpr::Literal(DocValue::Int64(1))],
        );
        let mut call_args = vec![source, start];
        if let Some(len) = args.get(2) {
            call_args.push(self.translate_agg(len)?);
        }
        Ok(AggExpr::op("substrCP", call_args))
    }

    /// TIMESTAMPADD (§4.4): second/minute/hour/day/week reduce to a
    /// millisecond add; YEAR/MONTH/QUARTER are rejected at translation
    /// time (`UNSUPPORTED_CONVERSION`).
    fn translate_timestampadd(&self, args: &[Expr]) -> CompileResult<AggExpr> {
        let [Expr::Literal(Literal::String(unit)), amount, field] = args else {
            return Err(CompileError::InvalidQuery {
                message: "TIMESTAMPADD expects (unit, amount, field)".to_string(),
            });
        };
        let ms_per_unit = ms_per_unit(unit).ok_or_else(|| CompileError::UnsupportedConversion {
            message: format!("TIMESTAMPADD does not support unit '{unit}'"),
        })?;
        let amount = self.translate_agg(amount)?;
        let field = self.translate_agg(field)?;
        let delta_ms = AggExpr::op(
            "mul",
            vec![amount, AggExpr::Literal(DocValue::Int64(ms_per_unit))],
        );
        Ok(AggExpr::op("dateAdd", vec![field, delta_ms]))
    }

    /// TIMESTAMPDIFF (§4.4): YEAR/MONTH/QUARTER use extracted year/month
    /// arithmetic; smaller units reduce to a millisecond subtraction.
    fn translate_timestampdiff(&self, args: &[Expr]) -> CompileResult<AggExpr> {
        let [Expr::Literal(Literal::String(unit)), lhs, rhs] = args else {
            return Err(CompileError::InvalidQuery {
                message: "TIMESTAMPDIFF expects (unit, start, end)".to_string(),
            });
        };
        let lhs = self.translate_agg(lhs)?;
        let rhs = self.translate_agg(rhs)?;
        match unit.to_ascii_lowercase().as_str() {
            "year" => Ok(AggExpr::op("dateDiffYear", vec![lhs, rhs])),
            "month" => Ok(AggExpr::op("dateDiffMonth", vec![lhs, rhs])),
            "quarter" => Ok(AggExpr::op("dateDiffQuarter", vec![lhs, rhs])),
            other => {
                let ms = ms_per_unit(other).ok_or_else(|| CompileError::UnsupportedConversion {
                    message: format!("TIMESTAMPDIFF does not support unit '{other}'"),
                })?;
                let diff_ms = AggExpr::op("sub", vec![rhs, lhs]);
                Ok(AggExpr::op(
                    "div",
                    vec![diff_ms, AggExpr::Literal(DocValue::Int64(ms))],
                ))
            }
        }
    }

    fn translate_floor_to(&self, args: &[Expr]) -> CompileResult<AggExpr> {
        let [expr, Expr::Literal(Literal::String(unit))] = args else {
            return Err(CompileError::InvalidQuery {
                message: "FLOOR(.. TO unit) expects (expr, unit)".to_string(),
            });
        };
        let inner = self.translate_agg(expr)?;
        Ok(AggExpr::op(
            "floorToUnit",
            vec![inner, AggExpr::Literal(DocValue::String(unit.to_ascii_lowercase()))],
        ))
    }

    /// Build the optional `MatchExpr` (§4.4): only for `field OP literal`
    /// (or the reverse) and conjunctions/disjunctions of that shape.
    fn translate_match(&self, expr: &Expr) -> Option<MatchExpr> {
        match expr {
            Expr::Call { operator, args } if operator == "and" && args.len() >= 2 => {
                let parts: Option<Vec<MatchExpr>> = args.iter().map(|a| self.translate_match(a)).collect();
                parts.map(MatchExpr::And)
            }
            Expr::Call { operator, args } if operator == "or" && args.len() >= 2 => {
                let parts: Option<Vec<MatchExpr>> = args.iter().map(|a| self.translate_match(a)).collect();
                parts.map(MatchExpr::Or)
            }
            Expr::Call { operator, args } if operator == "is_null" || operator == "is_not_null" => {
                let Expr::ColumnRef { name, .. } = &args.first()? else {
                    return None;
                };
                let field = self.resolve_field_path(name).ok()?;
                Some(MatchExpr::Exists {
                    field,
                    negate: operator == "is_null",
                })
            }
            Expr::Call { operator, args } if COMPARISON_OPS.contains(&operator.as_str()) && args.len() == 2 => {
                let (field_expr, lit_expr, flipped) = match (&args[0], &args[1]) {
                    (Expr::ColumnRef { .. }, Expr::Literal(_)) => (&args[0], &args[1], false),
                    (Expr::Literal(_), Expr::ColumnRef { .. }) => (&args[1], &args[0], true),
                    _ => return None,
                };
                let Expr::ColumnRef { name, .. } = field_expr else {
                    return None;
                };
                let Expr::Literal(lit) = lit_expr else {
                    return None;
                };
                let field = self.resolve_field_path(name).ok()?;
                let op = cmp_op(operator, flipped)?;
                Some(MatchExpr::Cmp {
                    field,
                    op,
                    value: Self::literal_value(lit),
                })
            }
            _ => None,
        }
    }
}

const COMPARISON_OPS_ENGINE: &[&str] = &["eq", "ne", "lt", "lte", "gt", "gte"];

fn cmp_op(sql_op: &str, flipped: bool) -> Option<CmpOp> {
    let op = match sql_op {
        "=" => CmpOp::Eq,
        "<>" => CmpOp::Ne,
        "<" => {
            if flipped {
                CmpOp::Gt
            } else {
                CmpOp::Lt
            }
        }
        "<=" => {
            if flipped {
                CmpOp::Gte
            } else {
                CmpOp::Lte
            }
        }
        ">" => {
            if flipped {
                CmpOp::Lt
            } else {
                CmpOp::Gt
            }
        }
        ">=" => {
            if flipped {
                CmpOp::Lte
            } else {
                CmpOp::Gte
            }
        }
        _ => return None,
    };
    Some(op)
}

fn ms_per_unit(unit: &str) -> Option<i64> {
    match unit.to_ascii_lowercase().as_str() {
        "second" => Some(1_000),
        "minute" => Some(60_000),
        "hour" => Some(3_600_000),
        "day" => Some(86_400_000),
        "week" => Some(7 * 86_400_000),
        _ => None,
    }
}

fn parse_cast_target(name: &str) -> Option<SqlType> {
    Some(match name.to_ascii_uppercase().as_str() {
        "BOOLEAN" | "BOOL" => SqlType::Boolean,
        "TINYINT" => SqlType::TinyInt,
        "SMALLINT" => SqlType::SmallInt,
        "INTEGER" | "INT" => SqlType::Integer,
        "BIGINT" => SqlType::BigInt,
        "DECIMAL" | "NUMERIC" => SqlType::Decimal,
        "DOUBLE" | "FLOAT" | "REAL" => SqlType::Double,
        "VARCHAR" | "STRING" | "TEXT" => SqlType::Varchar,
        _ => return None,
    })
}

fn is_objectid_hex(s: &str) -> bool {
    s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
#[path = "expr_translator_test.rs"]
mod tests;
