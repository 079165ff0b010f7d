use super::*;
use crate::ir::expr::Literal;
use crate::test_support::root_and_item_tables;

#[test]
fn scan_of_array_child_emits_match_unwind_then_flattening_project() {
    let (schema, _root_id, item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let (stages, visible) = t.translate(&RelOp::Scan { table_id: item_id }).unwrap();
    assert!(matches!(stages[0], Stage::Match { .. }));
    assert!(matches!(stages[1], Stage::Unwind { .. }));
    match &stages[2] {
        Stage::Project { fields } => {
            let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["__id", "array_index_lvl_0", "sku", "qty"]);
        }
        other => panic!("expected Project, got {other:?}"),
    }
    assert_eq!(visible.len(), 4);
    assert!(visible.find("sku").is_some());
}

#[test]
fn scan_of_root_table_emits_no_unwind() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let (stages, _) = t.translate(&RelOp::Scan { table_id: root_id }).unwrap();
    assert!(!stages.iter().any(|s| matches!(s, Stage::Unwind { .. })));
}

#[test]
fn filter_with_field_literal_predicate_emits_a_plain_match() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let scan = RelOp::Scan { table_id: root_id };
    let pred = Expr::call("=", vec![Expr::column("status"), Expr::Literal(Literal::String("open".into()))]);
    let (stages, _) = t.translate(&RelOp::Filter { input: Box::new(scan), predicate: pred }).unwrap();
    // scan's own match+project, then exactly one more Match and no flag projects
    let matches = stages.iter().filter(|s| matches!(s, Stage::Match { .. })).count();
    assert_eq!(matches, 1);
    assert!(!stages.iter().any(project_has_flag_field));
}

#[test]
fn filter_with_computed_predicate_uses_the_flag_sequence() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let scan = RelOp::Scan { table_id: root_id };
    // status = status (two columns, not field-OP-literal) forces the flag path.
    let pred = Expr::call("=", vec![Expr::column("status"), Expr::column("status")]);
    let (stages, schema_out) = t.translate(&RelOp::Filter { input: Box::new(scan), predicate: pred }).unwrap();
    assert!(stages.iter().any(project_has_flag_field));
    // the flag never survives into visible_columns'
    assert!(schema_out.find("__filter_flag_0").is_none());
}

fn project_has_flag_field(stage: &Stage) -> bool {
    matches!(stage, Stage::Project { fields } if fields.iter().any(|(n, _)| n.starts_with("__filter_flag_")))
}

#[test]
fn sort_by_plain_column_emits_a_sort_stage() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let scan = RelOp::Scan { table_id: root_id };
    let keys = vec![crate::ir::relop::SortKey { expr: Expr::column("status"), ascending: true }];
    let (stages, _) = t.translate(&RelOp::Sort { input: Box::new(scan), keys }).unwrap();
    assert!(matches!(stages.last(), Some(Stage::Sort { .. })));
}

#[test]
fn sort_by_computed_expression_is_rejected() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let scan = RelOp::Scan { table_id: root_id };
    let keys = vec![crate::ir::relop::SortKey {
        expr: Expr::call("+", vec![Expr::column("status"), Expr::Literal(Literal::Int64(1))]),
        ascending: true,
    }];
    let err = t.translate(&RelOp::Sort { input: Box::new(scan), keys }).unwrap_err();
    assert!(matches!(err, CompileError::Unsupported { .. }));
}

#[test]
fn offset_without_limit_emits_only_skip() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let scan = RelOp::Scan { table_id: root_id };
    let (stages, _) = t.translate(&RelOp::Limit { input: Box::new(scan), n: None, offset: Some(5) }).unwrap();
    assert!(matches!(stages.last(), Some(Stage::Skip { n: 5 })));
}

#[test]
fn limit_with_offset_emits_skip_then_limit_in_order() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let scan = RelOp::Scan { table_id: root_id };
    let (stages, _) = t.translate(&RelOp::Limit { input: Box::new(scan), n: Some(10), offset: Some(5) }).unwrap();
    let tail = &stages[stages.len() - 2..];
    assert!(matches!(tail[0], Stage::Skip { n: 5 }));
    assert!(matches!(tail[1], Stage::Limit { n: 10 }));
}

#[test]
fn aggregate_count_star_and_sum_produce_a_single_group_stage() {
    let (schema, _root_id, item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let scan = RelOp::Scan { table_id: item_id };
    let group_keys = vec![Expr::column("sku")];
    let aggs = vec![
        ("n".to_string(), Expr::call("count", vec![])),
        ("total_qty".to_string(), Expr::call("sum", vec![Expr::column("qty")])),
    ];
    let (stages, visible) = t
        .translate(&RelOp::Aggregate { input: Box::new(scan), group_keys, aggs })
        .unwrap();
    match stages.last() {
        Some(Stage::Group { key, accumulators }) => {
            assert_eq!(key.len(), 1);
            assert_eq!(accumulators.len(), 2);
        }
        other => panic!("expected Group, got {other:?}"),
    }
    assert!(visible.find("sku").is_some());
    assert!(visible.find("n").is_some());
    assert!(visible.find("total_qty").is_some());
}

#[test]
fn inner_join_on_inherited_foreign_key_appends_an_existence_match() {
    let (schema, root_id, item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let left = RelOp::Scan { table_id: root_id };
    let right = RelOp::Scan { table_id: item_id };
    let cond = Expr::call("=", vec![Expr::column("__id"), Expr::column("__id")]);
    let (stages, merged) = t
        .translate(&RelOp::Join {
            left: Box::new(left),
            right: Box::new(right),
            kind: JoinKind::Inner,
            condition: cond,
        })
        .unwrap();
    // merged schema carries both sides' columns (duplicate `__id` included,
    // same as SQL's natural join column duplication without USING()).
    assert_eq!(merged.len(), 6);
    assert!(matches!(stages.last(), Some(Stage::Match { .. })));
}

#[test]
fn left_join_on_inherited_foreign_key_adds_no_extra_stage() {
    let (schema, root_id, item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let left = RelOp::Scan { table_id: root_id };
    let right = RelOp::Scan { table_id: item_id };
    let cond = Expr::call("=", vec![Expr::column("__id"), Expr::column("__id")]);
    let (stages, merged) = t
        .translate(&RelOp::Join {
            left: Box::new(left),
            right: Box::new(right),
            kind: JoinKind::Left,
            condition: cond,
        })
        .unwrap();
    // the right scan's own flattening Project is the last stage, not a Match.
    assert!(matches!(stages.last(), Some(Stage::Project { .. })));
    // a preserved-null unwind leaves the right side's columns missing on an
    // unmatched row, even ones the schema itself marks non-nullable, so the
    // merged schema must report them as nullable.
    assert!(merged.find("array_index_lvl_0").unwrap().nullable);
}

#[test]
fn join_on_unrelated_columns_is_rejected() {
    let (schema, root_id, item_id) = root_and_item_tables();
    let locale = Locale::default();
    let mut t = OperatorTranslator::new(&schema, &locale);
    let left = RelOp::Scan { table_id: root_id };
    let right = RelOp::Scan { table_id: item_id };
    let cond = Expr::call("=", vec![Expr::column("status"), Expr::column("sku")]);
    let err = t
        .translate(&RelOp::Join {
            left: Box::new(left),
            right: Box::new(right),
            kind: JoinKind::Inner,
            condition: cond,
        })
        .unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedJoin { .. }));
}
