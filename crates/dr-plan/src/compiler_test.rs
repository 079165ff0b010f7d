use super::*;
use crate::ir::expr::{Expr, Literal};
use crate::ir::relop::{JoinKind, RelOp, SortKey};
use crate::test_support::root_and_item_tables;
use dr_doc::{DocumentClient, InMemoryDocumentClient};

#[test]
fn compiles_a_filtered_scan_to_a_collection_and_stage_list() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let tree = RelOp::Filter {
        input: Box::new(RelOp::Scan { table_id: root_id }),
        predicate: Expr::call("=", vec![Expr::column("status"), Expr::Literal(Literal::String("open".into()))]),
    };
    let ctx = PlanCompiler::compile(&tree, &schema, &locale).unwrap();
    assert_eq!(ctx.collection, "orders");
    assert!(!ctx.stages.is_empty());
    assert!(ctx.output_columns.iter().any(|c| c.name == "status"));
}

#[test]
fn unknown_table_id_fails_the_whole_compile() {
    let (schema, _root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let bogus = dr_core::TableId(0xdead_beef);
    let tree = RelOp::Scan { table_id: bogus };
    let err = PlanCompiler::compile(&tree, &schema, &locale).unwrap_err();
    assert!(matches!(err, CompileError::UnknownTable { .. }));
}

#[test]
fn unsupported_construct_inside_a_deep_tree_still_fails_all_or_nothing() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let tree = RelOp::Limit {
        input: Box::new(RelOp::Sort {
            input: Box::new(RelOp::Scan { table_id: root_id }),
            keys: vec![SortKey {
                expr: Expr::call("not_a_real_function", vec![Expr::column("status")]),
                ascending: true,
            }],
        }),
        n: Some(10),
        offset: None,
    };
    let err = PlanCompiler::compile(&tree, &schema, &locale).unwrap_err();
    assert!(matches!(err, CompileError::Unsupported { .. }));
}

#[test]
fn explain_renders_one_numbered_line_per_stage() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let tree = RelOp::Limit { input: Box::new(RelOp::Scan { table_id: root_id }), n: Some(5), offset: None };
    let ctx = PlanCompiler::compile(&tree, &schema, &locale).unwrap();
    let explain = ctx.explain();
    assert_eq!(explain.lines().count(), ctx.stages.len());
    assert!(explain.contains("$limit(5)"));
}

/// §8 property 3: a join across a table and its own array child unwinds
/// the shared array path exactly once, even though both sides' `Scan`
/// resolve through the same `PathResolver`.
#[test]
fn join_across_parent_and_child_unwinds_the_array_only_once() {
    let (schema, root_id, item_id) = root_and_item_tables();
    let locale = Locale::default();
    let tree = RelOp::Join {
        left: Box::new(RelOp::Scan { table_id: root_id }),
        right: Box::new(RelOp::Scan { table_id: item_id }),
        kind: JoinKind::Inner,
        condition: Expr::call("=", vec![Expr::column("__id"), Expr::column("__id")]),
    };
    let ctx = PlanCompiler::compile(&tree, &schema, &locale).unwrap();
    let unwinds = ctx.stages.iter().filter(|s| matches!(s, Stage::Unwind { .. })).count();
    assert_eq!(unwinds, 1, "the items[] array must be unwound exactly once");
}

/// End-to-end: compile a scan+filter+sort+limit and actually run it
/// against an in-memory collection.
#[test]
fn compiled_pipeline_executes_against_the_in_memory_client() {
    let (schema, root_id, _item_id) = root_and_item_tables();
    let locale = Locale::default();
    let client = InMemoryDocumentClient::new();
    client.seed(
        "orders",
        vec![
            dr_core::DocValue::Object(vec![
                ("_id".to_string(), dr_core::DocValue::ObjectId("507f1f77bcf86cd799439011".to_string())),
                ("status".to_string(), dr_core::DocValue::String("open".to_string())),
            ]),
            dr_core::DocValue::Object(vec![
                ("_id".to_string(), dr_core::DocValue::ObjectId("507f1f77bcf86cd799439012".to_string())),
                ("status".to_string(), dr_core::DocValue::String("closed".to_string())),
            ]),
        ],
    );

    let tree = RelOp::Filter {
        input: Box::new(RelOp::Scan { table_id: root_id }),
        predicate: Expr::call("=", vec![Expr::column("status"), Expr::Literal(Literal::String("open".into()))]),
    };
    let ctx = PlanCompiler::compile(&tree, &schema, &locale).unwrap();

    let rt = tokio::runtime::Runtime::new().unwrap();
    let out = rt.block_on(async {
        let mut cursor = client.run_aggregate(&ctx.collection, &ctx.stages).await.unwrap();
        let mut docs = Vec::new();
        while let Some(doc) = cursor.next().await.unwrap() {
            docs.push(doc);
        }
        docs
    });

    assert_eq!(out.len(), 1);
    assert_eq!(
        dr_doc::memory::get_path(&out[0], "status"),
        Some(&dr_core::DocValue::String("open".to_string()))
    );
}
