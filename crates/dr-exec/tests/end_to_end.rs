//! End-to-end scenarios run through the full `dr-plan` compile +
//! `dr-exec` execute path against the in-memory document client: the
//! concrete S1-S7 scenarios and properties 4, 5 and 6 of the testable
//! properties.

use dr_core::{ColumnId, DocTypeTag, DocValue, ForeignKey, SampleStrategy, SqlType, TableId};
use dr_doc::InMemoryDocumentClient;
use dr_exec::{CancellationToken, Executor};
use dr_plan::{Expr, JoinKind, Literal, Locale, PlanCompiler, RelOp, SortKey};
use dr_schema::{Column, Schema, SchemaInference, SchemaTable, TableKind};
use std::collections::BTreeMap;
use std::sync::Arc;

fn events_schema() -> (Schema, TableId) {
    let table_id = TableId::new("s", "events", "");
    let pk = ColumnId::new(table_id, "__id");
    let table = SchemaTable {
        table_id,
        sql_name: "events".to_string(),
        kind: TableKind::Root,
        source_collection: "events".to_string(),
        path_from_root: String::new(),
        columns: vec![
            Column {
                column_id: pk,
                name: "__id".to_string(),
                sql_type: SqlType::Varchar,
                nullable: false,
                is_primary_key: true,
                is_index: true,
                foreign_key: None,
                source_field_path: Some("_id".to_string()),
                doc_type_hint: Some(DocTypeTag::ObjectId),
            },
            Column {
                column_id: ColumnId::new(table_id, "field"),
                name: "field".to_string(),
                sql_type: SqlType::Timestamp,
                nullable: true,
                is_primary_key: false,
                is_index: false,
                foreign_key: None,
                source_field_path: Some("field".to_string()),
                doc_type_hint: Some(DocTypeTag::DateTime),
            },
            Column {
                column_id: ColumnId::new(table_id, "field_a"),
                name: "field_a".to_string(),
                sql_type: SqlType::Integer,
                nullable: true,
                is_primary_key: false,
                is_index: false,
                foreign_key: None,
                source_field_path: Some("fieldA".to_string()),
                doc_type_hint: None,
            },
        ],
        primary_key: vec![pk],
        foreign_keys: vec![],
    };
    let mut tables = BTreeMap::new();
    tables.insert(table_id, table);
    (Schema { schema_name: "s".to_string(), version: 1, tables }, table_id)
}

fn root_and_child_schema() -> (Schema, TableId, TableId) {
    let root_id = TableId::new("s", "root", "");
    let root_pk = ColumnId::new(root_id, "__id");
    let root_table = SchemaTable {
        table_id: root_id,
        sql_name: "root".to_string(),
        kind: TableKind::Root,
        source_collection: "root".to_string(),
        path_from_root: String::new(),
        columns: vec![Column {
            column_id: root_pk,
            name: "__id".to_string(),
            sql_type: SqlType::Varchar,
            nullable: false,
            is_primary_key: true,
            is_index: true,
            foreign_key: None,
            source_field_path: Some("_id".to_string()),
            doc_type_hint: Some(DocTypeTag::ObjectId),
        }],
        primary_key: vec![root_pk],
        foreign_keys: vec![],
    };

    let child_id = TableId::new("s", "root", "children[]");
    let child_fk = ColumnId::new(child_id, "__id");
    let child_idx = ColumnId::new(child_id, "array_index_lvl_0");
    let child_table = SchemaTable {
        table_id: child_id,
        sql_name: "root_children".to_string(),
        kind: TableKind::ArrayChild,
        source_collection: "root".to_string(),
        path_from_root: "children[]".to_string(),
        columns: vec![
            Column {
                column_id: child_fk,
                name: "__id".to_string(),
                sql_type: SqlType::Varchar,
                nullable: false,
                is_primary_key: true,
                is_index: true,
                foreign_key: Some(ForeignKey { column: child_fk, references_table: root_id, references_column: root_pk }),
                source_field_path: Some("_id".to_string()),
                doc_type_hint: Some(DocTypeTag::ObjectId),
            },
            Column {
                column_id: child_idx,
                name: "array_index_lvl_0".to_string(),
                sql_type: SqlType::Integer,
                nullable: false,
                is_primary_key: true,
                is_index: true,
                foreign_key: None,
                source_field_path: None,
                doc_type_hint: None,
            },
        ],
        primary_key: vec![child_fk, child_idx],
        foreign_keys: vec![ForeignKey { column: child_fk, references_table: root_id, references_column: root_pk }],
    };

    let mut tables = BTreeMap::new();
    tables.insert(root_id, root_table);
    tables.insert(child_id, child_table);
    (Schema { schema_name: "s".to_string(), version: 1, tables }, root_id, child_id)
}

async fn run_single_column(schema: &Schema, tree: &RelOp, client: &Arc<InMemoryDocumentClient>) -> Vec<DocValue> {
    let locale = Locale::default();
    let ctx = PlanCompiler::compile(tree, schema, &locale).unwrap();
    let executor = Executor::new(client.clone());
    let mut cursor = executor.open(&ctx, 0, CancellationToken::new(), None).await.unwrap();
    let mut out = Vec::new();
    while let Some(batch) = cursor.next_batch().await.unwrap() {
        for row in batch.rows {
            out.push(row.get(0).unwrap().clone());
        }
    }
    out
}

fn project(col: &str, op: &str, call_args: Vec<Expr>, table_id: TableId) -> RelOp {
    RelOp::Project {
        input: Box::new(RelOp::Scan { table_id }),
        exprs: vec![(col.to_string(), Expr::call(op, call_args))],
    }
}

/// S3: TIMESTAMPADD(DAY/MINUTE/SECOND, 1, field).
#[tokio::test]
async fn timestampadd_day_minute_second() {
    let (schema, table_id) = events_schema();
    let client = Arc::new(InMemoryDocumentClient::new());
    client.seed(
        "events",
        vec![DocValue::Object(vec![
            ("_id".to_string(), DocValue::ObjectId("507f1f77bcf86cd799439011".to_string())),
            ("field".to_string(), DocValue::DateTime(1_577_836_800_000)), // 2020-01-01T00:00:00Z
        ])],
    );

    let day_args = vec![Expr::Literal(Literal::String("DAY".into())), Expr::Literal(Literal::Int64(1)), Expr::column("field")];
    let out = run_single_column(&schema, &project("out", "timestampadd", day_args, table_id), &client).await;
    assert_eq!(out, vec![DocValue::DateTime(1_577_923_200_000)]); // 2020-01-02T00:00:00Z

    let minute_args = vec![Expr::Literal(Literal::String("MINUTE".into())), Expr::Literal(Literal::Int64(1)), Expr::column("field")];
    let out = run_single_column(&schema, &project("out", "timestampadd", minute_args, table_id), &client).await;
    assert_eq!(out, vec![DocValue::DateTime(1_577_836_860_000)]); // 2020-01-01T00:01:00Z

    let second_args = vec![Expr::Literal(Literal::String("SECOND".into())), Expr::Literal(Literal::Int64(1)), Expr::column("field")];
    let out = run_single_column(&schema, &project("out", "timestampadd", second_args, table_id), &client).await;
    assert_eq!(out, vec![DocValue::DateTime(1_577_836_801_000)]); // 2020-01-01T00:00:01Z
}

/// S4: FLOOR(field TO WEEK) and FLOOR(TIMESTAMPADD(DAY,7,field) TO WEEK).
#[tokio::test]
async fn floor_to_week_anchors_on_monday() {
    let (schema, table_id) = events_schema();
    let client = Arc::new(InMemoryDocumentClient::new());
    client.seed(
        "events",
        vec![DocValue::Object(vec![
            ("_id".to_string(), DocValue::ObjectId("507f1f77bcf86cd799439011".to_string())),
            ("field".to_string(), DocValue::DateTime(1_580_733_296_780)), // 2020-02-03T12:34:56.78Z, a Monday
        ])],
    );

    let floor_args = vec![Expr::column("field"), Expr::Literal(Literal::String("week".into()))];
    let out = run_single_column(&schema, &project("out", "floor_to", floor_args, table_id), &client).await;
    assert_eq!(out, vec![DocValue::DateTime(1_580_688_000_000)]); // 2020-02-03T00:00:00Z

    let shifted = Expr::call(
        "floor_to",
        vec![
            Expr::call("timestampadd", vec![Expr::Literal(Literal::String("DAY".into())), Expr::Literal(Literal::Int64(7)), Expr::column("field")]),
            Expr::Literal(Literal::String("week".into())),
        ],
    );
    let tree = RelOp::Project { input: Box::new(RelOp::Scan { table_id }), exprs: vec![("out".to_string(), shifted)] };
    let out = run_single_column(&schema, &tree, &client).await;
    assert_eq!(out, vec![DocValue::DateTime(1_581_292_800_000)]); // 2020-02-10T00:00:00Z
}

/// S5: `WHERE fieldA NOT IN (1, 5)` expressed as `not(or(eq(.,1), eq(.,5)))`.
#[tokio::test]
async fn not_in_excludes_listed_values() {
    let (schema, table_id) = events_schema();
    let client = Arc::new(InMemoryDocumentClient::new());
    client.seed(
        "events",
        vec![
            doc_with_id_and_a("101", 1),
            doc_with_id_and_a("102", 3),
            doc_with_id_and_a("103", 5),
        ],
    );

    let predicate = Expr::call(
        "not",
        vec![Expr::call(
            "or",
            vec![
                Expr::call("=", vec![Expr::column("field_a"), Expr::Literal(Literal::Int64(1))]),
                Expr::call("=", vec![Expr::column("field_a"), Expr::Literal(Literal::Int64(5))]),
            ],
        )],
    );
    let tree = RelOp::Project {
        input: Box::new(RelOp::Filter { input: Box::new(RelOp::Scan { table_id }), predicate }),
        exprs: vec![("field_a".to_string(), Expr::column("field_a"))],
    };
    let out = run_single_column(&schema, &tree, &client).await;
    assert_eq!(out, vec![DocValue::Int64(3)]);
}

fn doc_with_id_and_a(id: &str, a: i64) -> DocValue {
    DocValue::Object(vec![
        ("_id".to_string(), DocValue::ObjectId(format!("{id:0>24}"))),
        ("fieldA".to_string(), DocValue::Int64(a)),
    ])
}

/// S6: `COUNT(field)` ignores both missing and explicit null.
#[tokio::test]
async fn count_column_ignores_null_and_missing() {
    let (schema, table_id) = events_schema();
    let client = Arc::new(InMemoryDocumentClient::new());
    client.seed(
        "events",
        vec![
            DocValue::Object(vec![
                ("_id".to_string(), DocValue::ObjectId("1".repeat(24))),
                ("field".to_string(), DocValue::DateTime(0)),
            ]),
            DocValue::Object(vec![
                ("_id".to_string(), DocValue::ObjectId("2".repeat(24))),
                ("field".to_string(), DocValue::Null),
            ]),
            DocValue::Object(vec![("_id".to_string(), DocValue::ObjectId("3".repeat(24)))]),
        ],
    );

    let locale = Locale::default();
    let tree = RelOp::Aggregate {
        input: Box::new(RelOp::Scan { table_id }),
        group_keys: vec![],
        aggs: vec![("n".to_string(), Expr::call("count", vec![Expr::column("field")]))],
    };
    let ctx = PlanCompiler::compile(&tree, &schema, &locale).unwrap();
    let executor = Executor::new(client.clone());
    let mut cursor = executor.open(&ctx, 0, CancellationToken::new(), None).await.unwrap();
    let batch = cursor.next_batch().await.unwrap().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.rows[0].get(0), Some(&DocValue::Int64(1)));
}

/// Property 5: `SUM(1) == COUNT(*)` for any group, since counting rows and
/// summing a constant 1 per row are the same fold over the same input.
#[tokio::test]
async fn sum_of_one_equals_count_star() {
    let (schema, table_id) = events_schema();
    let client = Arc::new(InMemoryDocumentClient::new());
    client.seed(
        "events",
        vec![
            doc_with_id_and_a("1", 10),
            doc_with_id_and_a("2", 10),
            doc_with_id_and_a("3", 20),
        ],
    );

    let locale = Locale::default();
    let tree = RelOp::Aggregate {
        input: Box::new(RelOp::Scan { table_id }),
        group_keys: vec![Expr::column("field_a")],
        aggs: vec![
            ("total".to_string(), Expr::call("sum", vec![Expr::Literal(Literal::Int64(1))])),
            ("n".to_string(), Expr::call("count", vec![])),
        ],
    };
    let ctx = PlanCompiler::compile(&tree, &schema, &locale).unwrap();
    let executor = Executor::new(client.clone());
    let mut cursor = executor.open(&ctx, 0, CancellationToken::new(), None).await.unwrap();

    let mut rows = Vec::new();
    while let Some(batch) = cursor.next_batch().await.unwrap() {
        rows.extend(batch.rows);
    }
    cursor.close().await;

    assert_eq!(rows.len(), 2, "one row per distinct field_a value");
    for row in &rows {
        let total = row.get(1);
        let n = row.get(2);
        assert_eq!(total, n, "SUM(1) must equal COUNT(*) within each group");
    }
}

/// Property 4: a predicate over a null/missing column never emits that row,
/// no matter the shape of the predicate.
#[tokio::test]
async fn three_valued_logic_excludes_null_and_missing_rows() {
    let (schema, table_id) = events_schema();
    let client = Arc::new(InMemoryDocumentClient::new());
    let null_id = DocValue::ObjectId("2".repeat(24));
    let missing_id = DocValue::ObjectId("3".repeat(24));
    client.seed(
        "events",
        vec![
            DocValue::Object(vec![
                ("_id".to_string(), DocValue::ObjectId("1".repeat(24))),
                ("fieldA".to_string(), DocValue::Int64(10)),
            ]),
            DocValue::Object(vec![("_id".to_string(), null_id.clone()), ("fieldA".to_string(), DocValue::Null)]),
            DocValue::Object(vec![("_id".to_string(), missing_id.clone())]),
        ],
    );

    let locale = Locale::default();
    async fn ids_matching(schema: &Schema, table_id: TableId, client: &Arc<InMemoryDocumentClient>, predicate: Expr, locale: &Locale) -> Vec<DocValue> {
        let tree = RelOp::Filter { input: Box::new(RelOp::Scan { table_id }), predicate };
        let ctx = PlanCompiler::compile(&tree, schema, locale).unwrap();
        let executor = Executor::new(client.clone());
        let mut cursor = executor.open(&ctx, 0, CancellationToken::new(), None).await.unwrap();
        let mut ids = Vec::new();
        while let Some(batch) = cursor.next_batch().await.unwrap() {
            for row in batch.rows {
                ids.push(row.values()[0].clone());
            }
        }
        ids
    }

    // Any predicate comparing `field_a` against a literal never surfaces
    // the null or the missing row, regardless of the predicate's shape.
    for predicate in [
        Expr::call("=", vec![Expr::column("field_a"), Expr::Literal(Literal::Int64(10))]),
        Expr::call("<>", vec![Expr::column("field_a"), Expr::Literal(Literal::Int64(999))]),
    ] {
        let ids = ids_matching(&schema, table_id, &client, predicate, &locale).await;
        assert!(!ids.contains(&null_id));
        assert!(!ids.contains(&missing_id));
    }

    // `IS NULL` itself is the one predicate that's supposed to match both.
    let ids = ids_matching(&schema, table_id, &client, Expr::call("is_null", vec![Expr::column("field_a")]), &locale).await;
    assert!(ids.contains(&null_id));
    assert!(ids.contains(&missing_id));
}

fn obj(fields: Vec<(&str, DocValue)>) -> DocValue {
    DocValue::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

async fn infer(client: &InMemoryDocumentClient, collection: &str) -> Schema {
    SchemaInference::infer(client, "_default", collection, 0, SampleStrategy::All)
        .await
        .unwrap()
}

/// S1: an array whose elements are sometimes object-shaped and sometimes
/// scalar collapses to a single VARCHAR `value` column; rendering that
/// column renders object elements as compact JSON.
#[tokio::test]
async fn array_table_with_mixed_element_shapes_renders_value_column() {
    let client = InMemoryDocumentClient::new();
    client.seed(
        "coll",
        vec![
            obj(vec![
                ("_id", DocValue::String("k0".into())),
                ("array", DocValue::Array(vec![obj(vec![("field1", DocValue::Int32(1)), ("field2", DocValue::Int32(2))])])),
            ]),
            obj(vec![
                ("_id", DocValue::String("k1".into())),
                ("array", DocValue::Array(vec![DocValue::Int32(1), DocValue::Int32(2), DocValue::Int32(3)])),
            ]),
        ],
    );
    let client = Arc::new(client);
    let schema = infer(&client, "coll").await;
    let array_table = schema.table_by_name("coll_array").expect("coll_array table");
    let table_id = array_table.table_id;

    let tree = RelOp::Sort {
        input: Box::new(RelOp::Project {
            input: Box::new(RelOp::Scan { table_id }),
            exprs: vec![
                ("id".to_string(), Expr::column("__id")),
                ("idx".to_string(), Expr::column("array_index_lvl_0")),
                ("value".to_string(), Expr::call("cast", vec![Expr::column("value"), Expr::Literal(Literal::String("VARCHAR".into()))])),
            ],
        }),
        keys: vec![
            SortKey { expr: Expr::column("id"), ascending: true },
            SortKey { expr: Expr::column("idx"), ascending: true },
        ],
    };

    let ctx = PlanCompiler::compile(&tree, &schema, &Locale::default()).unwrap();
    let executor = Executor::new(client.clone());
    let mut cursor = executor.open(&ctx, 0, CancellationToken::new(), None).await.unwrap();
    let mut rows = Vec::new();
    while let Some(batch) = cursor.next_batch().await.unwrap() {
        for row in batch.rows {
            rows.push((row.get(0).unwrap().clone(), row.get(1).unwrap().clone(), row.get(2).unwrap().clone()));
        }
    }
    cursor.close().await;

    assert_eq!(
        rows,
        vec![
            (DocValue::String("k0".into()), DocValue::Int64(0), DocValue::String("{\"field1\": 1, \"field2\": 2}".into())),
            (DocValue::String("k1".into()), DocValue::Int64(0), DocValue::String("1".into())),
            (DocValue::String("k1".into()), DocValue::Int64(1), DocValue::String("2".into())),
            (DocValue::String("k1".into()), DocValue::Int64(2), DocValue::String("3".into())),
        ]
    );
}

/// S2: a sub-document missing from one input document still yields a
/// document-child table, with exactly one row for the document that has it.
#[tokio::test]
async fn missing_subdocument_yields_document_child_row_only_for_present_docs() {
    let client = InMemoryDocumentClient::new();
    client.seed(
        "coll",
        vec![
            obj(vec![
                ("_id", DocValue::String("k0".into())),
                ("subDocument", obj(vec![("field1", DocValue::Int32(1)), ("field2", DocValue::Int32(2))])),
            ]),
            obj(vec![("_id", DocValue::String("k1".into()))]),
        ],
    );
    let client = Arc::new(client);
    let schema = infer(&client, "coll").await;
    let sub_table = schema.table_by_name("coll_subDocument").expect("coll_subDocument table");
    let table_id = sub_table.table_id;

    let tree = RelOp::Project {
        input: Box::new(RelOp::Scan { table_id }),
        exprs: vec![
            ("id".to_string(), Expr::column("__id")),
            ("field1".to_string(), Expr::column("field1")),
            ("field2".to_string(), Expr::column("field2")),
        ],
    };
    let ctx = PlanCompiler::compile(&tree, &schema, &Locale::default()).unwrap();
    let executor = Executor::new(client.clone());
    let mut cursor = executor.open(&ctx, 0, CancellationToken::new(), None).await.unwrap();
    let mut rows = Vec::new();
    while let Some(batch) = cursor.next_batch().await.unwrap() {
        for row in batch.rows {
            rows.push((row.get(0).unwrap().clone(), row.get(1).unwrap().clone(), row.get(2).unwrap().clone()));
        }
    }
    cursor.close().await;

    assert_eq!(rows, vec![(DocValue::String("k0".into()), DocValue::Int32(1), DocValue::Int32(2))]);
}

/// S7: an array of object-shaped elements flattens into one child table;
/// joined back to its root, the join yields one row per array element.
#[tokio::test]
async fn root_joined_to_object_shaped_array_yields_one_row_per_element() {
    let client = InMemoryDocumentClient::new();
    client.seed(
        "root",
        vec![obj(vec![
            ("_id", DocValue::String("k".into())),
            (
                "array",
                DocValue::Array(vec![
                    obj(vec![("field", DocValue::Int32(1)), ("field1", DocValue::String("v".into()))]),
                    obj(vec![("field", DocValue::Int32(2)), ("field2", DocValue::String("v".into()))]),
                ]),
            ),
        ])],
    );
    let client = Arc::new(client);
    let schema = infer(&client, "root").await;
    let root_id = schema.table_by_name("root").expect("root table").table_id;
    let array_id = schema.table_by_name("root_array").expect("root_array table").table_id;

    let tree = RelOp::Join {
        left: Box::new(RelOp::Scan { table_id: root_id }),
        right: Box::new(RelOp::Scan { table_id: array_id }),
        kind: JoinKind::Inner,
        condition: Expr::call("=", vec![Expr::column("__id"), Expr::column("__id")]),
    };
    let ctx = PlanCompiler::compile(&tree, &schema, &Locale::default()).unwrap();
    assert_eq!(ctx.output_columns.len(), 6, "root's __id + array's __id/array_index_lvl_0/field/field1/field2");

    let executor = Executor::new(client.clone());
    let mut cursor = executor.open(&ctx, 0, CancellationToken::new(), None).await.unwrap();
    let mut row_count = 0;
    while let Some(batch) = cursor.next_batch().await.unwrap() {
        row_count += batch.len();
    }
    cursor.close().await;
    assert_eq!(row_count, 2, "one joined row per array element");
}

/// Property 6: `root LEFT JOIN children` yields at least |root| rows.
#[tokio::test]
async fn left_join_preserves_at_least_the_parent_row_count() {
    let (schema, root_id, child_id) = root_and_child_schema();
    let client = Arc::new(InMemoryDocumentClient::new());
    client.seed(
        "root",
        vec![
            DocValue::Object(vec![
                ("_id".to_string(), DocValue::ObjectId("1".repeat(24))),
                ("children".to_string(), DocValue::Array(vec![DocValue::Object(vec![])])),
            ]),
            DocValue::Object(vec![
                ("_id".to_string(), DocValue::ObjectId("2".repeat(24))),
                // no `children` array at all
            ]),
        ],
    );

    let locale = Locale::default();
    let tree = RelOp::Join {
        left: Box::new(RelOp::Scan { table_id: root_id }),
        right: Box::new(RelOp::Scan { table_id: child_id }),
        kind: JoinKind::Left,
        condition: Expr::call("=", vec![Expr::column("__id"), Expr::column("__id")]),
    };
    let ctx = PlanCompiler::compile(&tree, &schema, &locale).unwrap();
    let executor = Executor::new(client.clone());
    let mut cursor = executor.open(&ctx, 0, CancellationToken::new(), None).await.unwrap();
    let mut row_count = 0;
    while let Some(batch) = cursor.next_batch().await.unwrap() {
        row_count += batch.len();
    }
    assert!(row_count >= 2, "left join must preserve at least the 2 root rows, got {row_count}");
}
