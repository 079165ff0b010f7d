use super::*;
use dr_core::DocValue;
use dr_doc::InMemoryDocumentClient;
use dr_plan::OutputColumn;

fn seeded_client(docs: Vec<DocValue>) -> InMemoryDocumentClient {
    let client = InMemoryDocumentClient::new();
    client.seed("widgets", docs);
    client
}

async fn open_cursor(
    client: &InMemoryDocumentClient,
    columns: Vec<OutputColumn>,
    fetch_size: usize,
) -> Cursor {
    let raw = client.run_aggregate("widgets", &[]).await.unwrap();
    Cursor::new(raw, columns, fetch_size, CancellationToken::new(), None)
}

#[tokio::test]
async fn batches_are_bounded_by_fetch_size() {
    let docs: Vec<DocValue> = (0..5)
        .map(|i| DocValue::Object(vec![("n".to_string(), DocValue::Int64(i))]))
        .collect();
    let client = seeded_client(docs);
    let columns = vec![OutputColumn { name: "n".to_string(), sql_type: SqlType::BigInt, nullable: false }];
    let mut cursor = open_cursor(&client, columns, 2).await;

    let first = cursor.next_batch().await.unwrap().unwrap();
    assert_eq!(first.len(), 2);
    let second = cursor.next_batch().await.unwrap().unwrap();
    assert_eq!(second.len(), 2);
    let third = cursor.next_batch().await.unwrap().unwrap();
    assert_eq!(third.len(), 1);
    assert!(cursor.next_batch().await.unwrap().is_none());
}

#[tokio::test]
async fn fetch_size_zero_falls_back_to_the_default() {
    let docs = vec![DocValue::Object(vec![("n".to_string(), DocValue::Int64(1))])];
    let client = seeded_client(docs);
    let columns = vec![OutputColumn { name: "n".to_string(), sql_type: SqlType::BigInt, nullable: false }];
    let cursor = open_cursor(&client, columns, 0).await;
    assert_eq!(cursor.fetch_size, DEFAULT_FETCH_SIZE);
}

#[tokio::test]
async fn missing_field_in_a_nullable_column_becomes_null() {
    let docs = vec![DocValue::Object(vec![])];
    let client = seeded_client(docs);
    let columns = vec![OutputColumn { name: "maybe".to_string(), sql_type: SqlType::Varchar, nullable: true }];
    let mut cursor = open_cursor(&client, columns, 10).await;
    let batch = cursor.next_batch().await.unwrap().unwrap();
    assert_eq!(batch.rows[0].get(0), Some(&DocValue::Null));
}

#[tokio::test]
async fn missing_field_in_a_non_nullable_column_drops_the_row_and_warns() {
    let docs = vec![
        DocValue::Object(vec![]),
        DocValue::Object(vec![("id".to_string(), DocValue::Int64(7))]),
    ];
    let client = seeded_client(docs);
    let columns = vec![OutputColumn { name: "id".to_string(), sql_type: SqlType::BigInt, nullable: false }];
    let mut cursor = open_cursor(&client, columns, 10).await;
    let batch = cursor.next_batch().await.unwrap().unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.rows[0].get(0), Some(&DocValue::Int64(7)));
    assert_eq!(cursor.warnings().len(), 1);
    assert_eq!(cursor.warnings()[0].column, "id");
}

#[tokio::test]
async fn object_and_array_columns_render_as_canonical_json_varchar() {
    let docs = vec![DocValue::Object(vec![(
        "tags".to_string(),
        DocValue::Array(vec![DocValue::String("a".to_string()), DocValue::String("b".to_string())]),
    )])];
    let client = seeded_client(docs);
    let columns = vec![OutputColumn { name: "tags".to_string(), sql_type: SqlType::Varchar, nullable: true }];
    let mut cursor = open_cursor(&client, columns, 10).await;
    let batch = cursor.next_batch().await.unwrap().unwrap();
    match batch.rows[0].get(0) {
        Some(DocValue::String(s)) => assert!(s.contains('a') && s.contains('b')),
        other => panic!("expected a rendered JSON string, got {other:?}"),
    }
}

#[tokio::test]
async fn cancellation_is_observed_before_the_next_row_is_pulled() {
    let docs: Vec<DocValue> = (0..3)
        .map(|i| DocValue::Object(vec![("n".to_string(), DocValue::Int64(i))]))
        .collect();
    let client = seeded_client(docs);
    let columns = vec![OutputColumn { name: "n".to_string(), sql_type: SqlType::BigInt, nullable: false }];
    let raw = client.run_aggregate("widgets", &[]).await.unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let mut cursor = Cursor::new(raw, columns, 10, token, None);
    let err = cursor.next_batch().await.unwrap_err();
    assert!(matches!(err, ExecError::Cancelled));
}
