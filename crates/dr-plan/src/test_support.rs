//! Schema fixtures shared by `operator_translator`'s and `compiler`'s
//! test modules: one root `orders` table plus one `items[]` array child
//! with an inherited foreign key, built the way `dr_schema::infer`
//! itself would have produced them.
#![cfg(test)]

use dr_core::{ColumnId, DocTypeTag, ForeignKey, SqlType, TableId};
use dr_schema::{Column, Schema, SchemaTable, TableKind};
use std::collections::BTreeMap;

pub(crate) fn root_and_item_tables() -> (Schema, TableId, TableId) {
    let root_id = TableId::new("s", "orders", "");
    let root_pk = ColumnId::new(root_id, "__id");
    let root_table = SchemaTable {
        table_id: root_id,
        sql_name: "orders".to_string(),
        kind: TableKind::Root,
        source_collection: "orders".to_string(),
        path_from_root: String::new(),
        columns: vec![
            Column {
                column_id: root_pk,
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
                column_id: ColumnId::new(root_id, "status"),
                name: "status".to_string(),
                sql_type: SqlType::Varchar,
                nullable: true,
                is_primary_key: false,
                is_index: false,
                foreign_key: None,
                source_field_path: Some("status".to_string()),
                doc_type_hint: None,
            },
        ],
        primary_key: vec![root_pk],
        foreign_keys: vec![],
    };

    let item_id = TableId::new("s", "orders", "items[]");
    let item_fk = ColumnId::new(item_id, "__id");
    let item_idx = ColumnId::new(item_id, "array_index_lvl_0");
    let item_table = SchemaTable {
        table_id: item_id,
        sql_name: "orders_items".to_string(),
        kind: TableKind::ArrayChild,
        source_collection: "orders".to_string(),
        path_from_root: "items[]".to_string(),
        columns: vec![
            Column {
                column_id: item_fk,
                name: "__id".to_string(),
                sql_type: SqlType::Varchar,
                nullable: false,
                is_primary_key: true,
                is_index: true,
                foreign_key: Some(ForeignKey {
                    column: item_fk,
                    references_table: root_id,
                    references_column: root_pk,
                }),
                source_field_path: Some("_id".to_string()),
                doc_type_hint: Some(DocTypeTag::ObjectId),
            },
            Column {
                column_id: item_idx,
                name: "array_index_lvl_0".to_string(),
                sql_type: SqlType::Integer,
                nullable: false,
                is_primary_key: true,
                is_index: true,
                foreign_key: None,
                source_field_path: None,
                doc_type_hint: None,
            },
            Column {
                column_id: ColumnId::new(item_id, "sku"),
                name: "sku".to_string(),
                sql_type: SqlType::Varchar,
                nullable: true,
                is_primary_key: false,
                is_index: false,
                foreign_key: None,
                source_field_path: Some("sku".to_string()),
                doc_type_hint: None,
            },
            Column {
                column_id: ColumnId::new(item_id, "qty"),
                name: "qty".to_string(),
                sql_type: SqlType::Integer,
                nullable: true,
                is_primary_key: false,
                is_index: false,
                foreign_key: None,
                source_field_path: Some("qty".to_string()),
                doc_type_hint: None,
            },
        ],
        primary_key: vec![item_fk, item_idx],
        foreign_keys: vec![ForeignKey {
            column: item_fk,
            references_table: root_id,
            references_column: root_pk,
        }],
    };

    let mut tables = BTreeMap::new();
    tables.insert(root_id, root_table);
    tables.insert(item_id, item_table);
    (Schema { schema_name: "s".to_string(), version: 1, tables }, root_id, item_id)
}
