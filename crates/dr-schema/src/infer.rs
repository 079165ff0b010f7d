//! SchemaInference (§4.2): samples a collection, walks every document,
//! and emits a stable set of virtual tables. Grounded on the teacher's
//! `pass::type_inference`'s recursive-walk-over-a-tree shape, generalized
//! from diagnostics collection to schema materialization.

use std::collections::{BTreeMap, HashMap};

use dr_core::{ColumnId, DocValue, ForeignKey, SampleStrategy, TableId};
use dr_doc::DocumentClient;

use crate::error::{SchemaError, SchemaResult};
use crate::lattice::ColumnTypeAccumulator;
use crate::model::{Column, Schema, SchemaTable, TableKind};

/// Per-document-path observations accumulated across the whole sample.
#[derive(Default)]
struct FieldNode {
    scalar: ColumnTypeAccumulator,
    ever_array: bool,
    /// Merged observations of this field's array elements, when any were
    /// seen as an array. Boxed since `FieldNode` is otherwise unsized
    /// through this self-reference.
    array_element: Option<Box<FieldNode>>,
    object_children: HashMap<String, FieldNode>,
}

impl FieldNode {
    fn observe(&mut self, value: &DocValue) {
        self.scalar.observe(value.type_tag());
        match value {
            DocValue::Object(fields) => {
                for (name, v) in fields {
                    self.object_children.entry(name.clone()).or_default().observe(v);
                }
            }
            DocValue::Array(items) => {
                self.ever_array = true;
                let elem = self.array_element.get_or_insert_with(Box::default);
                for item in items {
                    elem.observe(item);
                }
            }
            _ => {}
        }
    }
}

pub struct SchemaInference;

impl SchemaInference {
    /// Run inference for one collection, producing an unversioned
    /// `Schema` whose `version` field the caller (typically a
    /// `SchemaStore::write`) fills in on persist.
    ///
    /// Draws `sample_limit` documents via `strategy` (`all` ignores the
    /// limit), walks them, and materializes tables in a post-order sweep
    /// (§4.2 steps 1-5). Zero samples means the collection is left out of
    /// the returned schema entirely — never an empty-table placeholder
    /// (§4.2 "Zero samples -> the collection is absent from the schema").
    pub async fn infer(
        client: &dyn DocumentClient,
        schema_name: &str,
        collection: &str,
        sample_limit: u32,
        strategy: SampleStrategy,
    ) -> SchemaResult<Schema> {
        let docs = client
            .sample(collection, sample_limit, strategy)
            .await
            .map_err(|source| SchemaError::Sampling {
                collection: collection.to_string(),
                source,
            })?;

        let mut schema = Schema::new(schema_name, 0);
        if docs.is_empty() {
            return Ok(schema);
        }

        let mut root = FieldNode::default();
        for doc in &docs {
            root.observe(doc);
        }

        build_root_table(schema_name, collection, &root, &mut schema.tables);
        Ok(schema)
    }
}

fn table_sql_name(collection: &str, path: &str) -> String {
    if path.is_empty() {
        collection.to_string()
    } else {
        format!("{collection}_{}", path.replace("[]", "").replace('.', "_"))
    }
}

fn next_array_index_level(parent_pk: &[Column]) -> usize {
    parent_pk
        .iter()
        .filter(|c| c.name.starts_with("array_index_lvl_"))
        .count()
}

fn build_root_table(
    schema_name: &str,
    collection: &str,
    root: &FieldNode,
    tables: &mut BTreeMap<TableId, SchemaTable>,
) -> TableId {
    let table_id = TableId::new(schema_name, collection, "");

    let id_field = root.object_children.get("_id");
    let (id_type, _) = id_field
        .map(|n| n.scalar.resolve())
        .unwrap_or((dr_core::SqlType::Varchar, false));
    let id_doc_hint = id_field.and_then(|n| n.scalar.uniform_doc_type());
    let pk_column_id = ColumnId::new(table_id, "__id");
    let pk_column = Column {
        column_id: pk_column_id,
        name: "__id".to_string(),
        sql_type: id_type,
        nullable: false,
        is_primary_key: true,
        is_index: true,
        foreign_key: None,
        source_field_path: Some("_id".to_string()),
        doc_type_hint: id_doc_hint,
    };

    let mut table = SchemaTable {
        table_id,
        sql_name: table_sql_name(collection, ""),
        kind: TableKind::Root,
        source_collection: collection.to_string(),
        path_from_root: String::new(),
        columns: vec![pk_column.clone()],
        primary_key: vec![pk_column_id],
        foreign_keys: vec![],
    };

    let mut field_names: Vec<&String> = root.object_children.keys().filter(|n| *n != "_id").collect();
    field_names.sort();
    let root_pk_columns = vec![pk_column];
    for name in field_names {
        let child = &root.object_children[name];
        collect_field(
            schema_name,
            collection,
            "",
            name,
            child,
            table_id,
            &root_pk_columns,
            &mut table.columns,
            tables,
        );
    }

    tables.insert(table_id, table);
    table_id
}

/// Decide what `name` (a field directly under `parent_path`) becomes:
/// a scalar column appended to `out_columns`, a new Document-child table,
/// or a new Array-child table. Shared by the root table and every
/// Document/Array-child table, since the decision rule is the same at
/// every level (§4.2 step 3).
#[allow(clippy::too_many_arguments)]
fn collect_field(
    schema_name: &str,
    collection: &str,
    parent_path: &str,
    name: &str,
    child: &FieldNode,
    parent_table_id: TableId,
    parent_pk_columns: &[Column],
    out_columns: &mut Vec<Column>,
    tables: &mut BTreeMap<TableId, SchemaTable>,
) {
    let child_path = if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{parent_path}.{name}")
    };

    if child.ever_array {
        build_array_child(
            schema_name,
            collection,
            &child_path,
            child,
            parent_table_id,
            parent_pk_columns,
            tables,
        );
    } else if child.scalar.is_object_only() {
        build_document_child(
            schema_name,
            collection,
            &child_path,
            child,
            parent_table_id,
            parent_pk_columns,
            tables,
        );
    } else {
        let (sql_type, nullable) = child.scalar.resolve();
        out_columns.push(Column {
            column_id: ColumnId::new(parent_table_id, name),
            name: name.to_string(),
            sql_type,
            nullable,
            is_primary_key: false,
            is_index: false,
            foreign_key: None,
            source_field_path: Some(child_path),
            doc_type_hint: child.scalar.uniform_doc_type(),
        });
    }
}

fn inherited_pk(
    child_table_id: TableId,
    parent_table_id: TableId,
    parent_pk_columns: &[Column],
) -> (Vec<Column>, Vec<ForeignKey>) {
    let mut columns = Vec::with_capacity(parent_pk_columns.len());
    let mut fks = Vec::with_capacity(parent_pk_columns.len());
    for parent_col in parent_pk_columns {
        let own_id = ColumnId::new(child_table_id, &parent_col.name);
        columns.push(Column {
            column_id: own_id,
            name: parent_col.name.clone(),
            sql_type: parent_col.sql_type,
            nullable: false,
            is_primary_key: true,
            is_index: true,
            foreign_key: Some(ForeignKey {
                column: own_id,
                references_table: parent_table_id,
                references_column: parent_col.column_id,
            }),
            source_field_path: parent_col.source_field_path.clone(),
            doc_type_hint: parent_col.doc_type_hint,
        });
        fks.push(ForeignKey {
            column: own_id,
            references_table: parent_table_id,
            references_column: parent_col.column_id,
        });
    }
    (columns, fks)
}

#[allow(clippy::too_many_arguments)]
fn build_document_child(
    schema_name: &str,
    collection: &str,
    path: &str,
    node: &FieldNode,
    parent_table_id: TableId,
    parent_pk_columns: &[Column],
    tables: &mut BTreeMap<TableId, SchemaTable>,
) -> TableId {
    let table_id = TableId::new(schema_name, collection, path);
    let (mut columns, foreign_keys) = inherited_pk(table_id, parent_table_id, parent_pk_columns);
    let primary_key: Vec<ColumnId> = columns.iter().map(|c| c.column_id).collect();
    let pk_columns_snapshot = columns.clone();

    let mut names: Vec<&String> = node.object_children.keys().collect();
    names.sort();
    for name in names {
        let field = &node.object_children[name];
        collect_field(
            schema_name,
            collection,
            path,
            name,
            field,
            table_id,
            &pk_columns_snapshot,
            &mut columns,
            tables,
        );
    }

    tables.insert(
        table_id,
        SchemaTable {
            table_id,
            sql_name: table_sql_name(collection, path),
            kind: TableKind::DocumentChild,
            source_collection: collection.to_string(),
            path_from_root: path.to_string(),
            columns,
            primary_key,
            foreign_keys,
        },
    );
    table_id
}

#[allow(clippy::too_many_arguments)]
fn build_array_child(
    schema_name: &str,
    collection: &str,
    path: &str,
    node: &FieldNode,
    parent_table_id: TableId,
    parent_pk_columns: &[Column],
    tables: &mut BTreeMap<TableId, SchemaTable>,
) -> TableId {
    let table_path = format!("{path}[]");
    let table_id = TableId::new(schema_name, collection, &table_path);
    let (mut columns, foreign_keys) = inherited_pk(table_id, parent_table_id, parent_pk_columns);

    let index_level = next_array_index_level(parent_pk_columns);
    let index_col_id = ColumnId::new(table_id, &format!("array_index_lvl_{index_level}"));
    columns.push(Column {
        column_id: index_col_id,
        name: format!("array_index_lvl_{index_level}"),
        sql_type: dr_core::SqlType::Integer,
        nullable: false,
        is_primary_key: true,
        is_index: true,
        foreign_key: None,
        source_field_path: None,
        doc_type_hint: None,
    });
    let primary_key: Vec<ColumnId> = columns.iter().map(|c| c.column_id).collect();
    let pk_columns_snapshot = columns.clone();

    let element = node.array_element.as_deref();
    let is_object_shaped = element.map(|e| e.scalar.is_object_only()).unwrap_or(false);

    if is_object_shaped {
        let element = element.unwrap();
        let mut names: Vec<&String> = element.object_children.keys().collect();
        names.sort();
        for name in names {
            let field = &element.object_children[name];
            collect_field(
                schema_name,
                collection,
                path,
                name,
                field,
                table_id,
                &pk_columns_snapshot,
                &mut columns,
                tables,
            );
        }
    } else {
        // Scalar (or mixed scalar/object, which the lattice already
        // collapses to VARCHAR) element shape: a single `value` column.
        let mut value_acc = ColumnTypeAccumulator::new();
        if let Some(element) = element {
            // Re-fold every tag the element ever saw, including `Object`
            // when elements were genuinely mixed (S1).
            value_acc = element.scalar.clone();
        }
        let (sql_type, nullable) = value_acc.resolve();
        columns.push(Column {
            column_id: ColumnId::new(table_id, "value"),
            name: "value".to_string(),
            sql_type,
            nullable,
            is_primary_key: false,
            is_index: false,
            foreign_key: None,
            source_field_path: Some(path.to_string()),
            doc_type_hint: value_acc.uniform_doc_type(),
        });
    }

    tables.insert(
        table_id,
        SchemaTable {
            table_id,
            sql_name: table_sql_name(collection, path),
            kind: TableKind::ArrayChild,
            source_collection: collection.to_string(),
            path_from_root: table_path,
            columns,
            primary_key,
            foreign_keys,
        },
    );
    table_id
}

#[cfg(test)]
#[path = "infer_test.rs"]
mod tests;
