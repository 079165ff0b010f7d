//! Schema data model (§3): virtual tables, columns, and the versioned
//! schema they belong to. Grounded on the teacher's indexed-collection
//! convention for back-referencing graphs (§9: "represent all tables in
//! an indexed collection keyed by `table_id`; foreign keys are just
//! `table_id`/`column_id` values" — avoids a cyclic object graph).

use std::collections::BTreeMap;

use dr_core::{ColumnId, DocTypeTag, ForeignKey, SqlType, TableId};
use serde::{Deserialize, Serialize};

/// One column of a virtual table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub column_id: ColumnId,
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub is_index: bool,
    pub foreign_key: Option<ForeignKey>,
    /// Dotted path from this column's table root to the source document
    /// field. `None` for synthetic columns (`array_index_lvl_N`).
    pub source_field_path: Option<String>,
    /// The single document type every non-null observation agreed on,
    /// when the column didn't collapse to VARCHAR from a mix. Feeds the
    /// ObjectId specialization in `ExpressionTranslator` (§4.4) — it is
    /// not itself a `SqlType`, since nothing in §3's type list names
    /// ObjectId directly.
    pub doc_type_hint: Option<DocTypeTag>,
}

/// What kind of document path a virtual table was derived from (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    Root,
    DocumentChild,
    ArrayChild,
}

/// A single virtual relational table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaTable {
    pub table_id: TableId,
    pub sql_name: String,
    pub kind: TableKind,
    pub source_collection: String,
    /// Dotted path from the collection root, `""` for the root table
    /// itself. Array segments are written `field[]`.
    pub path_from_root: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<ColumnId>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl SchemaTable {
    pub fn column(&self, column_id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.column_id == column_id)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// An immutable, versioned set of virtual tables for one collection (or,
/// across a full inference run, every sampled collection) (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub schema_name: String,
    pub version: u64,
    pub tables: BTreeMap<TableId, SchemaTable>,
}

impl Schema {
    pub fn new(schema_name: impl Into<String>, version: u64) -> Self {
        Schema {
            schema_name: schema_name.into(),
            version,
            tables: BTreeMap::new(),
        }
    }

    pub fn table(&self, table_id: TableId) -> Option<&SchemaTable> {
        self.tables.get(&table_id)
    }

    pub fn table_by_name(&self, sql_name: &str) -> Option<&SchemaTable> {
        self.tables.values().find(|t| t.sql_name == sql_name)
    }
}
