//! `visible_columns` bookkeeping (§4.5): the ordered, named column list an
//! `OperatorTranslator` carries from one operator to the next, distinct
//! from `dr_schema::SchemaTable` (the *persisted* virtual table) — this
//! is the *plan-time* view as it's renamed/reshaped by Project/Aggregate/
//! Join. Grounded on the teacher's `RelSchema`.

use dr_core::{ColumnId, DocTypeTag, SqlType};
use serde::{Deserialize, Serialize};

/// One column visible at a point in the plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibleColumn {
    pub name: String,
    /// `None` for a computed expression column with no single backing
    /// virtual-table column (e.g. `a + b`).
    pub column_id: Option<ColumnId>,
    pub sql_type: SqlType,
    pub nullable: bool,
    /// Resolved document field path, used by `PathResolver`/
    /// `ExpressionTranslator` to address the underlying value once
    /// unwound to top level.
    pub field_path: String,
    /// Carried straight from `dr_schema::Column::doc_type_hint`; drives
    /// the ObjectId comparison specialization (§4.4). `None` for
    /// computed columns and columns that collapsed to VARCHAR from a
    /// mixed sample.
    pub doc_type_hint: Option<DocTypeTag>,
}

/// The ordered, named output of one plan node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelSchema {
    pub columns: Vec<VisibleColumn>,
}

impl RelSchema {
    pub fn new(columns: Vec<VisibleColumn>) -> Self {
        RelSchema { columns }
    }

    pub fn empty() -> Self {
        RelSchema::default()
    }

    pub fn find(&self, name: &str) -> Option<&VisibleColumn> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn merge(left: &RelSchema, right: &RelSchema) -> Self {
        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());
        RelSchema { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All columns marked nullable, as on the preserved side of a left join
    /// where an unmatched row leaves every column missing regardless of the
    /// schema's own nullability.
    pub fn all_nullable(&self) -> Self {
        let columns = self
            .columns
            .iter()
            .cloned()
            .map(|mut c| {
                c.nullable = true;
                c
            })
            .collect();
        RelSchema { columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> VisibleColumn {
        VisibleColumn {
            name: name.to_string(),
            column_id: None,
            sql_type: SqlType::Varchar,
            nullable: false,
            field_path: name.to_string(),
            doc_type_hint: None,
        }
    }

    #[test]
    fn find_is_case_insensitive() {
        let schema = RelSchema::new(vec![col("Field")]);
        assert!(schema.find("field").is_some());
        assert!(schema.find("FIELD").is_some());
        assert!(schema.find("other").is_none());
    }

    #[test]
    fn all_nullable_relaxes_every_column() {
        let schema = RelSchema::new(vec![col("a"), col("b")]);
        let relaxed = schema.all_nullable();
        assert!(relaxed.columns.iter().all(|c| c.nullable));
        assert!(!schema.columns.iter().all(|c| c.nullable));
    }

    #[test]
    fn merge_concatenates_in_order() {
        let left = RelSchema::new(vec![col("a")]);
        let right = RelSchema::new(vec![col("b")]);
        let merged = RelSchema::merge(&left, &right);
        assert_eq!(merged.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
