//! SQL column type system (§3), ported from the teacher's
//! `ir::types::SqlType`/`Nullability` and widened to the spec's exact type
//! list.

use serde::{Deserialize, Serialize};

use crate::ids::{ColumnId, TableId};

/// A SQL column type, drawn from §3's fixed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Double,
    Varchar,
    VarBinary,
    Date,
    Time,
    Timestamp,
    Null,
}

impl SqlType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlType::TinyInt
                | SqlType::SmallInt
                | SqlType::Integer
                | SqlType::BigInt
                | SqlType::Decimal
                | SqlType::Double
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, SqlType::Date | SqlType::Time | SqlType::Timestamp)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::TinyInt => "TINYINT",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Decimal => "DECIMAL",
            SqlType::Double => "DOUBLE",
            SqlType::Varchar => "VARCHAR",
            SqlType::VarBinary => "VARBINARY",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Null => "NULL",
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Nullability of a column or expression. Distinct from `SqlType::Null`:
/// a column can be `Integer` and `Nullable` at once (missing/null
/// observations move a column to `Nullable` without changing its type,
/// §4.1 "Any ⊔ Null leaves type unchanged; the column becomes nullable").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nullability {
    NotNull,
    Nullable,
}

impl Nullability {
    pub fn combine(self, other: Nullability) -> Nullability {
        match (self, other) {
            (Nullability::Nullable, _) | (_, Nullability::Nullable) => Nullability::Nullable,
            _ => Nullability::NotNull,
        }
    }

    pub fn is_nullable(self) -> bool {
        matches!(self, Nullability::Nullable)
    }
}

/// A foreign-key reference from one column to another table's primary-key
/// column (§3: "for every foreign key `(C, T', C')`, `T'.C'` is `T'`'s
/// primary key and `C`'s declared type equals `T'.C'`'s").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: ColumnId,
    pub references_table: TableId,
    pub references_column: ColumnId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullability_combine() {
        assert_eq!(
            Nullability::NotNull.combine(Nullability::NotNull),
            Nullability::NotNull
        );
        assert_eq!(
            Nullability::NotNull.combine(Nullability::Nullable),
            Nullability::Nullable
        );
    }

    #[test]
    fn type_predicates() {
        assert!(SqlType::BigInt.is_numeric());
        assert!(SqlType::BigInt.is_integer());
        assert!(!SqlType::Double.is_integer());
        assert!(SqlType::Timestamp.is_temporal());
        assert!(!SqlType::Varchar.is_temporal());
    }

    #[test]
    fn display_names() {
        assert_eq!(SqlType::Integer.display_name(), "INTEGER");
        assert_eq!(SqlType::VarBinary.display_name(), "VARBINARY");
    }
}
