//! TypeLattice (§4.1): the rule set for merging observed document-field
//! types into a single relational column type. Grounded on the teacher's
//! `ir::types::Nullability::combine` — a small match-based "combine two,
//! return the least upper bound" function — generalized to the wider set
//! of document type tags.

use dr_core::{DocTypeTag, SqlType};

/// A scalar shape observed for one field across the sample, before it is
/// rendered down to a `SqlType`. Kept distinct from `SqlType` because
/// `Int32`/`Int64` must be tracked separately until they've actually been
/// observed together (the join decides BIGINT, not either input alone).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseKind {
    Bool,
    Int32,
    Int64,
    Double,
    Decimal128,
    String,
    Binary,
    ObjectId,
    DateTime,
    Timestamp,
    MinKey,
    MaxKey,
    Object,
    Array,
    /// Top of the lattice. Once reached, stays — no join moves away from it.
    Varchar,
}

impl BaseKind {
    fn from_tag(tag: DocTypeTag) -> Option<BaseKind> {
        match tag {
            DocTypeTag::Null => None,
            DocTypeTag::Bool => Some(BaseKind::Bool),
            DocTypeTag::Int32 => Some(BaseKind::Int32),
            DocTypeTag::Int64 => Some(BaseKind::Int64),
            DocTypeTag::Double => Some(BaseKind::Double),
            DocTypeTag::Decimal128 => Some(BaseKind::Decimal128),
            DocTypeTag::String => Some(BaseKind::String),
            DocTypeTag::Binary => Some(BaseKind::Binary),
            DocTypeTag::ObjectId => Some(BaseKind::ObjectId),
            DocTypeTag::DateTime => Some(BaseKind::DateTime),
            DocTypeTag::Timestamp => Some(BaseKind::Timestamp),
            DocTypeTag::MinKey => Some(BaseKind::MinKey),
            DocTypeTag::MaxKey => Some(BaseKind::MaxKey),
            DocTypeTag::Array => Some(BaseKind::Array),
            DocTypeTag::Object => Some(BaseKind::Object),
        }
    }

    fn to_sql_type(self) -> SqlType {
        match self {
            BaseKind::Bool => SqlType::Boolean,
            BaseKind::Int32 => SqlType::Integer,
            BaseKind::Int64 => SqlType::BigInt,
            BaseKind::Double => SqlType::Double,
            BaseKind::Decimal128 => SqlType::Decimal,
            BaseKind::String => SqlType::Varchar,
            BaseKind::Binary => SqlType::VarBinary,
            // No SQL type names an ObjectId or a sentinel key; the
            // document-type hint kept alongside the column (see
            // `Column::doc_type_hint`) is what `ExpressionTranslator`'s
            // ObjectId specialization (§4.4) actually keys off of.
            BaseKind::ObjectId => SqlType::Varchar,
            BaseKind::DateTime | BaseKind::Timestamp => SqlType::Timestamp,
            BaseKind::MinKey | BaseKind::MaxKey => SqlType::Varchar,
            BaseKind::Object | BaseKind::Array => SqlType::Varchar,
            BaseKind::Varchar => SqlType::Varchar,
        }
    }
}

/// Join two observed shapes, per §4.1's promotion table. Commutative;
/// callers are expected to fold this over an unordered set of
/// observations and get the same answer regardless of order (§8 property
/// 2: "the lattice has VARCHAR as its top").
fn join(a: BaseKind, b: BaseKind) -> BaseKind {
    use BaseKind::*;
    if a == b {
        return a;
    }
    match (a, b) {
        (Varchar, _) | (_, Varchar) => Varchar,
        (Int32, Int64) | (Int64, Int32) => Int64,
        (Int32, Double) | (Double, Int32) => Double,
        (Int64, Double) | (Double, Int64) => Double,
        (Int32, Decimal128) | (Decimal128, Int32) => Decimal128,
        (Int64, Decimal128) | (Decimal128, Int64) => Decimal128,
        (Double, Decimal128) | (Decimal128, Double) => Decimal128,
        (DateTime, Timestamp) | (Timestamp, DateTime) => Timestamp,
        _ => Varchar,
    }
}

/// Accumulates observations for a single field path, across an entire
/// sample, into a final `(SqlType, nullable)` pair. Never fails (§4.1):
/// the worst case is `Varchar`.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypeAccumulator {
    resolved: Option<BaseKindWrapper>,
    nullable: bool,
    /// Retained only while every non-null observation has agreed on a
    /// single tag — cleared the moment a join changes the resolved kind.
    /// Feeds `Column::doc_type_hint` for the ObjectId specialization
    /// (§4.4).
    uniform_tag: Option<DocTypeTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BaseKindWrapper(BaseKind);

impl ColumnTypeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one more observed value's type tag into the accumulator.
    pub fn observe(&mut self, tag: DocTypeTag) {
        if tag == DocTypeTag::Null {
            self.nullable = true;
            return;
        }
        let kind = match BaseKind::from_tag(tag) {
            Some(k) => k,
            None => return,
        };
        match self.resolved {
            None => {
                self.resolved = Some(BaseKindWrapper(kind));
                self.uniform_tag = Some(tag);
            }
            Some(BaseKindWrapper(current)) => {
                let joined = join(current, kind);
                if joined != current {
                    self.resolved = Some(BaseKindWrapper(joined));
                }
                if self.uniform_tag != Some(tag) {
                    self.uniform_tag = None;
                }
            }
        }
    }

    /// Resolve to a final `(type, nullable)` pair. A field observed only
    /// as null/missing across the whole sample resolves to `NULL`,
    /// nullable — there is no non-null evidence to pick anything else.
    pub fn resolve(&self) -> (SqlType, bool) {
        match self.resolved {
            Some(BaseKindWrapper(kind)) => (kind.to_sql_type(), self.nullable),
            None => (SqlType::Null, true),
        }
    }

    /// The single document type tag every non-null observation agreed on,
    /// if any. `None` once two different tags have been observed (even if
    /// they joined to the same `SqlType`, e.g. Int32 and Int64 both
    /// landing on... no, that case also clears it, since the two tags
    /// differ).
    pub fn uniform_doc_type(&self) -> Option<DocTypeTag> {
        self.uniform_tag
    }

    pub fn has_any_observation(&self) -> bool {
        self.resolved.is_some() || self.nullable
    }

    /// True when every non-null observation at this path has been an
    /// `Object` — the "object-dominant" test §4.2 uses to decide a field
    /// is a Document child rather than a plain VARCHAR column.
    pub fn is_object_only(&self) -> bool {
        matches!(self.resolved, Some(BaseKindWrapper(BaseKind::Object)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int32_int64_joins_to_bigint() {
        let mut acc = ColumnTypeAccumulator::new();
        acc.observe(DocTypeTag::Int32);
        acc.observe(DocTypeTag::Int64);
        assert_eq!(acc.resolve(), (SqlType::BigInt, false));
    }

    #[test]
    fn null_leaves_type_unchanged_but_nullable() {
        let mut acc = ColumnTypeAccumulator::new();
        acc.observe(DocTypeTag::Int32);
        acc.observe(DocTypeTag::Null);
        assert_eq!(acc.resolve(), (SqlType::Integer, true));
    }

    #[test]
    fn bool_and_numeric_collapses_to_varchar() {
        let mut acc = ColumnTypeAccumulator::new();
        acc.observe(DocTypeTag::Bool);
        acc.observe(DocTypeTag::Int32);
        assert_eq!(acc.resolve(), (SqlType::Varchar, false));
    }

    #[test]
    fn object_and_scalar_collapses_to_varchar() {
        let mut acc = ColumnTypeAccumulator::new();
        acc.observe(DocTypeTag::Object);
        acc.observe(DocTypeTag::Int32);
        assert_eq!(acc.resolve(), (SqlType::Varchar, false));
    }

    #[test]
    fn minkey_with_anything_collapses_to_varchar() {
        let mut acc = ColumnTypeAccumulator::new();
        acc.observe(DocTypeTag::MinKey);
        acc.observe(DocTypeTag::String);
        assert_eq!(acc.resolve(), (SqlType::Varchar, false));
    }

    #[test]
    fn all_null_resolves_to_null_type() {
        let mut acc = ColumnTypeAccumulator::new();
        acc.observe(DocTypeTag::Null);
        assert_eq!(acc.resolve(), (SqlType::Null, true));
    }

    #[test]
    fn adding_observations_never_moves_down_the_lattice() {
        // monotonicity (§8 property 2): once Varchar, anything further
        // leaves it at Varchar.
        let mut acc = ColumnTypeAccumulator::new();
        acc.observe(DocTypeTag::Bool);
        acc.observe(DocTypeTag::Int32);
        assert_eq!(acc.resolve().0, SqlType::Varchar);
        acc.observe(DocTypeTag::Null);
        assert_eq!(acc.resolve().0, SqlType::Varchar);
    }

    #[test]
    fn uniform_tag_tracks_single_observed_shape() {
        let mut acc = ColumnTypeAccumulator::new();
        acc.observe(DocTypeTag::ObjectId);
        assert_eq!(acc.uniform_doc_type(), Some(DocTypeTag::ObjectId));
        acc.observe(DocTypeTag::Null);
        assert_eq!(acc.uniform_doc_type(), Some(DocTypeTag::ObjectId));
        acc.observe(DocTypeTag::String);
        assert_eq!(acc.uniform_doc_type(), None);
    }
}
