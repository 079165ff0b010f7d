//! Stable identity hashing: `table_id`/`column_id` are pure functions of
//! semantic identity, not generated sequence numbers. A SHA-256-over-a-
//! string helper applied to identity tuples rather than change-detection
//! checksums.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of the given parts, joined with a separator that cannot occur
/// in a collection or field name, truncated to a 64-bit prefix for a
/// compact, still-effectively-collision-free id.
pub fn stable_hash(parts: &[&str]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]); // ASCII unit separator
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Identity of a virtual table: `hash(schema_name, collection, path)`
/// (§4.2 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId(pub u64);

impl TableId {
    pub fn new(schema_name: &str, collection: &str, path: &str) -> Self {
        TableId(stable_hash(&[schema_name, collection, path]))
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{:016x}", self.0)
    }
}

/// Identity of a column within a table: `hash(table_id, field_name)`
/// (§4.2 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId(pub u64);

impl ColumnId {
    pub fn new(table_id: TableId, field_name: &str) -> Self {
        ColumnId(stable_hash(&[&table_id.to_string(), field_name]))
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{:016x}", self.0)
    }
}
