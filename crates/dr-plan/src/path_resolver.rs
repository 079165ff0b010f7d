//! PathResolver (§4.3): turns a virtual table's `path_from_root` (e.g.
//! `"a.b[].c[]"`) into the ordered, de-duplicated `match`/`unwind` stages
//! needed to bring it to top level. `preserveNullAndEmpty` is always
//! `true` on every unwind emitted here (§4.3) — selectivity on top of
//! that is a separate, explicit `Filter` translated by
//! `OperatorTranslator`.

use dr_doc::{AggExpr, Stage};
use std::collections::HashSet;

/// One array boundary crossed on the way from the collection root to a
/// table's rows, in traversal order. Shared with `OperatorTranslator`,
/// which needs the same boundaries to line up a table's
/// `array_index_lvl_N` columns with the index field `resolve` assigned.
pub(crate) fn array_paths(table_path: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut prefix = String::new();
    let mut rest = table_path;
    while let Some(idx) = rest.find("[]") {
        let seg = &rest[..idx];
        if !prefix.is_empty() && !seg.is_empty() {
            prefix.push('.');
        }
        prefix.push_str(seg);
        paths.push(prefix.clone());
        rest = &rest[idx + 2..];
        rest = rest.strip_prefix('.').unwrap_or(rest);
    }
    paths
}

/// Stateful emitter shared across a whole `PlanCompiler::compile` run, so
/// that a path unwound by one `Scan` is never unwound again by another
/// (§8 property 3: "at most one `$unwind` per document path") and index
/// variables are numbered once, in the order they are first introduced.
#[derive(Debug, Default)]
pub struct PathResolver {
    /// Array paths already unwound, mapped to their assigned index field
    /// name.
    unwound: std::collections::HashMap<String, String>,
    /// Document-only (no array) paths already existence-checked.
    doc_matched: HashSet<String>,
    next_index: usize,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index field name assigned to `path`, if it has already been
    /// unwound.
    pub fn index_field_for(&self, path: &str) -> Option<&str> {
        self.unwound.get(path).map(|s| s.as_str())
    }

    /// Emit the stages needed to bring `table_path` to top level,
    /// skipping anything this resolver has already emitted.
    pub fn resolve(&mut self, table_path: &str) -> Vec<Stage> {
        let arrays = array_paths(table_path);
        let mut stages = Vec::new();

        if arrays.is_empty() {
            if !table_path.is_empty() && self.doc_matched.insert(table_path.to_string()) {
                stages.push(match_exists(table_path));
            }
            return stages;
        }

        if !self.unwound.contains_key(&arrays[0]) && self.doc_matched.insert(arrays[0].clone()) {
            stages.push(match_exists(&arrays[0]));
        }

        for path in arrays {
            if self.unwound.contains_key(&path) {
                continue;
            }
            let index_field = format!("array_index_lvl_{}", self.next_index);
            self.next_index += 1;
            stages.push(Stage::Unwind {
                path: path.clone(),
                preserve_null_and_empty: true,
                index_field: Some(index_field.clone()),
            });
            self.unwound.insert(path, index_field);
        }

        stages
    }
}

fn match_exists(path: &str) -> Stage {
    Stage::Match {
        expr: AggExpr::Exists {
            field: path.to_string(),
            negate: false,
        },
    }
}
