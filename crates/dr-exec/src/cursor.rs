//! `Cursor`: pulls raw documents from a `dr_doc::RawCursor`, coerces each
//! to its declared column type, and groups them into fetch-size-bounded
//! `Batch`es. A per-row coercion failure is recorded and execution keeps
//! going rather than aborting the whole run.

use std::time::{Duration, Instant};

use dr_core::{DocValue, SqlType};
use dr_doc::{memory, RawCursor};
use dr_plan::OutputColumn;

use crate::cancel::CancellationToken;
use crate::error::{ExecError, ExecResult, RowWarning};
use crate::Batch;
use crate::Row;

/// Streaming, type-coercing view over one compiled query's execution
/// (§4.7, §6.2). Closes its underlying `RawCursor` on drop-adjacent
/// paths is the caller's job via `close()`; the cursor itself never
/// closes on an intermediate batch (§4.7 "intermediate batches must not
/// trigger close").
pub struct Cursor {
    raw: Box<dyn RawCursor>,
    columns: Vec<OutputColumn>,
    fetch_size: usize,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    warnings: Vec<RowWarning>,
    exhausted: bool,
}

/// §4.7: "fetch_size (default 2000, caller-overridable; 0 means
/// implementation-chosen)".
const DEFAULT_FETCH_SIZE: usize = 2000;

impl Cursor {
    pub(crate) fn new(
        raw: Box<dyn RawCursor>,
        columns: Vec<OutputColumn>,
        fetch_size: usize,
        cancel: CancellationToken,
        query_timeout: Option<Duration>,
    ) -> Self {
        Cursor {
            raw,
            columns,
            fetch_size: if fetch_size == 0 { DEFAULT_FETCH_SIZE } else { fetch_size },
            cancel,
            deadline: query_timeout.map(|d| Instant::now() + d),
            warnings: Vec::new(),
            exhausted: false,
        }
    }

    /// Pull the next batch, at most `fetch_size` rows, coercing each raw
    /// document to its declared column types as it is read. `None` once
    /// the underlying cursor is exhausted. Checks cancellation and the
    /// query deadline at each row (§5: "exactly two suspension points ...
    /// no other core operation blocks").
    pub async fn next_batch(&mut self) -> ExecResult<Option<Batch>> {
        if self.exhausted {
            return Ok(None);
        }
        let mut rows = Vec::with_capacity(self.fetch_size);
        while rows.len() < self.fetch_size {
            if self.cancel.is_cancelled() {
                self.raw.close().await;
                return Err(ExecError::Cancelled);
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() > deadline {
                    self.raw.close().await;
                    return Err(ExecError::Timeout);
                }
            }
            let Some(doc) = self.raw.next().await? else {
                self.exhausted = true;
                break;
            };
            if let Some(row) = self.coerce_row(&doc) {
                rows.push(row);
            }
        }
        if rows.is_empty() && self.exhausted {
            return Ok(None);
        }
        Ok(Some(Batch::new(rows)))
    }

    pub async fn close(&mut self) {
        self.raw.close().await;
        self.exhausted = true;
    }

    /// Coercion warnings accumulated so far (§7 `DataTypeConflict`: "the
    /// offending row's column becomes NULL and the error is recorded as a
    /// warning on the cursor; execution continues").
    pub fn warnings(&self) -> &[RowWarning] {
        &self.warnings
    }

    /// Coerce one raw document into a `Row`, or drop it entirely and
    /// record a warning if a non-nullable primary-key-like column comes
    /// back missing/NULL (§4.7 "fail the row, continue").
    fn coerce_row(&mut self, doc: &DocValue) -> Option<Row> {
        let mut values = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let raw = memory::get_path(doc, &col.name);
            let is_missing_or_null = matches!(raw, None | Some(DocValue::Null));
            if is_missing_or_null {
                if col.nullable {
                    values.push(DocValue::Null);
                    continue;
                }
                log::warn!("dropping row: column '{}' is non-nullable but missing", col.name);
                self.warnings.push(RowWarning {
                    column: col.name.clone(),
                    message: "missing value for a non-nullable column".to_string(),
                });
                return None;
            }
            values.push(coerce(raw.unwrap(), col.sql_type));
        }
        Some(Row::new(values))
    }
}

/// Value-level type coercion (§4.7): numeric widening and VARCHAR
/// rendering are exactly `dr_doc::memory::cast_value`'s job already, used
/// here as the execution-time counterpart to the CAST() expression it
/// backs at compile time.
fn coerce(raw: &DocValue, target: SqlType) -> DocValue {
    memory::cast_value(raw, target)
}

#[cfg(test)]
#[path = "cursor_test.rs"]
mod tests;
