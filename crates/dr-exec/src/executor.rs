//! `Executor` (§4.7, §6.2): the one thing in this crate that actually
//! talks to a `DocumentClient`. Everything upstream (dr-plan) only ever
//! produces a `QueryContext`; nothing runs until `Executor::open`.

use std::sync::Arc;
use std::time::Duration;

use dr_doc::DocumentClient;
use dr_plan::QueryContext;

use crate::cancel::CancellationToken;
use crate::cursor::Cursor;
use crate::error::ExecResult;

/// Opens `QueryContext`s against one `DocumentClient` (§5: "connection to
/// document-client is shared across queries through a pool; the core
/// treats acquisition as atomic"). Cheap to clone — holds only an `Arc`.
#[derive(Clone)]
pub struct Executor {
    client: Arc<dyn DocumentClient>,
}

impl Executor {
    pub fn new(client: Arc<dyn DocumentClient>) -> Self {
        Executor { client }
    }

    /// Run `ctx`'s pipeline and return a streaming, type-coercing
    /// `Cursor` over it. `fetch_size` of `0` lets the cursor pick its own
    /// default (§4.7). `query_timeout` bounds wall-clock time between
    /// this call and the final row (§5); `None` means no query timeout.
    pub async fn open(
        &self,
        ctx: &QueryContext,
        fetch_size: usize,
        cancel: CancellationToken,
        query_timeout: Option<Duration>,
    ) -> ExecResult<Cursor> {
        let raw = self.client.run_aggregate(&ctx.collection, &ctx.stages).await?;
        Ok(Cursor::new(raw, ctx.output_columns.clone(), fetch_size, cancel, query_timeout))
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
