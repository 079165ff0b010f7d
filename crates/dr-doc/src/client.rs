//! `DocumentClient`: the wire-level document-database client, treated as
//! a black box supporting `run_aggregate(collection, pipeline) -> cursor`
//! and `sample(collection, n, strategy) -> iterator`. An `async_trait`,
//! `Send + Sync`, one method per black-box operation.

use async_trait::async_trait;
use dr_core::{DocValue, SampleStrategy};

use crate::error::DocClientResult;
use crate::stage::Stage;

/// A raw document cursor returned by `run_aggregate`. Distinct from
/// `dr_exec::Cursor`: this one yields raw `DocValue` documents with no
/// notion of declared SQL column types or fetch-size batching — those are
/// the executor's job (§4.7), layered on top.
#[async_trait]
pub trait RawCursor: Send {
    /// Pull the next document, or `None` at end of stream.
    async fn next(&mut self) -> DocClientResult<Option<DocValue>>;

    /// Release any resources held by this cursor. Safe to call more than
    /// once.
    async fn close(&mut self);
}

/// The document-database client, treated as an external collaborator
/// (§1). Implementations of this trait are NOT part of the core; only the
/// in-memory implementation in this crate exists for tests and the CLI's
/// demo mode.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Run an aggregation pipeline against `collection`, returning a
    /// streaming cursor over the result documents.
    async fn run_aggregate(
        &self,
        collection: &str,
        pipeline: &[Stage],
    ) -> DocClientResult<Box<dyn RawCursor>>;

    /// Draw up to `n` documents from `collection` using `strategy`
    /// (`all` ignores `n`, §4.2).
    async fn sample(
        &self,
        collection: &str,
        n: u32,
        strategy: SampleStrategy,
    ) -> DocClientResult<Vec<DocValue>>;
}
