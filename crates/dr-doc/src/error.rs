//! Error types for dr-doc.

use thiserror::Error;

/// Errors a `DocumentClient` implementation can report. Transport
/// failures belong here; everything else is the core's own business, not
/// the document client's.
#[derive(Error, Debug)]
pub enum DocClientError {
    #[error("document client transport error: {0}")]
    Transport(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("unsupported stage for this client: {0}")]
    UnsupportedStage(String),
}

pub type DocClientResult<T> = Result<T, DocClientError>;
