//! dr-exec - runs a `dr_plan::QueryContext` through a `DocumentClient`
//! and streams rows back in fetch-size batches with server-side type
//! coercion (§4.7, §6.2, §6.5).

pub mod batch;
pub mod cancel;
pub mod cursor;
pub mod error;
pub mod executor;

pub use batch::{Batch, Row};
pub use cancel::CancellationToken;
pub use cursor::Cursor;
pub use error::{ExecError, ExecResult, RowWarning};
pub use executor::Executor;
