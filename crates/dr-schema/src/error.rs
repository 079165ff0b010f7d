//! Error types for dr-schema.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("document client error while sampling '{collection}': {source}")]
    Sampling {
        collection: String,
        #[source]
        source: dr_doc::DocClientError,
    },

    #[error("schema '{schema_name}' version {version} not found in store")]
    SchemaMissing { schema_name: String, version: u64 },

    #[error(transparent)]
    Core(#[from] dr_core::CoreError),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
